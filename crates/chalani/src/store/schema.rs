//! Idempotent schema creation, run on every open.

use rusqlite::Connection;

use super::StoreError;

pub(crate) fn migrate(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id            TEXT PRIMARY KEY,
            email         TEXT NOT NULL UNIQUE,
            name          TEXT NOT NULL,
            role          TEXT NOT NULL DEFAULT 'viewer',
            password_hash TEXT NOT NULL,
            is_active     INTEGER NOT NULL DEFAULT 1,
            created_at    TEXT NOT NULL,
            updated_at    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS offices (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            name         TEXT NOT NULL,
            address      TEXT NOT NULL DEFAULT '',
            email        TEXT,
            phone_number TEXT NOT NULL DEFAULT '',
            status       TEXT NOT NULL DEFAULT 'active',
            created_at   TEXT NOT NULL,
            updated_at   TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS branches (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            organization_id INTEGER NOT NULL UNIQUE,
            name            TEXT NOT NULL,
            email           TEXT UNIQUE,
            address         TEXT NOT NULL DEFAULT '',
            phone_number    TEXT NOT NULL DEFAULT '',
            status          TEXT NOT NULL DEFAULT 'active',
            created_at      TEXT NOT NULL,
            updated_at      TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS employees (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            branch_id   INTEGER NOT NULL REFERENCES branches(id) ON DELETE CASCADE,
            first_name  TEXT NOT NULL,
            middle_name TEXT,
            last_name   TEXT NOT NULL,
            email       TEXT NOT NULL UNIQUE,
            role        TEXT NOT NULL DEFAULT '1',
            status      TEXT NOT NULL DEFAULT 'active',
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_employees_branch ON employees(branch_id);

        CREATE TABLE IF NOT EXISTS receivers (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            name           TEXT NOT NULL,
            post           TEXT NOT NULL DEFAULT 'UNKNOWN',
            id_card_number TEXT NOT NULL DEFAULT 'UNKNOWN',
            id_card_type   TEXT NOT NULL DEFAULT 'unknown',
            office_name    TEXT NOT NULL DEFAULT 'UNKNOWN',
            office_address TEXT NOT NULL DEFAULT 'UNKNOWN',
            phone_number   TEXT NOT NULL DEFAULT 'UNKNOWN',
            vehicle_number TEXT NOT NULL DEFAULT 'UNKNOWN',
            created_at     TEXT NOT NULL,
            updated_at     TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS products (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            name                TEXT NOT NULL,
            company             TEXT NOT NULL DEFAULT '',
            remarks             TEXT NOT NULL DEFAULT '',
            unit_of_measurement TEXT NOT NULL DEFAULT 'nos',
            sku                 TEXT NOT NULL UNIQUE,
            status              TEXT NOT NULL DEFAULT 'active',
            created_at          TEXT NOT NULL,
            updated_at          TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_products_name_company ON products(name, company);

        CREATE TABLE IF NOT EXISTS letters (
            id                     INTEGER PRIMARY KEY AUTOINCREMENT,
            letter_count           TEXT NOT NULL DEFAULT '',
            chalani_no             TEXT,
            voucher_no             TEXT,
            date                   TEXT NOT NULL DEFAULT '',
            subject                TEXT NOT NULL DEFAULT '',
            office_name            TEXT NOT NULL DEFAULT '',
            sub_office_name        TEXT NOT NULL DEFAULT '',
            receiver_office_name   TEXT NOT NULL DEFAULT '',
            receiver_address       TEXT NOT NULL DEFAULT '',
            request_chalani_number TEXT NOT NULL DEFAULT '',
            request_letter_count   TEXT NOT NULL DEFAULT '',
            request_date           TEXT NOT NULL DEFAULT '',
            gatepass_no            TEXT,
            recv_name              TEXT NOT NULL DEFAULT '',
            recv_post              TEXT NOT NULL DEFAULT '',
            recv_id_card_number    TEXT NOT NULL DEFAULT '',
            recv_id_card_type      TEXT NOT NULL DEFAULT 'unknown',
            recv_office_name       TEXT NOT NULL DEFAULT '',
            recv_office_address    TEXT NOT NULL DEFAULT '',
            recv_phone_number      TEXT NOT NULL DEFAULT '',
            recv_vehicle_number    TEXT NOT NULL DEFAULT '',
            status                 TEXT NOT NULL DEFAULT 'draft',
            created_at             TEXT NOT NULL,
            updated_at             TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_letters_status ON letters(status);

        CREATE TABLE IF NOT EXISTS letter_items (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            letter_id           INTEGER NOT NULL REFERENCES letters(id) ON DELETE CASCADE,
            name                TEXT NOT NULL,
            company             TEXT NOT NULL DEFAULT '',
            serial_number       TEXT NOT NULL,
            unit_of_measurement TEXT NOT NULL DEFAULT '',
            quantity            TEXT NOT NULL DEFAULT '',
            remarks             TEXT NOT NULL DEFAULT '',
            UNIQUE(letter_id, serial_number)
        );
        CREATE INDEX IF NOT EXISTS idx_letter_items_letter ON letter_items(letter_id);

        CREATE TABLE IF NOT EXISTS dashboard (
            id                     INTEGER PRIMARY KEY CHECK (id = 1),
            total_active_products  INTEGER NOT NULL DEFAULT 0,
            total_active_branches  INTEGER NOT NULL DEFAULT 0,
            total_active_offices   INTEGER NOT NULL DEFAULT 0,
            total_active_employees INTEGER NOT NULL DEFAULT 0,
            total_receivers        INTEGER NOT NULL DEFAULT 0,
            total_letters          INTEGER NOT NULL DEFAULT 0,
            total_draft_letters    INTEGER NOT NULL DEFAULT 0,
            total_sent_letters     INTEGER NOT NULL DEFAULT 0,
            last_updated           TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS revoked_tokens (
            jti        TEXT PRIMARY KEY,
            expires_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS email_verifications (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            email       TEXT NOT NULL,
            token       TEXT NOT NULL UNIQUE,
            expires_at  TEXT NOT NULL,
            verified_at TEXT,
            created_at  TEXT NOT NULL
        );
        ",
    )?;
    Ok(())
}
