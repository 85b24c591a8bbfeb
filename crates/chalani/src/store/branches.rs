use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{now_ts, parse_record_status, parse_ts, Store, StoreError};
use crate::domain::{Branch, BranchPayload, RecordStatus, MAX_ORGANIZATION_ID};

fn branch_from_row(row: &Row<'_>) -> Result<Branch, StoreError> {
    Ok(Branch {
        id: row.get("id")?,
        organization_id: row.get::<_, i64>("organization_id")? as u16,
        name: row.get("name")?,
        email: row.get("email")?,
        address: row.get("address")?,
        phone_number: row.get("phone_number")?,
        status: parse_record_status(&row.get::<_, String>("status")?)?,
        created_at: parse_ts(&row.get::<_, String>("created_at")?)?,
        updated_at: parse_ts(&row.get::<_, String>("updated_at")?)?,
    })
}

impl Store {
    /// Insert a branch, allocating the next organization id. Ids are
    /// monotonic (max + 1) and never reused, capped at 9999.
    pub fn create_branch(&self, payload: &BranchPayload) -> Result<Branch, StoreError> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let last: i64 = tx.query_row(
                "SELECT COALESCE(MAX(organization_id), 0) FROM branches",
                [],
                |row| row.get(0),
            )?;
            if last >= i64::from(MAX_ORGANIZATION_ID) {
                return Err(StoreError::Conflict(format!(
                    "maximum organization id limit ({MAX_ORGANIZATION_ID}) reached"
                )));
            }

            if let Some(email) = normalized_email(payload) {
                ensure_email_free(&tx, &email, None)?;
            }

            let now = now_ts();
            tx.execute(
                "INSERT INTO branches (organization_id, name, email, address, phone_number, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                params![
                    last + 1,
                    payload.name.trim(),
                    normalized_email(payload),
                    payload.address,
                    payload.phone_number,
                    RecordStatus::Active.as_str(),
                    now,
                ],
            )?;
            let id = tx.last_insert_rowid();
            let branch = get_branch(&tx, id)?;
            tx.commit()?;
            Ok(branch)
        })
    }

    pub fn get_branch(&self, id: i64) -> Result<Branch, StoreError> {
        self.with_conn(|conn| get_branch(conn, id))
    }

    pub fn get_branch_by_organization_id(&self, organization_id: u16) -> Result<Branch, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM branches WHERE organization_id = ?1")?;
            let mut rows =
                stmt.query_map(params![i64::from(organization_id)], |row| Ok(branch_from_row(row)))?;
            match rows.next() {
                Some(row) => row?,
                None => Err(StoreError::NotFound),
            }
        })
    }

    pub fn list_branches(&self, status: Option<RecordStatus>) -> Result<Vec<Branch>, StoreError> {
        self.with_conn(|conn| {
            let mut out = Vec::new();
            match status {
                Some(status) => {
                    let mut stmt = conn.prepare(
                        "SELECT * FROM branches WHERE status = ?1 ORDER BY created_at DESC, id DESC",
                    )?;
                    let rows =
                        stmt.query_map(params![status.as_str()], |row| Ok(branch_from_row(row)))?;
                    for row in rows {
                        out.push(row??);
                    }
                }
                None => {
                    let mut stmt =
                        conn.prepare("SELECT * FROM branches ORDER BY created_at DESC, id DESC")?;
                    let rows = stmt.query_map([], |row| Ok(branch_from_row(row)))?;
                    for row in rows {
                        out.push(row??);
                    }
                }
            }
            Ok(out)
        })
    }

    /// Update mutable fields. The organization id is immutable.
    pub fn update_branch(&self, id: i64, payload: &BranchPayload) -> Result<Branch, StoreError> {
        self.with_conn(|conn| {
            if let Some(email) = normalized_email(payload) {
                ensure_email_free(conn, &email, Some(id))?;
            }
            let changed = conn.execute(
                "UPDATE branches SET name = ?1, email = ?2, address = ?3, phone_number = ?4,
                 updated_at = ?5 WHERE id = ?6",
                params![
                    payload.name.trim(),
                    normalized_email(payload),
                    payload.address,
                    payload.phone_number,
                    now_ts(),
                    id,
                ],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound);
            }
            get_branch(conn, id)
        })
    }

    pub fn set_branch_status(&self, id: i64, status: RecordStatus) -> Result<Branch, StoreError> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE branches SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status.as_str(), now_ts(), id],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound);
            }
            get_branch(conn, id)
        })
    }

    pub fn count_branches(&self, status: RecordStatus) -> Result<u32, StoreError> {
        self.with_conn(|conn| count_branches(conn, status))
    }
}

fn normalized_email(payload: &BranchPayload) -> Option<String> {
    payload
        .email
        .as_deref()
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .map(str::to_string)
}

fn ensure_email_free(
    conn: &Connection,
    email: &str,
    exclude_id: Option<i64>,
) -> Result<(), StoreError> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM branches WHERE email = ?1",
            params![email],
            |row| row.get(0),
        )
        .optional()?;
    match existing {
        Some(id) if Some(id) != exclude_id => Err(StoreError::Conflict(format!(
            "a branch with email '{email}' already exists"
        ))),
        _ => Ok(()),
    }
}

pub(crate) fn get_branch(conn: &Connection, id: i64) -> Result<Branch, StoreError> {
    let mut stmt = conn.prepare("SELECT * FROM branches WHERE id = ?1")?;
    let mut rows = stmt.query_map(params![id], |row| Ok(branch_from_row(row)))?;
    match rows.next() {
        Some(row) => row?,
        None => Err(StoreError::NotFound),
    }
}

pub(crate) fn count_branches(conn: &Connection, status: RecordStatus) -> Result<u32, StoreError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM branches WHERE status = ?1",
        params![status.as_str()],
        |row| row.get(0),
    )?;
    Ok(count)
}
