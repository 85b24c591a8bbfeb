use rusqlite::{params, Connection, Row};

use super::{now_ts, parse_letter_status, parse_ts, Store, StoreError};
use crate::domain::{
    IdCardType, Letter, LetterItem, LetterPayload, LetterStats, LetterStatus, ReceiverSnapshot,
};

fn letter_from_row(row: &Row<'_>) -> Result<Letter, StoreError> {
    let id_card_type: String = row.get("recv_id_card_type")?;
    Ok(Letter {
        id: row.get("id")?,
        letter_count: row.get("letter_count")?,
        chalani_no: row.get("chalani_no")?,
        voucher_no: row.get("voucher_no")?,
        date: row.get("date")?,
        subject: row.get("subject")?,
        office_name: row.get("office_name")?,
        sub_office_name: row.get("sub_office_name")?,
        receiver_office_name: row.get("receiver_office_name")?,
        receiver_address: row.get("receiver_address")?,
        request_chalani_number: row.get("request_chalani_number")?,
        request_letter_count: row.get("request_letter_count")?,
        request_date: row.get("request_date")?,
        gatepass_no: row.get("gatepass_no")?,
        receiver: ReceiverSnapshot {
            name: row.get("recv_name")?,
            post: row.get("recv_post")?,
            id_card_number: row.get("recv_id_card_number")?,
            id_card_type: IdCardType::parse(&id_card_type)
                .map_err(|_| StoreError::Corrupt(format!("bad id card type '{id_card_type}'")))?,
            office_name: row.get("recv_office_name")?,
            office_address: row.get("recv_office_address")?,
            phone_number: row.get("recv_phone_number")?,
            vehicle_number: row.get("recv_vehicle_number")?,
        },
        status: parse_letter_status(&row.get::<_, String>("status")?)?,
        items: Vec::new(),
        created_at: parse_ts(&row.get::<_, String>("created_at")?)?,
        updated_at: parse_ts(&row.get::<_, String>("updated_at")?)?,
    })
}

impl Store {
    /// Insert a letter and its line items in one transaction. The payload
    /// is expected to be validated and numeral-normalized already.
    pub fn create_letter(&self, payload: &LetterPayload) -> Result<Letter, StoreError> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let receiver = payload.receiver.clone().unwrap_or_default();
            let now = now_ts();
            tx.execute(
                "INSERT INTO letters (letter_count, chalani_no, voucher_no, date, subject,
                 office_name, sub_office_name, receiver_office_name, receiver_address,
                 request_chalani_number, request_letter_count, request_date, gatepass_no,
                 recv_name, recv_post, recv_id_card_number, recv_id_card_type,
                 recv_office_name, recv_office_address, recv_phone_number, recv_vehicle_number,
                 status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                         ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?23)",
                params![
                    payload.letter_count,
                    payload.chalani_no,
                    payload.voucher_no,
                    payload.date,
                    payload.subject,
                    payload.office_name,
                    payload.sub_office_name,
                    payload.receiver_office_name,
                    payload.receiver_address,
                    payload.request_chalani_number,
                    payload.request_letter_count,
                    payload.request_date,
                    payload.gatepass_no,
                    receiver.name,
                    receiver.post,
                    receiver.id_card_number,
                    receiver.id_card_type.as_str(),
                    receiver.office_name,
                    receiver.office_address,
                    receiver.phone_number,
                    receiver.vehicle_number,
                    payload.status.unwrap_or_default().as_str(),
                    now,
                ],
            )?;
            let id = tx.last_insert_rowid();
            replace_items(&tx, id, payload)?;
            let letter = get_letter(&tx, id)?;
            tx.commit()?;
            Ok(letter)
        })
    }

    pub fn get_letter(&self, id: i64) -> Result<Letter, StoreError> {
        self.with_conn(|conn| get_letter(conn, id))
    }

    /// Letters with items, newest first. `None` returns every status,
    /// including the bin.
    pub fn list_letters(&self, status: Option<LetterStatus>) -> Result<Vec<Letter>, StoreError> {
        self.with_conn(|conn| {
            let mut letters = Vec::new();
            match status {
                Some(status) => {
                    let mut stmt = conn.prepare(
                        "SELECT * FROM letters WHERE status = ?1 ORDER BY created_at DESC, id DESC",
                    )?;
                    let rows =
                        stmt.query_map(params![status.as_str()], |row| Ok(letter_from_row(row)))?;
                    for row in rows {
                        letters.push(row??);
                    }
                }
                None => {
                    let mut stmt =
                        conn.prepare("SELECT * FROM letters ORDER BY created_at DESC, id DESC")?;
                    let rows = stmt.query_map([], |row| Ok(letter_from_row(row)))?;
                    for row in rows {
                        letters.push(row??);
                    }
                }
            }
            for letter in &mut letters {
                letter.items = load_items(conn, letter.id)?;
            }
            Ok(letters)
        })
    }

    /// Replace a letter's fields and line items wholesale. The stored
    /// status is kept unless the payload names a new one.
    pub fn update_letter(&self, id: i64, payload: &LetterPayload) -> Result<Letter, StoreError> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let receiver = payload.receiver.clone().unwrap_or_default();
            let current = get_letter(&tx, id)?;
            let status = payload.status.unwrap_or(current.status);
            tx.execute(
                "UPDATE letters SET letter_count = ?1, chalani_no = ?2, voucher_no = ?3,
                 date = ?4, subject = ?5, office_name = ?6, sub_office_name = ?7,
                 receiver_office_name = ?8, receiver_address = ?9, request_chalani_number = ?10,
                 request_letter_count = ?11, request_date = ?12, gatepass_no = ?13,
                 recv_name = ?14, recv_post = ?15, recv_id_card_number = ?16,
                 recv_id_card_type = ?17, recv_office_name = ?18, recv_office_address = ?19,
                 recv_phone_number = ?20, recv_vehicle_number = ?21, status = ?22,
                 updated_at = ?23 WHERE id = ?24",
                params![
                    payload.letter_count,
                    payload.chalani_no,
                    payload.voucher_no,
                    payload.date,
                    payload.subject,
                    payload.office_name,
                    payload.sub_office_name,
                    payload.receiver_office_name,
                    payload.receiver_address,
                    payload.request_chalani_number,
                    payload.request_letter_count,
                    payload.request_date,
                    payload.gatepass_no,
                    receiver.name,
                    receiver.post,
                    receiver.id_card_number,
                    receiver.id_card_type.as_str(),
                    receiver.office_name,
                    receiver.office_address,
                    receiver.phone_number,
                    receiver.vehicle_number,
                    status.as_str(),
                    now_ts(),
                    id,
                ],
            )?;
            tx.execute("DELETE FROM letter_items WHERE letter_id = ?1", params![id])?;
            replace_items(&tx, id, payload)?;
            let letter = get_letter(&tx, id)?;
            tx.commit()?;
            Ok(letter)
        })
    }

    /// Lifecycle moves: send, back to draft, bin, restore.
    pub fn set_letter_status(&self, id: i64, status: LetterStatus) -> Result<Letter, StoreError> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE letters SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status.as_str(), now_ts(), id],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound);
            }
            get_letter(conn, id)
        })
    }

    pub fn letter_stats(&self) -> Result<LetterStats, StoreError> {
        self.with_conn(letter_stats)
    }
}

fn replace_items(conn: &Connection, letter_id: i64, payload: &LetterPayload) -> Result<(), StoreError> {
    let mut stmt = conn.prepare(
        "INSERT INTO letter_items (letter_id, name, company, serial_number, unit_of_measurement, quantity, remarks)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    for item in &payload.items {
        stmt.execute(params![
            letter_id,
            item.name.trim(),
            item.company,
            item.serial_number.trim(),
            item.unit_of_measurement,
            item.quantity,
            item.remarks,
        ])?;
    }
    Ok(())
}

fn load_items(conn: &Connection, letter_id: i64) -> Result<Vec<LetterItem>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, company, serial_number, unit_of_measurement, quantity, remarks
         FROM letter_items WHERE letter_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![letter_id], |row| {
        Ok(LetterItem {
            id: row.get(0)?,
            name: row.get(1)?,
            company: row.get(2)?,
            serial_number: row.get(3)?,
            unit_of_measurement: row.get(4)?,
            quantity: row.get(5)?,
            remarks: row.get(6)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn get_letter(conn: &Connection, id: i64) -> Result<Letter, StoreError> {
    let mut stmt = conn.prepare("SELECT * FROM letters WHERE id = ?1")?;
    let mut rows = stmt.query_map(params![id], |row| Ok(letter_from_row(row)))?;
    let mut letter = match rows.next() {
        Some(row) => row??,
        None => return Err(StoreError::NotFound),
    };
    letter.items = load_items(conn, id)?;
    Ok(letter)
}

pub(crate) fn letter_stats(conn: &Connection) -> Result<LetterStats, StoreError> {
    let mut stats = LetterStats::default();
    let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM letters GROUP BY status")?;
    let rows = stmt.query_map([], |row| {
        let status: String = row.get(0)?;
        let count: u32 = row.get(1)?;
        Ok((status, count))
    })?;
    for row in rows {
        let (status, count) = row?;
        match parse_letter_status(&status)? {
            LetterStatus::Draft => stats.draft_letters = count,
            LetterStatus::Sent => stats.sent_letters = count,
            LetterStatus::Bin => stats.bin_letters = count,
        }
        stats.total_letters += count;
    }
    Ok(stats)
}
