use rusqlite::{params, Connection, Row};

use super::{now_ts, parse_ts, Store, StoreError};
use crate::domain::{IdCardType, Receiver, ReceiverPayload};
use crate::numerals::to_ascii_digits;

fn receiver_from_row(row: &Row<'_>) -> Result<Receiver, StoreError> {
    let id_card_type: String = row.get("id_card_type")?;
    Ok(Receiver {
        id: row.get("id")?,
        name: row.get("name")?,
        post: row.get("post")?,
        id_card_number: row.get("id_card_number")?,
        id_card_type: IdCardType::parse(&id_card_type)
            .map_err(|_| StoreError::Corrupt(format!("bad id card type '{id_card_type}'")))?,
        office_name: row.get("office_name")?,
        office_address: row.get("office_address")?,
        phone_number: row.get("phone_number")?,
        vehicle_number: row.get("vehicle_number")?,
        created_at: parse_ts(&row.get::<_, String>("created_at")?)?,
        updated_at: parse_ts(&row.get::<_, String>("updated_at")?)?,
    })
}

impl Store {
    pub fn create_receiver(&self, payload: &ReceiverPayload) -> Result<Receiver, StoreError> {
        self.with_conn(|conn| {
            let now = now_ts();
            conn.execute(
                "INSERT INTO receivers (name, post, id_card_number, id_card_type, office_name,
                 office_address, phone_number, vehicle_number, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
                params![
                    payload.name.trim(),
                    payload.post,
                    to_ascii_digits(&payload.id_card_number),
                    payload.id_card_type.as_str(),
                    payload.office_name,
                    payload.office_address,
                    to_ascii_digits(&payload.phone_number),
                    payload.vehicle_number,
                    now,
                ],
            )?;
            get_receiver(conn, conn.last_insert_rowid())
        })
    }

    pub fn get_receiver(&self, id: i64) -> Result<Receiver, StoreError> {
        self.with_conn(|conn| get_receiver(conn, id))
    }

    pub fn list_receivers(&self) -> Result<Vec<Receiver>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT * FROM receivers ORDER BY created_at DESC, id DESC")?;
            let rows = stmt.query_map([], |row| Ok(receiver_from_row(row)))?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row??);
            }
            Ok(out)
        })
    }

    pub fn update_receiver(
        &self,
        id: i64,
        payload: &ReceiverPayload,
    ) -> Result<Receiver, StoreError> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE receivers SET name = ?1, post = ?2, id_card_number = ?3,
                 id_card_type = ?4, office_name = ?5, office_address = ?6, phone_number = ?7,
                 vehicle_number = ?8, updated_at = ?9 WHERE id = ?10",
                params![
                    payload.name.trim(),
                    payload.post,
                    to_ascii_digits(&payload.id_card_number),
                    payload.id_card_type.as_str(),
                    payload.office_name,
                    payload.office_address,
                    to_ascii_digits(&payload.phone_number),
                    payload.vehicle_number,
                    now_ts(),
                    id,
                ],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound);
            }
            get_receiver(conn, id)
        })
    }

    /// Receivers are deleted outright; there is no bin for directory rows.
    pub fn delete_receiver(&self, id: i64) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM receivers WHERE id = ?1", params![id])?;
            if changed == 0 {
                return Err(StoreError::NotFound);
            }
            Ok(())
        })
    }

    pub fn count_receivers(&self) -> Result<u32, StoreError> {
        self.with_conn(count_receivers)
    }
}

fn get_receiver(conn: &Connection, id: i64) -> Result<Receiver, StoreError> {
    let mut stmt = conn.prepare("SELECT * FROM receivers WHERE id = ?1")?;
    let mut rows = stmt.query_map(params![id], |row| Ok(receiver_from_row(row)))?;
    match rows.next() {
        Some(row) => row?,
        None => Err(StoreError::NotFound),
    }
}

pub(crate) fn count_receivers(conn: &Connection) -> Result<u32, StoreError> {
    let count = conn.query_row("SELECT COUNT(*) FROM receivers", [], |row| row.get(0))?;
    Ok(count)
}
