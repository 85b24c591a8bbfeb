use rusqlite::{params, Connection, Row};

use super::{now_ts, parse_record_status, parse_ts, Store, StoreError};
use crate::domain::{Office, OfficePayload, RecordStatus};

fn office_from_row(row: &Row<'_>) -> Result<Office, StoreError> {
    Ok(Office {
        id: row.get("id")?,
        name: row.get("name")?,
        address: row.get("address")?,
        email: row.get("email")?,
        phone_number: row.get("phone_number")?,
        status: parse_record_status(&row.get::<_, String>("status")?)?,
        created_at: parse_ts(&row.get::<_, String>("created_at")?)?,
        updated_at: parse_ts(&row.get::<_, String>("updated_at")?)?,
    })
}

impl Store {
    pub fn create_office(&self, payload: &OfficePayload) -> Result<Office, StoreError> {
        self.with_conn(|conn| {
            let now = now_ts();
            conn.execute(
                "INSERT INTO offices (name, address, email, phone_number, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                params![
                    payload.name.trim(),
                    payload.address,
                    payload.email,
                    payload.phone_number,
                    RecordStatus::Active.as_str(),
                    now,
                ],
            )?;
            get_office(conn, conn.last_insert_rowid())
        })
    }

    pub fn get_office(&self, id: i64) -> Result<Office, StoreError> {
        self.with_conn(|conn| get_office(conn, id))
    }

    /// Newest first; `status` of `None` means every row.
    pub fn list_offices(&self, status: Option<RecordStatus>) -> Result<Vec<Office>, StoreError> {
        self.with_conn(|conn| {
            let mut out = Vec::new();
            match status {
                Some(status) => {
                    let mut stmt = conn.prepare(
                        "SELECT * FROM offices WHERE status = ?1 ORDER BY created_at DESC, id DESC",
                    )?;
                    let rows = stmt.query_map(params![status.as_str()], |row| {
                        Ok(office_from_row(row))
                    })?;
                    for row in rows {
                        out.push(row??);
                    }
                }
                None => {
                    let mut stmt =
                        conn.prepare("SELECT * FROM offices ORDER BY created_at DESC, id DESC")?;
                    let rows = stmt.query_map([], |row| Ok(office_from_row(row)))?;
                    for row in rows {
                        out.push(row??);
                    }
                }
            }
            Ok(out)
        })
    }

    pub fn update_office(&self, id: i64, payload: &OfficePayload) -> Result<Office, StoreError> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE offices SET name = ?1, address = ?2, email = ?3, phone_number = ?4,
                 updated_at = ?5 WHERE id = ?6",
                params![
                    payload.name.trim(),
                    payload.address,
                    payload.email,
                    payload.phone_number,
                    now_ts(),
                    id,
                ],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound);
            }
            get_office(conn, id)
        })
    }

    /// Soft delete / restore.
    pub fn set_office_status(&self, id: i64, status: RecordStatus) -> Result<Office, StoreError> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE offices SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status.as_str(), now_ts(), id],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound);
            }
            get_office(conn, id)
        })
    }

    pub fn count_offices(&self, status: RecordStatus) -> Result<u32, StoreError> {
        self.with_conn(|conn| count_offices(conn, status))
    }
}

fn get_office(conn: &Connection, id: i64) -> Result<Office, StoreError> {
    let mut stmt = conn.prepare("SELECT * FROM offices WHERE id = ?1")?;
    let mut rows = stmt.query_map(params![id], |row| Ok(office_from_row(row)))?;
    match rows.next() {
        Some(row) => row?,
        None => Err(StoreError::NotFound),
    }
}

pub(crate) fn count_offices(conn: &Connection, status: RecordStatus) -> Result<u32, StoreError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM offices WHERE status = ?1",
        params![status.as_str()],
        |row| row.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(name: &str) -> OfficePayload {
        OfficePayload {
            name: name.to_string(),
            address: "Durbar Marg, Kathmandu".to_string(),
            email: Some(format!("{}@nea.org.np", name.to_ascii_lowercase())),
            phone_number: "01-4153051".to_string(),
        }
    }

    #[test]
    fn office_crud_and_soft_delete() {
        let store = Store::open_in_memory().unwrap();
        let office = store.create_office(&payload("Head")).unwrap();
        assert_eq!(office.status, RecordStatus::Active);

        let fetched = store.get_office(office.id).unwrap();
        assert_eq!(fetched.name, "Head");

        store.set_office_status(office.id, RecordStatus::Bin).unwrap();
        assert!(store.list_offices(Some(RecordStatus::Active)).unwrap().is_empty());
        assert_eq!(store.list_offices(Some(RecordStatus::Bin)).unwrap().len(), 1);

        let restored = store.set_office_status(office.id, RecordStatus::Active).unwrap();
        assert_eq!(restored.status, RecordStatus::Active);
        assert_eq!(store.count_offices(RecordStatus::Active).unwrap(), 1);
    }

    #[test]
    fn missing_office_is_not_found() {
        let store = Store::open_in_memory().unwrap();
        assert!(matches!(store.get_office(42), Err(StoreError::NotFound)));
        assert!(matches!(
            store.update_office(42, &payload("Ghost")),
            Err(StoreError::NotFound)
        ));
    }
}
