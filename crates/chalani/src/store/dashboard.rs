use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::Serialize;

use super::{now_ts, parse_ts, Store, StoreError};
use crate::domain::RecordStatus;

/// Aggregate counters shown on the landing page. Persisted as a single
/// row so the last computed figures survive restarts.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub total_active_products: u32,
    pub total_active_branches: u32,
    pub total_active_offices: u32,
    pub total_active_employees: u32,
    pub total_receivers: u32,
    pub total_letters: u32,
    pub total_draft_letters: u32,
    pub total_sent_letters: u32,
    pub last_updated: DateTime<Utc>,
}

impl Store {
    /// Recompute every counter from the live tables, persist the snapshot,
    /// and return it.
    pub fn refresh_dashboard(&self) -> Result<DashboardSnapshot, StoreError> {
        self.with_conn(|conn| {
            let letters = super::letters::letter_stats(conn)?;
            let now = now_ts();
            let snapshot = DashboardSnapshot {
                total_active_products: super::products::count_products(conn, RecordStatus::Active)?,
                total_active_branches: super::branches::count_branches(conn, RecordStatus::Active)?,
                total_active_offices: super::offices::count_offices(conn, RecordStatus::Active)?,
                total_active_employees: super::employees::count_employees(
                    conn,
                    RecordStatus::Active,
                )?,
                total_receivers: super::receivers::count_receivers(conn)?,
                total_letters: letters.total_letters,
                total_draft_letters: letters.draft_letters,
                total_sent_letters: letters.sent_letters,
                last_updated: parse_ts(&now)?,
            };
            conn.execute(
                "INSERT INTO dashboard (id, total_active_products, total_active_branches,
                 total_active_offices, total_active_employees, total_receivers, total_letters,
                 total_draft_letters, total_sent_letters, last_updated)
                 VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(id) DO UPDATE SET
                    total_active_products = excluded.total_active_products,
                    total_active_branches = excluded.total_active_branches,
                    total_active_offices = excluded.total_active_offices,
                    total_active_employees = excluded.total_active_employees,
                    total_receivers = excluded.total_receivers,
                    total_letters = excluded.total_letters,
                    total_draft_letters = excluded.total_draft_letters,
                    total_sent_letters = excluded.total_sent_letters,
                    last_updated = excluded.last_updated",
                params![
                    snapshot.total_active_products,
                    snapshot.total_active_branches,
                    snapshot.total_active_offices,
                    snapshot.total_active_employees,
                    snapshot.total_receivers,
                    snapshot.total_letters,
                    snapshot.total_draft_letters,
                    snapshot.total_sent_letters,
                    now,
                ],
            )?;
            Ok(snapshot)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BranchPayload, LetterPayload, LetterStatus, OfficePayload, ProductPayload};

    #[test]
    fn snapshot_tracks_live_tables() {
        let store = Store::open_in_memory().unwrap();
        let empty = store.refresh_dashboard().unwrap();
        assert_eq!(empty.total_letters, 0);

        store
            .create_office(&OfficePayload {
                name: "Head".to_string(),
                address: String::new(),
                email: None,
                phone_number: String::new(),
            })
            .unwrap();
        store
            .create_branch(&BranchPayload {
                name: "Pokhara".to_string(),
                email: None,
                address: String::new(),
                phone_number: String::new(),
            })
            .unwrap();
        let product = store
            .create_product(&ProductPayload {
                name: "Meter".to_string(),
                company: "Wasion".to_string(),
                remarks: String::new(),
                unit_of_measurement: Default::default(),
                sku: None,
            })
            .unwrap();
        let letter = store.create_letter(&LetterPayload::default()).unwrap();
        store.set_letter_status(letter.id, LetterStatus::Sent).unwrap();

        let snapshot = store.refresh_dashboard().unwrap();
        assert_eq!(snapshot.total_active_offices, 1);
        assert_eq!(snapshot.total_active_branches, 1);
        assert_eq!(snapshot.total_active_products, 1);
        assert_eq!(snapshot.total_letters, 1);
        assert_eq!(snapshot.total_sent_letters, 1);

        // Binned products leave the active counter.
        store
            .set_product_status(product.id, crate::domain::RecordStatus::Bin)
            .unwrap();
        let snapshot = store.refresh_dashboard().unwrap();
        assert_eq!(snapshot.total_active_products, 0);
    }
}
