use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use super::{now_ts, parse_record_status, parse_ts, Store, StoreError};
use crate::domain::product::generate_sku;
use crate::domain::{Product, ProductPayload, RecordStatus, UnitOfMeasurement};

/// One row of the products-per-company breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct CompanyStatEntry {
    pub company: String,
    pub count: u32,
}

/// Outcome of a CSV import. Rows are processed independently so one bad
/// row never aborts the batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub total_rows: u32,
    pub successful: u32,
    pub failed: u32,
    pub duplicates_skipped: u32,
    pub errors: Vec<String>,
}

fn product_from_row(row: &Row<'_>) -> Result<Product, StoreError> {
    let unit: String = row.get("unit_of_measurement")?;
    Ok(Product {
        id: row.get("id")?,
        name: row.get("name")?,
        company: row.get("company")?,
        remarks: row.get("remarks")?,
        unit_of_measurement: UnitOfMeasurement::parse(&unit)
            .map_err(|_| StoreError::Corrupt(format!("bad unit of measurement '{unit}'")))?,
        sku: row.get("sku")?,
        status: parse_record_status(&row.get::<_, String>("status")?)?,
        created_at: parse_ts(&row.get::<_, String>("created_at")?)?,
        updated_at: parse_ts(&row.get::<_, String>("updated_at")?)?,
    })
}

impl Store {
    pub fn create_product(&self, payload: &ProductPayload) -> Result<Product, StoreError> {
        self.with_conn(|conn| create_product(conn, payload))
    }

    pub fn get_product(&self, id: i64) -> Result<Product, StoreError> {
        self.with_conn(|conn| get_product(conn, id))
    }

    pub fn list_products(&self, status: Option<RecordStatus>) -> Result<Vec<Product>, StoreError> {
        self.with_conn(|conn| {
            let mut out = Vec::new();
            match status {
                Some(status) => {
                    let mut stmt = conn.prepare(
                        "SELECT * FROM products WHERE status = ?1 ORDER BY created_at DESC, id DESC",
                    )?;
                    let rows =
                        stmt.query_map(params![status.as_str()], |row| Ok(product_from_row(row)))?;
                    for row in rows {
                        out.push(row??);
                    }
                }
                None => {
                    let mut stmt =
                        conn.prepare("SELECT * FROM products ORDER BY created_at DESC, id DESC")?;
                    let rows = stmt.query_map([], |row| Ok(product_from_row(row)))?;
                    for row in rows {
                        out.push(row??);
                    }
                }
            }
            Ok(out)
        })
    }

    pub fn update_product(&self, id: i64, payload: &ProductPayload) -> Result<Product, StoreError> {
        self.with_conn(|conn| {
            ensure_no_active_duplicate(conn, &payload.name, &payload.company, Some(id))?;
            let changed = conn.execute(
                "UPDATE products SET name = ?1, company = ?2, remarks = ?3,
                 unit_of_measurement = ?4, updated_at = ?5 WHERE id = ?6",
                params![
                    payload.name.trim(),
                    payload.company.trim(),
                    payload.remarks,
                    payload.unit_of_measurement.as_str(),
                    now_ts(),
                    id,
                ],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound);
            }
            get_product(conn, id)
        })
    }

    /// Soft delete / restore. Restoring re-runs the duplicate guard so a
    /// binned product cannot resurface next to a newer copy of itself.
    pub fn set_product_status(&self, id: i64, status: RecordStatus) -> Result<Product, StoreError> {
        self.with_conn(|conn| {
            if status == RecordStatus::Active {
                let current = get_product(conn, id)?;
                ensure_no_active_duplicate(conn, &current.name, &current.company, Some(id))?;
            }
            let changed = conn.execute(
                "UPDATE products SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status.as_str(), now_ts(), id],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound);
            }
            get_product(conn, id)
        })
    }

    /// Move a batch of products to the bin in one transaction. Unknown ids
    /// are reported back rather than failing the batch.
    pub fn bulk_bin_products(&self, ids: &[i64]) -> Result<(u32, Vec<i64>), StoreError> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let mut moved = 0;
            let mut missing = Vec::new();
            let now = now_ts();
            for &id in ids {
                let changed = tx.execute(
                    "UPDATE products SET status = ?1, updated_at = ?2 WHERE id = ?3",
                    params![RecordStatus::Bin.as_str(), now, id],
                )?;
                if changed == 0 {
                    missing.push(id);
                } else {
                    moved += 1;
                }
            }
            tx.commit()?;
            Ok((moved, missing))
        })
    }

    pub fn count_products(&self, status: RecordStatus) -> Result<u32, StoreError> {
        self.with_conn(|conn| count_products(conn, status))
    }

    /// Active product count per company, largest first.
    pub fn product_company_stats(&self) -> Result<Vec<CompanyStatEntry>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT company, COUNT(*) AS n FROM products WHERE status = ?1
                 GROUP BY company ORDER BY n DESC, company",
            )?;
            let rows = stmt.query_map(params![RecordStatus::Active.as_str()], |row| {
                Ok(CompanyStatEntry {
                    company: row.get(0)?,
                    count: row.get(1)?,
                })
            })?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
    }

    /// Import products from CSV text. `name` and `company` columns are
    /// required; `remarks`, `unit_of_measurement`, `status`, and `sku` are
    /// optional. Active (name, company) duplicates are skipped, a taken SKU
    /// fails the row, and the rest are inserted.
    pub fn import_products_csv(&self, csv_text: &str) -> Result<ImportReport, StoreError> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let mut reader = csv::ReaderBuilder::new()
                .trim(csv::Trim::All)
                .flexible(true)
                .from_reader(csv_text.as_bytes());

            let headers = reader
                .headers()
                .map_err(|err| StoreError::Conflict(format!("unreadable CSV header: {err}")))?
                .clone();
            let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
            let name_col = column("name")
                .ok_or_else(|| StoreError::Conflict("CSV is missing a 'name' column".to_string()))?;
            let company_col = column("company").ok_or_else(|| {
                StoreError::Conflict("CSV is missing a 'company' column".to_string())
            })?;
            let remarks_col = column("remarks");
            let unit_col = column("unit_of_measurement");
            let status_col = column("status");
            let sku_col = column("sku");

            let mut report = ImportReport::default();
            for (index, record) in reader.records().enumerate() {
                report.total_rows += 1;
                let line = index + 2;
                let record = match record {
                    Ok(record) => record,
                    Err(err) => {
                        report.failed += 1;
                        report.errors.push(format!("row {line}: {err}"));
                        continue;
                    }
                };

                let field = |col: Option<usize>| {
                    col.and_then(|c| record.get(c)).unwrap_or_default().to_string()
                };
                let name = field(Some(name_col));
                let company = field(Some(company_col));
                if name.trim().is_empty() {
                    report.failed += 1;
                    report.errors.push(format!("row {line}: name is required"));
                    continue;
                }
                if company.trim().is_empty() {
                    report.failed += 1;
                    report.errors.push(format!("row {line}: company is required"));
                    continue;
                }
                match ensure_no_active_duplicate(&tx, &name, &company, None) {
                    Ok(()) => {}
                    Err(StoreError::Conflict(_)) => {
                        report.duplicates_skipped += 1;
                        continue;
                    }
                    Err(err) => return Err(err),
                }

                let sku = field(sku_col);
                let sku = sku.trim();
                if !sku.is_empty() && sku_taken(&tx, sku)? {
                    report.failed += 1;
                    report.errors.push(format!("row {line}: SKU '{sku}' already exists"));
                    continue;
                }

                let payload = ProductPayload {
                    name,
                    company,
                    remarks: field(remarks_col),
                    unit_of_measurement: UnitOfMeasurement::parse_loose(&field(unit_col)),
                    sku: (!sku.is_empty()).then(|| sku.to_string()),
                };
                match create_product(&tx, &payload) {
                    Ok(product) => {
                        let status = import_status(&field(status_col));
                        if status == RecordStatus::Bin {
                            tx.execute(
                                "UPDATE products SET status = ?1 WHERE id = ?2",
                                params![status.as_str(), product.id],
                            )?;
                        }
                        report.successful += 1;
                    }
                    Err(err) => {
                        report.failed += 1;
                        report.errors.push(format!("row {line}: {err}"));
                    }
                }
            }
            tx.commit()?;
            Ok(report)
        })
    }
}

/// Import-time status synonyms; anything unrecognized stays active.
fn import_status(value: &str) -> RecordStatus {
    match value.trim().to_ascii_lowercase().as_str() {
        "bin" | "deleted" | "inactive" => RecordStatus::Bin,
        _ => RecordStatus::Active,
    }
}

fn create_product(conn: &Connection, payload: &ProductPayload) -> Result<Product, StoreError> {
    ensure_no_active_duplicate(conn, &payload.name, &payload.company, None)?;
    let sku = match payload.sku.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(sku) => {
            if sku_taken(conn, sku)? {
                return Err(StoreError::Conflict(format!("SKU '{sku}' is already in use")));
            }
            sku.to_string()
        }
        None => loop {
            let candidate = generate_sku();
            if !sku_taken(conn, &candidate)? {
                break candidate;
            }
        },
    };

    let now = now_ts();
    conn.execute(
        "INSERT INTO products (name, company, remarks, unit_of_measurement, sku, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        params![
            payload.name.trim(),
            payload.company.trim(),
            payload.remarks,
            payload.unit_of_measurement.as_str(),
            sku,
            RecordStatus::Active.as_str(),
            now,
        ],
    )?;
    get_product(conn, conn.last_insert_rowid())
}

fn sku_taken(conn: &Connection, sku: &str) -> Result<bool, StoreError> {
    let existing: Option<i64> = conn
        .query_row("SELECT id FROM products WHERE sku = ?1", params![sku], |row| row.get(0))
        .optional()?;
    Ok(existing.is_some())
}

/// The (name, company) pair is unique among active products, compared
/// case-insensitively. Binned rows do not block reuse.
fn ensure_no_active_duplicate(
    conn: &Connection,
    name: &str,
    company: &str,
    exclude_id: Option<i64>,
) -> Result<(), StoreError> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM products WHERE status = ?1
             AND lower(name) = lower(?2) AND lower(company) = lower(?3)",
            params![RecordStatus::Active.as_str(), name.trim(), company.trim()],
            |row| row.get(0),
        )
        .optional()?;
    match existing {
        Some(id) if Some(id) != exclude_id => Err(StoreError::Conflict(format!(
            "an active product named '{}' by '{}' already exists",
            name.trim(),
            company.trim()
        ))),
        _ => Ok(()),
    }
}

fn get_product(conn: &Connection, id: i64) -> Result<Product, StoreError> {
    let mut stmt = conn.prepare("SELECT * FROM products WHERE id = ?1")?;
    let mut rows = stmt.query_map(params![id], |row| Ok(product_from_row(row)))?;
    match rows.next() {
        Some(row) => row?,
        None => Err(StoreError::NotFound),
    }
}

pub(crate) fn count_products(conn: &Connection, status: RecordStatus) -> Result<u32, StoreError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM products WHERE status = ?1",
        params![status.as_str()],
        |row| row.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(name: &str, company: &str) -> ProductPayload {
        ProductPayload {
            name: name.to_string(),
            company: company.to_string(),
            remarks: String::new(),
            unit_of_measurement: UnitOfMeasurement::Nos,
            sku: None,
        }
    }

    #[test]
    fn blank_sku_gets_generated() {
        let store = Store::open_in_memory().unwrap();
        let product = store.create_product(&payload("Meter", "Wasion")).unwrap();
        assert_eq!(product.sku.len(), 13);
        assert!(product.sku.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn active_duplicate_pair_rejected_case_insensitively() {
        let store = Store::open_in_memory().unwrap();
        store.create_product(&payload("Meter", "Wasion")).unwrap();
        let err = store.create_product(&payload("METER", "wasion")).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        // A different company is fine.
        assert!(store.create_product(&payload("Meter", "Holley")).is_ok());
    }

    #[test]
    fn binned_product_does_not_block_reuse_but_restore_does() {
        let store = Store::open_in_memory().unwrap();
        let old = store.create_product(&payload("Meter", "Wasion")).unwrap();
        store.set_product_status(old.id, RecordStatus::Bin).unwrap();

        // The pair is free again once the original is binned.
        store.create_product(&payload("Meter", "Wasion")).unwrap();

        // Restoring the binned copy would create an active duplicate.
        let err = store
            .set_product_status(old.id, RecordStatus::Active)
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn explicit_sku_conflicts_when_taken() {
        let store = Store::open_in_memory().unwrap();
        let mut first = payload("Meter", "Wasion");
        first.sku = Some("1234567890123".to_string());
        store.create_product(&first).unwrap();

        let mut second = payload("Transformer", "ABB");
        second.sku = Some("1234567890123".to_string());
        assert!(matches!(
            store.create_product(&second),
            Err(StoreError::Conflict(_))
        ));
    }

    #[test]
    fn bulk_bin_reports_missing_ids() {
        let store = Store::open_in_memory().unwrap();
        let a = store.create_product(&payload("Meter", "Wasion")).unwrap();
        let b = store.create_product(&payload("Cable", "Nexans")).unwrap();

        let (moved, missing) = store.bulk_bin_products(&[a.id, b.id, 999]).unwrap();
        assert_eq!(moved, 2);
        assert_eq!(missing, vec![999]);
        assert_eq!(store.count_products(RecordStatus::Bin).unwrap(), 2);
    }

    #[test]
    fn company_stats_order_by_count() {
        let store = Store::open_in_memory().unwrap();
        store.create_product(&payload("Meter", "Wasion")).unwrap();
        store.create_product(&payload("Cable", "Wasion")).unwrap();
        store.create_product(&payload("Transformer", "ABB")).unwrap();

        let stats = store.product_company_stats().unwrap();
        assert_eq!(stats[0].company, "Wasion");
        assert_eq!(stats[0].count, 2);
        assert_eq!(stats[1].company, "ABB");
    }

    #[test]
    fn csv_import_mixes_success_duplicates_and_failures() {
        let store = Store::open_in_memory().unwrap();
        store.create_product(&payload("Meter", "Wasion")).unwrap();

        let csv_text = "name,company,remarks,unit_of_measurement\n\
                        Meter,Wasion,existing,nos\n\
                        Cable,Nexans,100m drum,pieces\n\
                        ,NoName,missing name,set\n";
        let report = store.import_products_csv(csv_text).unwrap();
        assert_eq!(report.total_rows, 3);
        assert_eq!(report.successful, 1);
        assert_eq!(report.duplicates_skipped, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors.len(), 1);

        let imported = store
            .list_products(Some(RecordStatus::Active))
            .unwrap()
            .into_iter()
            .find(|p| p.name == "Cable")
            .expect("imported row");
        assert_eq!(imported.unit_of_measurement, UnitOfMeasurement::Pcs);
    }

    #[test]
    fn csv_import_honors_sku_and_status_columns() {
        let store = Store::open_in_memory().unwrap();
        let mut existing = payload("Meter", "Wasion");
        existing.sku = Some("5555555555555".to_string());
        store.create_product(&existing).unwrap();

        let csv_text = "name,company,remarks,unit_of_measurement,status,sku\n\
                        Cable,Nexans,,pcs,active,7777777777777\n\
                        Drum,Nexans,retired stock,pcs,deleted,\n\
                        Fuse,ABB,,nos,,5555555555555\n\
                        Switch,,no company,nos,,\n";
        let report = store.import_products_csv(csv_text).unwrap();
        assert_eq!(report.total_rows, 4);
        assert_eq!(report.successful, 2);
        assert_eq!(report.failed, 2);
        assert!(report
            .errors
            .iter()
            .any(|e| e.contains("SKU '5555555555555' already exists")));
        assert!(report.errors.iter().any(|e| e.contains("company is required")));

        let all = store.list_products(None).unwrap();
        // A supplied SKU is stored verbatim, not replaced by a generated one.
        let cable = all.iter().find(|p| p.name == "Cable").expect("cable row");
        assert_eq!(cable.sku, "7777777777777");
        assert_eq!(cable.status, RecordStatus::Active);

        // Status synonyms land the row in the bin.
        let drum = all.iter().find(|p| p.name == "Drum").expect("drum row");
        assert_eq!(drum.status, RecordStatus::Bin);

        // The taken-SKU row was rejected outright.
        assert!(all.iter().all(|p| p.name != "Fuse"));
        assert_eq!(
            all.iter().filter(|p| p.sku == "5555555555555").count(),
            1
        );
    }
}
