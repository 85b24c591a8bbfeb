use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use super::{now_ts, parse_record_status, parse_ts, Store, StoreError};
use crate::domain::{Employee, EmployeeLevel, EmployeePayload, RecordStatus};

/// One row of the per-role workload breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct RoleLoadEntry {
    pub role: String,
    pub label: String,
    pub count: u32,
}

/// One row of the per-branch workload breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct BranchLoadEntry {
    pub organization_id: u16,
    pub branch_name: String,
    pub count: u32,
}

const SELECT: &str = "SELECT e.id, e.first_name, e.middle_name, e.last_name, e.email, e.role,
        e.status, e.created_at, e.updated_at, b.organization_id, b.name AS branch_name
 FROM employees e JOIN branches b ON b.id = e.branch_id";

fn employee_from_row(row: &Row<'_>) -> Result<Employee, StoreError> {
    let role: String = row.get("role")?;
    Ok(Employee {
        id: row.get("id")?,
        first_name: row.get("first_name")?,
        middle_name: row.get("middle_name")?,
        last_name: row.get("last_name")?,
        email: row.get("email")?,
        role: EmployeeLevel::parse(&role)
            .map_err(|_| StoreError::Corrupt(format!("bad employee role '{role}'")))?,
        organization_id: row.get::<_, i64>("organization_id")? as u16,
        branch_name: row.get("branch_name")?,
        status: parse_record_status(&row.get::<_, String>("status")?)?,
        created_at: parse_ts(&row.get::<_, String>("created_at")?)?,
        updated_at: parse_ts(&row.get::<_, String>("updated_at")?)?,
    })
}

impl Store {
    /// Insert an employee under the branch addressed by `organization_id`.
    pub fn create_employee(
        &self,
        payload: &EmployeePayload,
        role: EmployeeLevel,
    ) -> Result<Employee, StoreError> {
        self.with_conn(|conn| {
            let branch_id = resolve_branch(conn, payload.organization_id)?;
            ensure_email_free(conn, &payload.email, None)?;
            let now = now_ts();
            conn.execute(
                "INSERT INTO employees (branch_id, first_name, middle_name, last_name, email, role, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
                params![
                    branch_id,
                    payload.first_name.trim(),
                    payload.middle_name.as_deref().map(str::trim),
                    payload.last_name.trim(),
                    payload.email.trim().to_ascii_lowercase(),
                    role.as_digit().to_string(),
                    RecordStatus::Active.as_str(),
                    now,
                ],
            )?;
            get_employee(conn, conn.last_insert_rowid())
        })
    }

    pub fn get_employee(&self, id: i64) -> Result<Employee, StoreError> {
        self.with_conn(|conn| get_employee(conn, id))
    }

    pub fn list_employees(
        &self,
        status: Option<RecordStatus>,
    ) -> Result<Vec<Employee>, StoreError> {
        self.with_conn(|conn| {
            match status {
                Some(status) => collect(
                    conn,
                    &format!("{SELECT} WHERE e.status = ?1 ORDER BY e.created_at DESC, e.id DESC"),
                    params![status.as_str()],
                ),
                None => collect(
                    conn,
                    &format!("{SELECT} ORDER BY e.created_at DESC, e.id DESC"),
                    params![],
                ),
            }
        })
    }

    /// Active employees of one branch, addressed by organization id.
    pub fn list_employees_by_organization(
        &self,
        organization_id: u16,
    ) -> Result<Vec<Employee>, StoreError> {
        self.with_conn(|conn| {
            // Resolve first so an unknown branch reports NotFound instead of
            // an empty list.
            resolve_branch(conn, organization_id)?;
            collect(
                conn,
                &format!(
                    "{SELECT} WHERE b.organization_id = ?1 AND e.status = ?2
                     ORDER BY e.created_at DESC, e.id DESC"
                ),
                params![i64::from(organization_id), RecordStatus::Active.as_str()],
            )
        })
    }

    /// Case-insensitive substring match over names and email, active rows only.
    pub fn search_employees(&self, query: &str) -> Result<Vec<Employee>, StoreError> {
        self.with_conn(|conn| {
            let needle = format!("%{}%", query.trim().to_lowercase());
            collect(
                conn,
                &format!(
                    "{SELECT} WHERE e.status = ?1 AND (
                         lower(e.first_name) LIKE ?2
                         OR lower(coalesce(e.middle_name, '')) LIKE ?2
                         OR lower(e.last_name) LIKE ?2
                         OR lower(e.email) LIKE ?2
                         OR lower(b.name) LIKE ?2)
                     ORDER BY e.created_at DESC, e.id DESC"
                ),
                params![RecordStatus::Active.as_str(), needle],
            )
        })
    }

    pub fn update_employee(
        &self,
        id: i64,
        payload: &EmployeePayload,
        role: EmployeeLevel,
    ) -> Result<Employee, StoreError> {
        self.with_conn(|conn| {
            let branch_id = resolve_branch(conn, payload.organization_id)?;
            ensure_email_free(conn, &payload.email, Some(id))?;
            let changed = conn.execute(
                "UPDATE employees SET branch_id = ?1, first_name = ?2, middle_name = ?3,
                 last_name = ?4, email = ?5, role = ?6, updated_at = ?7 WHERE id = ?8",
                params![
                    branch_id,
                    payload.first_name.trim(),
                    payload.middle_name.as_deref().map(str::trim),
                    payload.last_name.trim(),
                    payload.email.trim().to_ascii_lowercase(),
                    role.as_digit().to_string(),
                    now_ts(),
                    id,
                ],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound);
            }
            get_employee(conn, id)
        })
    }

    pub fn set_employee_status(
        &self,
        id: i64,
        status: RecordStatus,
    ) -> Result<Employee, StoreError> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE employees SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status.as_str(), now_ts(), id],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound);
            }
            get_employee(conn, id)
        })
    }

    pub fn count_employees(&self, status: RecordStatus) -> Result<u32, StoreError> {
        self.with_conn(|conn| count_employees(conn, status))
    }

    /// Active headcount per role level, roles with no employees omitted.
    pub fn employee_role_stats(&self) -> Result<Vec<RoleLoadEntry>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT role, COUNT(*) AS n FROM employees WHERE status = ?1
                 GROUP BY role ORDER BY role",
            )?;
            let rows = stmt.query_map(params![RecordStatus::Active.as_str()], |row| {
                let role: String = row.get("role")?;
                let count: u32 = row.get("n")?;
                Ok((role, count))
            })?;
            let mut out = Vec::new();
            for row in rows {
                let (role, count) = row?;
                let label = EmployeeLevel::parse(&role)
                    .map(EmployeeLevel::label)
                    .map_err(|_| StoreError::Corrupt(format!("bad employee role '{role}'")))?;
                out.push(RoleLoadEntry { role, label, count });
            }
            Ok(out)
        })
    }

    /// Active headcount per branch, including branches with none.
    pub fn employee_branch_stats(&self) -> Result<Vec<BranchLoadEntry>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT b.organization_id, b.name,
                        COUNT(e.id) FILTER (WHERE e.status = ?1) AS n
                 FROM branches b LEFT JOIN employees e ON e.branch_id = b.id
                 WHERE b.status = ?1
                 GROUP BY b.id ORDER BY b.organization_id",
            )?;
            let rows = stmt.query_map(params![RecordStatus::Active.as_str()], |row| {
                Ok(BranchLoadEntry {
                    organization_id: row.get::<_, i64>(0)? as u16,
                    branch_name: row.get(1)?,
                    count: row.get(2)?,
                })
            })?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
    }
}

fn resolve_branch(conn: &Connection, organization_id: u16) -> Result<i64, StoreError> {
    conn.query_row(
        "SELECT id FROM branches WHERE organization_id = ?1",
        params![i64::from(organization_id)],
        |row| row.get(0),
    )
    .optional()?
    .ok_or(StoreError::NotFound)
}

fn ensure_email_free(
    conn: &Connection,
    email: &str,
    exclude_id: Option<i64>,
) -> Result<(), StoreError> {
    let email = email.trim().to_ascii_lowercase();
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM employees WHERE email = ?1",
            params![email],
            |row| row.get(0),
        )
        .optional()?;
    match existing {
        Some(id) if Some(id) != exclude_id => Err(StoreError::Conflict(format!(
            "an employee with email '{email}' already exists"
        ))),
        _ => Ok(()),
    }
}

fn collect(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<Employee>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| Ok(employee_from_row(row)))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row??);
    }
    Ok(out)
}

fn get_employee(conn: &Connection, id: i64) -> Result<Employee, StoreError> {
    let mut stmt = conn.prepare(&format!("{SELECT} WHERE e.id = ?1"))?;
    let mut rows = stmt.query_map(params![id], |row| Ok(employee_from_row(row)))?;
    match rows.next() {
        Some(row) => row?,
        None => Err(StoreError::NotFound),
    }
}

pub(crate) fn count_employees(conn: &Connection, status: RecordStatus) -> Result<u32, StoreError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM employees WHERE status = ?1",
        params![status.as_str()],
        |row| row.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BranchPayload;

    fn seeded_store() -> (Store, u16) {
        let store = Store::open_in_memory().unwrap();
        let branch = store
            .create_branch(&BranchPayload {
                name: "Pokhara".to_string(),
                email: None,
                address: String::new(),
                phone_number: String::new(),
            })
            .unwrap();
        (store, branch.organization_id)
    }

    fn payload(first: &str, email: &str, organization_id: u16) -> EmployeePayload {
        EmployeePayload {
            first_name: first.to_string(),
            middle_name: None,
            last_name: "Shrestha".to_string(),
            email: email.to_string(),
            role: "3".to_string(),
            organization_id,
        }
    }

    fn create(store: &Store, payload: &EmployeePayload) -> Employee {
        let role = payload.validate().unwrap();
        store.create_employee(payload, role).unwrap()
    }

    #[test]
    fn employee_joins_branch_fields() {
        let (store, org) = seeded_store();
        let employee = create(&store, &payload("Hari", "hari@nea.org.np", org));
        assert_eq!(employee.branch_name, "Pokhara");
        assert_eq!(employee.organization_id, org);
        assert_eq!(employee.role.as_digit(), 3);
    }

    #[test]
    fn unknown_branch_is_not_found() {
        let (store, _) = seeded_store();
        let payload = payload("Hari", "hari@nea.org.np", 999);
        let role = payload.validate().unwrap();
        assert!(matches!(
            store.create_employee(&payload, role),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn duplicate_email_conflicts_but_self_update_passes() {
        let (store, org) = seeded_store();
        let first = create(&store, &payload("Hari", "shared@nea.org.np", org));
        let second = payload("Gita", "shared@nea.org.np", org);
        let role = second.validate().unwrap();
        assert!(matches!(
            store.create_employee(&second, role),
            Err(StoreError::Conflict(_))
        ));

        // Updating the owner with its own email is fine.
        let own = payload("Hari", "shared@nea.org.np", org);
        let role = own.validate().unwrap();
        assert!(store.update_employee(first.id, &own, role).is_ok());
    }

    #[test]
    fn search_matches_names_and_branch() {
        let (store, org) = seeded_store();
        create(&store, &payload("Hari", "hari@nea.org.np", org));
        create(&store, &payload("Gita", "gita@nea.org.np", org));

        assert_eq!(store.search_employees("hAri").unwrap().len(), 1);
        assert_eq!(store.search_employees("pokhara").unwrap().len(), 2);
        assert!(store.search_employees("nobody").unwrap().is_empty());
    }

    #[test]
    fn stats_count_active_rows_only() {
        let (store, org) = seeded_store();
        let hari = create(&store, &payload("Hari", "hari@nea.org.np", org));
        create(&store, &payload("Gita", "gita@nea.org.np", org));
        store.set_employee_status(hari.id, RecordStatus::Bin).unwrap();

        let roles = store.employee_role_stats().unwrap();
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].role, "3");
        assert_eq!(roles[0].count, 1);

        let branches = store.employee_branch_stats().unwrap();
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].count, 1);
        assert_eq!(store.count_employees(RecordStatus::Bin).unwrap(), 1);
    }
}
