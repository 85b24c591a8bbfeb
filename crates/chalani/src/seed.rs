//! Sample data for demos and first-run setup.

use serde::Serialize;
use tracing::info;

use crate::auth::hash_password;
use crate::domain::{
    BranchPayload, EmployeePayload, IdCardType, LetterItemPayload, LetterPayload, LetterStatus,
    OfficePayload, ProductPayload, ReceiverPayload, ReceiverSnapshot, UnitOfMeasurement, User,
    UserRole,
};
use crate::store::{Store, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Row counts created by a seeding run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SeedSummary {
    pub offices: u32,
    pub branches: u32,
    pub employees: u32,
    pub receivers: u32,
    pub products: u32,
    pub letters: u32,
}

impl SeedSummary {
    pub fn is_empty(&self) -> bool {
        self.offices == 0
            && self.branches == 0
            && self.employees == 0
            && self.receivers == 0
            && self.products == 0
            && self.letters == 0
    }
}

/// Create the named admin account if it does not exist yet. Returns the
/// user and whether it was created by this call.
pub fn ensure_admin(
    store: &Store,
    email: &str,
    name: &str,
    password: &str,
) -> Result<(User, bool), SeedError> {
    if let Some(existing) = store.find_user_by_email(email)? {
        info!(email, "admin account already present");
        return Ok((existing, false));
    }
    let hash = hash_password(password);
    let user = store.create_user(email, name, UserRole::Admin, &hash)?;
    info!(email, "created admin account");
    Ok((user, true))
}

/// Populate an empty registry with sample records. A database that already
/// has branches is left untouched.
pub fn seed_demo_data(store: &Store) -> Result<SeedSummary, SeedError> {
    if !store.list_branches(None)?.is_empty() {
        info!("database already seeded, skipping");
        return Ok(SeedSummary::default());
    }

    let mut summary = SeedSummary::default();

    for (name, address) in [
        ("Head Office", "Durbar Marg, Kathmandu"),
        ("Regional Office West", "Newroad, Pokhara"),
    ] {
        store.create_office(&OfficePayload {
            name: name.to_string(),
            address: address.to_string(),
            email: None,
            phone_number: "01-4153051".to_string(),
        })?;
        summary.offices += 1;
    }

    let mut organization_ids = Vec::new();
    for (name, address) in [
        ("Pokhara Distribution Center", "Newroad, Pokhara"),
        ("Butwal Distribution Center", "Traffic Chowk, Butwal"),
        ("Hetauda Distribution Center", "Main Road, Hetauda"),
    ] {
        let branch = store.create_branch(&BranchPayload {
            name: name.to_string(),
            email: None,
            address: address.to_string(),
            phone_number: String::new(),
        })?;
        organization_ids.push(branch.organization_id);
        summary.branches += 1;
    }

    let staff = [
        ("Hari", "Adhikari", "hari.adhikari", "3"),
        ("Gita", "Shrestha", "gita.shrestha", "5"),
        ("Ram", "Karki", "ram.karki", "4"),
        ("Sita", "Gurung", "sita.gurung", "6"),
        ("Bishal", "Thapa", "bishal.thapa", "2"),
        ("Mina", "Rai", "mina.rai", "7"),
    ];
    for (index, (first, last, handle, role)) in staff.iter().enumerate() {
        let organization_id = organization_ids[index % organization_ids.len()];
        let payload = EmployeePayload {
            first_name: (*first).to_string(),
            middle_name: None,
            last_name: (*last).to_string(),
            email: format!("{handle}@nea.org.np"),
            role: (*role).to_string(),
            organization_id,
        };
        let level = payload
            .validate()
            .map_err(|err| StoreError::Conflict(err.to_string()))?;
        store.create_employee(&payload, level)?;
        summary.employees += 1;
    }

    for (name, post, phone) in [
        ("Gopal Thapa", "Driver", "9841122334"),
        ("Krishna Lama", "Storekeeper", "9856033445"),
    ] {
        store.create_receiver(&ReceiverPayload {
            name: name.to_string(),
            post: post.to_string(),
            id_card_number: "UNKNOWN".to_string(),
            id_card_type: IdCardType::EmployeeId,
            office_name: "UNKNOWN".to_string(),
            office_address: "UNKNOWN".to_string(),
            phone_number: phone.to_string(),
            vehicle_number: "UNKNOWN".to_string(),
        })?;
        summary.receivers += 1;
    }

    for (name, company, unit) in [
        ("Single Phase Energy Meter", "Wasion", UnitOfMeasurement::Nos),
        ("Three Phase Energy Meter", "Wasion", UnitOfMeasurement::Nos),
        ("Service Cable", "Nexans", UnitOfMeasurement::Pcs),
        ("Distribution Transformer 100kVA", "ABB", UnitOfMeasurement::Set),
        ("Transformer Oil", "Apar", UnitOfMeasurement::Ltr),
    ] {
        store.create_product(&ProductPayload {
            name: name.to_string(),
            company: company.to_string(),
            remarks: String::new(),
            unit_of_measurement: unit,
            sku: None,
        })?;
        summary.products += 1;
    }

    for (subject, status, chalani) in [
        ("Meter dispatch to Pokhara", Some(LetterStatus::Sent), Some("456")),
        ("Transformer oil request", Some(LetterStatus::Draft), None),
        ("Cable drum transfer", Some(LetterStatus::Sent), Some("457")),
    ] {
        store.create_letter(&LetterPayload {
            subject: subject.to_string(),
            letter_count: "1".to_string(),
            chalani_no: chalani.map(str::to_string),
            date: "2081/05/01".to_string(),
            receiver_office_name: "Pokhara Distribution Center".to_string(),
            receiver_address: "Newroad, Pokhara".to_string(),
            status,
            receiver: Some(ReceiverSnapshot {
                name: "Gopal Thapa".to_string(),
                post: "Driver".to_string(),
                phone_number: "9841122334".to_string(),
                ..ReceiverSnapshot::default()
            }),
            items: vec![LetterItemPayload {
                name: "Single Phase Energy Meter".to_string(),
                company: "Wasion".to_string(),
                serial_number: "1".to_string(),
                unit_of_measurement: "Nos.".to_string(),
                quantity: "10".to_string(),
                remarks: String::new(),
            }],
            ..LetterPayload::default()
        })?;
        summary.letters += 1;
    }

    store.refresh_dashboard()?;
    info!(
        branches = summary.branches,
        employees = summary.employees,
        products = summary.products,
        letters = summary.letters,
        "seeded sample data"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RecordStatus;

    #[test]
    fn seeding_populates_an_empty_store_once() {
        let store = Store::open_in_memory().unwrap();
        let summary = seed_demo_data(&store).unwrap();
        assert!(!summary.is_empty());
        assert_eq!(summary.branches, 3);

        let snapshot = store.refresh_dashboard().unwrap();
        assert_eq!(snapshot.total_active_branches, 3);
        assert!(snapshot.total_letters >= 3);

        // Second run is a no-op.
        let again = seed_demo_data(&store).unwrap();
        assert!(again.is_empty());
        assert_eq!(store.count_branches(RecordStatus::Active).unwrap(), 3);
    }

    #[test]
    fn ensure_admin_is_idempotent() {
        let store = Store::open_in_memory().unwrap();
        let (user, created) =
            ensure_admin(&store, "admin@nea.org.np", "Master Admin", "masteradmin@12345").unwrap();
        assert!(created);
        assert_eq!(user.role, UserRole::Admin);

        let (same, created) =
            ensure_admin(&store, "admin@nea.org.np", "Master Admin", "other-password").unwrap();
        assert!(!created);
        assert_eq!(same.id, user.id);
    }
}
