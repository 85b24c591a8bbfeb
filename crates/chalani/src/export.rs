//! CSV builders for the download endpoints. Every tabular export opens
//! with an `S.N.` column numbering rows from 1.

use chrono::{DateTime, Local, Utc};

use crate::domain::{Branch, Employee, Letter, Office, Product, Receiver};
use crate::numerals::to_devanagari_digits;
use crate::store::DashboardSnapshot;

/// Letters circulate in Devanagari, so their export is tagged for
/// spreadsheet tools that sniff encodings.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV serialization failed: {0}")]
    Csv(#[from] csv::Error),
}

/// Attachment filename with a minute-resolution local timestamp, e.g.
/// `letters_export_2025-04-18_14-05.csv`.
pub fn timestamped_filename(stem: &str) -> String {
    format!("{stem}_{}.csv", Local::now().format("%Y-%m-%d_%H-%M"))
}

fn ts(value: &DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, ExportError> {
    writer
        .into_inner()
        .map_err(|err| ExportError::Csv(err.into_error().into()))
}

pub fn offices_csv(offices: &[Office]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "S.N.", "ID", "Name", "Address", "Email", "Phone Number", "Status", "Created At",
        "Updated At",
    ])?;
    for (index, office) in offices.iter().enumerate() {
        writer.write_record([
            (index + 1).to_string(),
            office.id.to_string(),
            office.name.clone(),
            office.address.clone(),
            office.email.clone().unwrap_or_default(),
            office.phone_number.clone(),
            office.status.label().to_string(),
            ts(&office.created_at),
            ts(&office.updated_at),
        ])?;
    }
    finish(writer)
}

pub fn branches_csv(branches: &[Branch]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "S.N.", "Organization ID", "Name", "Email", "Address", "Phone Number", "Status",
        "Created At", "Updated At",
    ])?;
    for (index, branch) in branches.iter().enumerate() {
        writer.write_record([
            (index + 1).to_string(),
            branch.organization_id.to_string(),
            branch.name.clone(),
            branch.email.clone().unwrap_or_default(),
            branch.address.clone(),
            branch.phone_number.clone(),
            branch.status.label().to_string(),
            ts(&branch.created_at),
            ts(&branch.updated_at),
        ])?;
    }
    finish(writer)
}

pub fn employees_csv(employees: &[Employee]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "S.N.", "ID", "First Name", "Middle Name", "Last Name", "Email", "Role", "Branch Name",
        "Organization ID", "Status", "Created At", "Updated At",
    ])?;
    for (index, employee) in employees.iter().enumerate() {
        writer.write_record([
            (index + 1).to_string(),
            employee.id.to_string(),
            employee.first_name.clone(),
            employee.middle_name.clone().unwrap_or_default(),
            employee.last_name.clone(),
            employee.email.clone(),
            employee.role.label(),
            employee.branch_name.clone(),
            employee.organization_id.to_string(),
            employee.status.label().to_string(),
            ts(&employee.created_at),
            ts(&employee.updated_at),
        ])?;
    }
    finish(writer)
}

/// Shorter layout for quick printouts.
pub fn employees_simple_csv(employees: &[Employee]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "S.N.", "First Name", "Last Name", "Email", "Role", "Branch Name", "Organization ID",
        "Status",
    ])?;
    for (index, employee) in employees.iter().enumerate() {
        writer.write_record([
            (index + 1).to_string(),
            employee.first_name.clone(),
            employee.last_name.clone(),
            employee.email.clone(),
            employee.role.label(),
            employee.branch_name.clone(),
            employee.organization_id.to_string(),
            employee.status.label().to_string(),
        ])?;
    }
    finish(writer)
}

/// Per-branch roster without the branch columns.
pub fn employees_by_organization_csv(employees: &[Employee]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "S.N.", "ID", "First Name", "Middle Name", "Last Name", "Email", "Role", "Status",
        "Created At", "Updated At",
    ])?;
    for (index, employee) in employees.iter().enumerate() {
        writer.write_record([
            (index + 1).to_string(),
            employee.id.to_string(),
            employee.first_name.clone(),
            employee.middle_name.clone().unwrap_or_default(),
            employee.last_name.clone(),
            employee.email.clone(),
            employee.role.label(),
            employee.status.label().to_string(),
            ts(&employee.created_at),
            ts(&employee.updated_at),
        ])?;
    }
    finish(writer)
}

pub fn receivers_csv(receivers: &[Receiver]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "S.N.", "ID", "Name", "Post", "ID Card Type", "ID Card Number", "Office Name",
        "Office Address", "Phone Number", "Vehicle Number", "Created At", "Updated At",
    ])?;
    for (index, receiver) in receivers.iter().enumerate() {
        writer.write_record([
            (index + 1).to_string(),
            receiver.id.to_string(),
            receiver.name.clone(),
            receiver.post.clone(),
            receiver.id_card_type.label().to_string(),
            receiver.id_card_number.clone(),
            receiver.office_name.clone(),
            receiver.office_address.clone(),
            receiver.phone_number.clone(),
            receiver.vehicle_number.clone(),
            ts(&receiver.created_at),
            ts(&receiver.updated_at),
        ])?;
    }
    finish(writer)
}

pub fn products_csv(products: &[Product]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "S.N.", "ID", "Name", "Company", "SKU", "Remarks", "Unit of Measurement", "Status",
        "Created At", "Updated At",
    ])?;
    for (index, product) in products.iter().enumerate() {
        writer.write_record([
            (index + 1).to_string(),
            product.id.to_string(),
            product.name.clone(),
            product.company.clone(),
            product.sku.clone(),
            product.remarks.clone(),
            product.unit_of_measurement.label().to_string(),
            product.status.label().to_string(),
            ts(&product.created_at),
            ts(&product.updated_at),
        ])?;
    }
    finish(writer)
}

pub fn products_simple_csv(products: &[Product]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["S.N.", "Name", "Company", "SKU", "Remarks", "Unit", "Status"])?;
    for (index, product) in products.iter().enumerate() {
        writer.write_record([
            (index + 1).to_string(),
            product.name.clone(),
            product.company.clone(),
            product.sku.clone(),
            product.remarks.clone(),
            product.unit_of_measurement.label().to_string(),
            product.status.label().to_string(),
        ])?;
    }
    finish(writer)
}

/// Starter file for the products import endpoint, with commented guidance
/// ahead of the header row. The writer must be flexible: the comment rows
/// are single-field, the data rows are not.
pub fn product_import_template_csv() -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    writer.write_record(["# Required Fields: name, company"])?;
    writer.write_record(["# Optional Fields: remarks, unit_of_measurement, status, sku"])?;
    writer.write_record([
        "# Unit of Measurement options: nos, set, kg, ltr, pcs (or common names like: piece, kilogram, liter)",
    ])?;
    writer.write_record(["# Status options: active, bin (default: active)"])?;
    writer.write_record(["# SKU: Leave empty to auto-generate"])?;
    writer.write_record(["name", "company", "remarks", "unit_of_measurement", "status", "sku"])?;
    writer.write_record(["Energy Meter", "Wasion", "Single phase", "nos", "active", ""])?;
    writer.write_record(["Service Cable", "Nexans", "100m drum", "pcs", "active", "NEX-CABLE-100"])?;
    finish(writer)
}

/// Letter export, numeric fields rendered in Devanagari to match the
/// paper documents. The caller prepends [`UTF8_BOM`].
pub fn letters_csv(letters: &[Letter]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "S.N.", "ID", "Letter Count", "Chalani No", "Voucher No", "Date", "Subject",
        "Receiver Office", "Receiver Address", "Status", "Created At", "Updated At",
    ])?;
    for (index, letter) in letters.iter().enumerate() {
        let optional = |value: &Option<String>| match value.as_deref() {
            Some(value) if !value.is_empty() => to_devanagari_digits(value),
            _ => "N/A".to_string(),
        };
        writer.write_record([
            (index + 1).to_string(),
            letter.id.to_string(),
            to_devanagari_digits(&letter.letter_count),
            optional(&letter.chalani_no),
            optional(&letter.voucher_no),
            letter.date.clone(),
            letter.subject.clone(),
            letter.receiver_office_name.clone(),
            letter.receiver_address.clone(),
            letter.status.label().to_string(),
            ts(&letter.created_at),
            ts(&letter.updated_at),
        ])?;
    }
    finish(writer)
}

pub fn dashboard_csv(snapshot: &DashboardSnapshot) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Statistics", "Count"])?;
    let rows = [
        ("Active Products", snapshot.total_active_products.to_string()),
        ("Active Branches", snapshot.total_active_branches.to_string()),
        ("Active Offices", snapshot.total_active_offices.to_string()),
        ("Active Employees", snapshot.total_active_employees.to_string()),
        ("Total Receivers", snapshot.total_receivers.to_string()),
        ("Total Letters", snapshot.total_letters.to_string()),
        ("Draft Letters", snapshot.total_draft_letters.to_string()),
        ("Sent Letters", snapshot.total_sent_letters.to_string()),
        ("Last Updated", ts(&snapshot.last_updated)),
    ];
    for (label, count) in rows {
        writer.write_record([label.to_string(), count])?;
    }
    finish(writer)
}
