use chrono::{DateTime, NaiveDate, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::validate;
use super::{
    changed_fields, today, Attachable, AuditAction, Entity, EntityKind, RecordStatus, Store,
};
use crate::error::{InnoventoryError, Result};
use crate::table::{CellValue, Column, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum VendorType {
    Individual,
    Firm,
}

impl fmt::Display for VendorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VendorType::Individual => write!(f, "individual"),
            VendorType::Firm => write!(f, "firm"),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Vendor {
    pub id: u32,
    pub company_name: String,
    pub vendor_type: VendorType,
    pub email: String,
    #[serde(default)]
    pub phones: Vec<String>,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gst_number: Option<String>,
    /// Names of the work types this vendor handles
    #[serde(default)]
    pub work_types: Vec<String>,
    #[serde(default)]
    pub status: RecordStatus,
    #[serde(default)]
    pub files: Vec<String>,
    pub created_at: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewVendor {
    pub company_name: String,
    pub vendor_type: VendorType,
    pub email: String,
    pub phones: Vec<String>,
    pub country: String,
    pub state: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub gst_number: Option<String>,
    pub work_types: Vec<String>,
}

/// Fields to change; `Some("")` clears an optional text field
#[derive(Debug, Clone, Default)]
pub struct VendorPatch {
    pub company_name: Option<String>,
    pub vendor_type: Option<VendorType>,
    pub email: Option<String>,
    pub phones: Option<Vec<String>>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub gst_number: Option<String>,
    pub work_types: Option<Vec<String>>,
    pub status: Option<RecordStatus>,
}

static COLUMNS: [Column; 14] = [
    Column::number("id", "ID"),
    Column::text("company", "COMPANY"),
    Column::text("type", "TYPE"),
    Column::text("email", "EMAIL"),
    Column::text("phone", "PHONE"),
    Column::text("country", "COUNTRY").hidden(),
    Column::text("state", "STATE").hidden(),
    Column::text("city", "CITY"),
    Column::text("address", "ADDRESS").hidden(),
    Column::text("gst", "GST").hidden(),
    Column::text("work", "TYPE OF WORK"),
    Column::text("status", "STATUS"),
    Column::number("files", "FILES").hidden(),
    Column::date("created", "CREATED").hidden(),
];

impl Record for Vendor {
    fn columns() -> &'static [Column] {
        &COLUMNS
    }

    fn cell(&self, key: &str) -> CellValue {
        match key {
            "id" => CellValue::Int(self.id.into()),
            "company" => CellValue::text(&self.company_name),
            "type" => CellValue::text(self.vendor_type.to_string()),
            "email" => CellValue::text(&self.email),
            "phone" => CellValue::list(&self.phones),
            "country" => CellValue::text(&self.country),
            "state" => CellValue::opt_text(self.state.as_deref()),
            "city" => CellValue::opt_text(self.city.as_deref()),
            "address" => CellValue::opt_text(self.address.as_deref()),
            "gst" => CellValue::opt_text(self.gst_number.as_deref()),
            "work" => CellValue::list(&self.work_types),
            "status" if self.deleted_at.is_some() => CellValue::text("deleted"),
            "status" => CellValue::text(self.status.to_string()),
            "files" => CellValue::Int(self.files.len() as i64),
            "created" => CellValue::Date(self.created_at),
            _ => CellValue::Empty,
        }
    }
}

impl Entity for Vendor {
    const KIND: EntityKind = EntityKind::Vendor;

    fn id(&self) -> u32 {
        self.id
    }

    fn label(&self) -> String {
        self.company_name.clone()
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>) {
        self.deleted_at = at;
    }

    fn collection(store: &Store) -> &Vec<Self> {
        &store.vendors
    }

    fn collection_mut(store: &mut Store) -> &mut Vec<Self> {
        &mut store.vendors
    }

    fn references(store: &Store, id: u32) -> Vec<String> {
        store
            .orders
            .iter()
            .filter(|o| o.vendor_id == Some(id))
            .map(|o| format!("order {}", o.number))
            .collect()
    }
}

impl Attachable for Vendor {
    fn files(&self) -> &[String] {
        &self.files
    }

    fn files_mut(&mut self) -> &mut Vec<String> {
        &mut self.files
    }
}

impl Store {
    fn check_vendor_email(&self, email: &str, exclude: Option<u32>) -> Result<()> {
        if self
            .vendors
            .iter()
            .any(|v| Some(v.id) != exclude && v.email == email)
        {
            return Err(InnoventoryError::Duplicate {
                entity: EntityKind::Vendor.title(),
                field: "email",
                value: email.to_string(),
            });
        }
        Ok(())
    }

    fn resolve_work_types(&self, names: &[String]) -> Result<Vec<String>> {
        let mut resolved: Vec<String> = Vec::new();
        for name in names.iter().filter(|n| !n.trim().is_empty()) {
            let canonical = self.resolve_work_type(name)?;
            if !resolved.contains(&canonical) {
                resolved.push(canonical);
            }
        }
        Ok(resolved)
    }

    pub fn add_vendor(&mut self, new: NewVendor) -> Result<u32> {
        let company_name = validate::required("company_name", &new.company_name)?;
        let email = validate::email(&new.email)?;
        let phones = validate::phones(&new.phones)?;
        let country = validate::required("country", &new.country)?;
        let gst_number = validate::gst_number(new.gst_number.as_deref())?;
        let work_types = self.resolve_work_types(&new.work_types)?;
        self.check_vendor_email(&email, None)?;

        self.counters.vendor += 1;
        let id = self.counters.vendor;
        self.vendors.push(Vendor {
            id,
            company_name: company_name.clone(),
            vendor_type: new.vendor_type,
            email,
            phones,
            country,
            state: validate::optional(new.state.as_deref()),
            city: validate::optional(new.city.as_deref()),
            address: validate::optional(new.address.as_deref()),
            gst_number,
            work_types,
            status: RecordStatus::Active,
            files: Vec::new(),
            created_at: today(),
            updated_at: None,
            deleted_at: None,
        });

        tracing::info!(id, company = %company_name, "added vendor");
        self.record(AuditAction::Created, EntityKind::Vendor, Some(id), company_name);
        Ok(id)
    }

    pub fn update_vendor(&mut self, id: u32, patch: VendorPatch) -> Result<()> {
        let current = self.get_live::<Vendor>(id)?.clone();
        let mut updated = current.clone();

        if let Some(v) = &patch.company_name {
            updated.company_name = validate::required("company_name", v)?;
        }
        if let Some(v) = patch.vendor_type {
            updated.vendor_type = v;
        }
        if let Some(v) = &patch.email {
            updated.email = validate::email(v)?;
            self.check_vendor_email(&updated.email, Some(id))?;
        }
        if let Some(v) = &patch.phones {
            updated.phones = validate::phones(v)?;
        }
        if let Some(v) = &patch.country {
            updated.country = validate::required("country", v)?;
        }
        if let Some(v) = &patch.state {
            updated.state = validate::optional(Some(v));
        }
        if let Some(v) = &patch.city {
            updated.city = validate::optional(Some(v));
        }
        if let Some(v) = &patch.address {
            updated.address = validate::optional(Some(v));
        }
        if let Some(v) = &patch.gst_number {
            updated.gst_number = validate::gst_number(Some(v))?;
        }
        if let Some(v) = &patch.work_types {
            updated.work_types = self.resolve_work_types(v)?;
        }
        if let Some(v) = patch.status {
            updated.status = v;
        }
        updated.updated_at = Some(today());

        let summary = changed_fields(&[
            ("company_name", updated.company_name != current.company_name),
            ("vendor_type", updated.vendor_type != current.vendor_type),
            ("email", updated.email != current.email),
            ("phones", updated.phones != current.phones),
            ("country", updated.country != current.country),
            ("state", updated.state != current.state),
            ("city", updated.city != current.city),
            ("address", updated.address != current.address),
            ("gst_number", updated.gst_number != current.gst_number),
            ("work_types", updated.work_types != current.work_types),
            ("status", updated.status != current.status),
        ]);
        let idx = self.position::<Vendor>(id)?;
        self.vendors[idx] = updated;

        tracing::info!(id, %summary, "updated vendor");
        self.record(AuditAction::Updated, EntityKind::Vendor, Some(id), summary);
        Ok(())
    }
}
