use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::validate;
use super::{
    changed_fields, today, Attachable, AuditAction, Entity, EntityKind, RecordStatus, Store,
};
use crate::error::{InnoventoryError, Result};
use crate::table::{CellValue, Column, Record};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Client {
    pub id: u32,
    pub company_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub phones: Vec<String>,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
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
pub struct NewClient {
    pub company_name: String,
    pub contact_name: Option<String>,
    pub email: String,
    pub phones: Vec<String>,
    pub country: String,
    pub city: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ClientPatch {
    pub company_name: Option<String>,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phones: Option<Vec<String>>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub status: Option<RecordStatus>,
}

static COLUMNS: [Column; 12] = [
    Column::number("id", "ID"),
    Column::text("company", "COMPANY"),
    Column::text("contact", "CONTACT"),
    Column::text("email", "EMAIL"),
    Column::text("phone", "PHONE"),
    Column::text("country", "COUNTRY").hidden(),
    Column::text("city", "CITY"),
    Column::text("address", "ADDRESS").hidden(),
    Column::text("website", "WEBSITE").hidden(),
    Column::text("status", "STATUS"),
    Column::number("files", "FILES").hidden(),
    Column::date("created", "CREATED").hidden(),
];

impl Record for Client {
    fn columns() -> &'static [Column] {
        &COLUMNS
    }

    fn cell(&self, key: &str) -> CellValue {
        match key {
            "id" => CellValue::Int(self.id.into()),
            "company" => CellValue::text(&self.company_name),
            "contact" => CellValue::opt_text(self.contact_name.as_deref()),
            "email" => CellValue::text(&self.email),
            "phone" => CellValue::list(&self.phones),
            "country" => CellValue::text(&self.country),
            "city" => CellValue::opt_text(self.city.as_deref()),
            "address" => CellValue::opt_text(self.address.as_deref()),
            "website" => CellValue::opt_text(self.website.as_deref()),
            "status" if self.deleted_at.is_some() => CellValue::text("deleted"),
            "status" => CellValue::text(self.status.to_string()),
            "files" => CellValue::Int(self.files.len() as i64),
            "created" => CellValue::Date(self.created_at),
            _ => CellValue::Empty,
        }
    }
}

impl Entity for Client {
    const KIND: EntityKind = EntityKind::Client;

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
        &store.clients
    }

    fn collection_mut(store: &mut Store) -> &mut Vec<Self> {
        &mut store.clients
    }

    fn references(store: &Store, id: u32) -> Vec<String> {
        store
            .orders
            .iter()
            .filter(|o| o.client_id == id)
            .map(|o| format!("order {}", o.number))
            .collect()
    }
}

impl Attachable for Client {
    fn files(&self) -> &[String] {
        &self.files
    }

    fn files_mut(&mut self) -> &mut Vec<String> {
        &mut self.files
    }
}

impl Store {
    fn check_client_unique(&self, company: &str, email: &str, exclude: Option<u32>) -> Result<()> {
        for client in self.clients.iter().filter(|c| Some(c.id) != exclude) {
            if validate::same_name(&client.company_name, company) {
                return Err(InnoventoryError::Duplicate {
                    entity: EntityKind::Client.title(),
                    field: "company name",
                    value: company.to_string(),
                });
            }
            if client.email == email {
                return Err(InnoventoryError::Duplicate {
                    entity: EntityKind::Client.title(),
                    field: "email",
                    value: email.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn add_client(&mut self, new: NewClient) -> Result<u32> {
        let company_name = validate::required("company_name", &new.company_name)?;
        let email = validate::email(&new.email)?;
        let phones = validate::phones(&new.phones)?;
        let country = validate::required("country", &new.country)?;
        self.check_client_unique(&company_name, &email, None)?;

        self.counters.client += 1;
        let id = self.counters.client;
        self.clients.push(Client {
            id,
            company_name: company_name.clone(),
            contact_name: validate::optional(new.contact_name.as_deref()),
            email,
            phones,
            country,
            city: validate::optional(new.city.as_deref()),
            address: validate::optional(new.address.as_deref()),
            website: validate::optional(new.website.as_deref()),
            status: RecordStatus::Active,
            files: Vec::new(),
            created_at: today(),
            updated_at: None,
            deleted_at: None,
        });

        tracing::info!(id, company = %company_name, "added client");
        self.record(AuditAction::Created, EntityKind::Client, Some(id), company_name);
        Ok(id)
    }

    pub fn update_client(&mut self, id: u32, patch: ClientPatch) -> Result<()> {
        let current = self.get_live::<Client>(id)?.clone();
        let mut updated = current.clone();

        if let Some(v) = &patch.company_name {
            updated.company_name = validate::required("company_name", v)?;
        }
        if let Some(v) = &patch.contact_name {
            updated.contact_name = validate::optional(Some(v));
        }
        if let Some(v) = &patch.email {
            updated.email = validate::email(v)?;
        }
        if let Some(v) = &patch.phones {
            updated.phones = validate::phones(v)?;
        }
        if let Some(v) = &patch.country {
            updated.country = validate::required("country", v)?;
        }
        if let Some(v) = &patch.city {
            updated.city = validate::optional(Some(v));
        }
        if let Some(v) = &patch.address {
            updated.address = validate::optional(Some(v));
        }
        if let Some(v) = &patch.website {
            updated.website = validate::optional(Some(v));
        }
        if let Some(v) = patch.status {
            updated.status = v;
        }
        self.check_client_unique(&updated.company_name, &updated.email, Some(id))?;
        updated.updated_at = Some(today());

        let summary = changed_fields(&[
            ("company_name", updated.company_name != current.company_name),
            ("contact_name", updated.contact_name != current.contact_name),
            ("email", updated.email != current.email),
            ("phones", updated.phones != current.phones),
            ("country", updated.country != current.country),
            ("city", updated.city != current.city),
            ("address", updated.address != current.address),
            ("website", updated.website != current.website),
            ("status", updated.status != current.status),
        ]);
        let idx = self.position::<Client>(id)?;
        self.clients[idx] = updated;

        tracing::info!(id, %summary, "updated client");
        self.record(AuditAction::Updated, EntityKind::Client, Some(id), summary);
        Ok(())
    }
}
