use chrono::{DateTime, NaiveDate, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::validate;
use super::{changed_fields, today, AuditAction, Entity, EntityKind, RecordStatus, Store};
use crate::error::{InnoventoryError, Result};
use crate::table::{CellValue, Column, Record};

/// Dashboard pages a sub-admin may work on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Permission {
    Vendors,
    Clients,
    Orders,
    WorkTypes,
    Export,
    Audit,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Permission::Vendors => "vendors",
            Permission::Clients => "clients",
            Permission::Orders => "orders",
            Permission::WorkTypes => "work-types",
            Permission::Export => "export",
            Permission::Audit => "audit",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SubAdmin {
    pub id: u32,
    pub name: String,
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default)]
    pub status: RecordStatus,
    pub created_at: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewSubAdmin {
    pub name: String,
    pub email: String,
    pub username: String,
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Clone, Default)]
pub struct SubAdminPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub permissions: Option<Vec<Permission>>,
    pub status: Option<RecordStatus>,
}

static COLUMNS: [Column; 7] = [
    Column::number("id", "ID"),
    Column::text("name", "NAME"),
    Column::text("username", "USERNAME"),
    Column::text("email", "EMAIL"),
    Column::text("permissions", "PERMISSIONS"),
    Column::text("status", "STATUS"),
    Column::date("created", "CREATED").hidden(),
];

impl Record for SubAdmin {
    fn columns() -> &'static [Column] {
        &COLUMNS
    }

    fn cell(&self, key: &str) -> CellValue {
        match key {
            "id" => CellValue::Int(self.id.into()),
            "name" => CellValue::text(&self.name),
            "username" => CellValue::text(&self.username),
            "email" => CellValue::text(&self.email),
            "permissions" => CellValue::text(
                self.permissions
                    .iter()
                    .map(Permission::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            "status" if self.deleted_at.is_some() => CellValue::text("deleted"),
            "status" => CellValue::text(self.status.to_string()),
            "created" => CellValue::Date(self.created_at),
            _ => CellValue::Empty,
        }
    }
}

impl Entity for SubAdmin {
    const KIND: EntityKind = EntityKind::SubAdmin;

    fn id(&self) -> u32 {
        self.id
    }

    fn label(&self) -> String {
        format!("{} ({})", self.name, self.username)
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>) {
        self.deleted_at = at;
    }

    fn collection(store: &Store) -> &Vec<Self> {
        &store.sub_admins
    }

    fn collection_mut(store: &mut Store) -> &mut Vec<Self> {
        &mut store.sub_admins
    }
}

fn normalize_permissions(mut permissions: Vec<Permission>) -> Vec<Permission> {
    permissions.sort();
    permissions.dedup();
    permissions
}

impl Store {
    fn check_sub_admin_unique(&self, email: &str, username: &str, exclude: Option<u32>) -> Result<()> {
        for admin in self.sub_admins.iter().filter(|a| Some(a.id) != exclude) {
            if admin.email == email {
                return Err(InnoventoryError::Duplicate {
                    entity: EntityKind::SubAdmin.title(),
                    field: "email",
                    value: email.to_string(),
                });
            }
            if admin.username == username {
                return Err(InnoventoryError::Duplicate {
                    entity: EntityKind::SubAdmin.title(),
                    field: "username",
                    value: username.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn add_sub_admin(&mut self, new: NewSubAdmin) -> Result<u32> {
        let name = validate::required("name", &new.name)?;
        let email = validate::email(&new.email)?;
        let username = validate::username(&new.username)?;
        self.check_sub_admin_unique(&email, &username, None)?;

        self.counters.sub_admin += 1;
        let id = self.counters.sub_admin;
        let admin = SubAdmin {
            id,
            name,
            email,
            username,
            permissions: normalize_permissions(new.permissions),
            status: RecordStatus::Active,
            created_at: today(),
            updated_at: None,
            deleted_at: None,
        };
        let label = admin.label();
        self.sub_admins.push(admin);

        tracing::info!(id, "added sub-admin");
        self.record(AuditAction::Created, EntityKind::SubAdmin, Some(id), label);
        Ok(id)
    }

    pub fn update_sub_admin(&mut self, id: u32, patch: SubAdminPatch) -> Result<()> {
        let current = self.get_live::<SubAdmin>(id)?.clone();
        let mut updated = current.clone();

        if let Some(v) = &patch.name {
            updated.name = validate::required("name", v)?;
        }
        if let Some(v) = &patch.email {
            updated.email = validate::email(v)?;
        }
        if let Some(v) = &patch.username {
            updated.username = validate::username(v)?;
        }
        if let Some(v) = patch.permissions {
            updated.permissions = normalize_permissions(v);
        }
        if let Some(v) = patch.status {
            updated.status = v;
        }
        self.check_sub_admin_unique(&updated.email, &updated.username, Some(id))?;
        updated.updated_at = Some(today());

        let summary = changed_fields(&[
            ("name", updated.name != current.name),
            ("email", updated.email != current.email),
            ("username", updated.username != current.username),
            ("permissions", updated.permissions != current.permissions),
            ("status", updated.status != current.status),
        ]);
        let idx = self.position::<SubAdmin>(id)?;
        self.sub_admins[idx] = updated;

        tracing::info!(id, %summary, "updated sub-admin");
        self.record(AuditAction::Updated, EntityKind::SubAdmin, Some(id), summary);
        Ok(())
    }
}
