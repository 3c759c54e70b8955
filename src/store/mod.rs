//! Record store persisted as `store.toml` in the data directory
//!
//! Each command loads the store, performs one mutation through the methods
//! here and saves it back. Every mutation appends an audit entry.

mod audit;
mod client;
mod order;
mod sub_admin;
mod validate;
mod vendor;
mod work_type;

pub use audit::{AuditAction, AuditEntry};
pub use client::{Client, ClientPatch, NewClient};
pub use order::{NewOrder, Order, OrderPatch, OrderRow, OrderStatus};
pub use sub_admin::{NewSubAdmin, Permission, SubAdmin, SubAdminPatch};
pub use vendor::{NewVendor, Vendor, VendorPatch, VendorType};
pub use work_type::{NewWorkType, WorkType, WorkTypePatch};

use chrono::{DateTime, Local, NaiveDate, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::{InnoventoryError, Result};
use crate::table::Record;

pub const STORE_FILE: &str = "store.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    Vendor,
    Client,
    Order,
    SubAdmin,
    WorkType,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Vendor => "vendor",
            EntityKind::Client => "client",
            EntityKind::Order => "order",
            EntityKind::SubAdmin => "sub-admin",
            EntityKind::WorkType => "work-type",
        }
    }

    /// Used for export file names and upload directories
    pub fn plural(self) -> &'static str {
        match self {
            EntityKind::Vendor => "vendors",
            EntityKind::Client => "clients",
            EntityKind::Order => "orders",
            EntityKind::SubAdmin => "sub-admins",
            EntityKind::WorkType => "work-types",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            EntityKind::Vendor => "Vendor",
            EntityKind::Client => "Client",
            EntityKind::Order => "Order",
            EntityKind::SubAdmin => "Sub-admin",
            EntityKind::WorkType => "Type of work",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RecordStatus {
    #[default]
    Active,
    Inactive,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordStatus::Active => write!(f, "active"),
            RecordStatus::Inactive => write!(f, "inactive"),
        }
    }
}

/// Common behaviour of every stored entity
pub trait Entity: Record + Clone {
    const KIND: EntityKind;

    fn id(&self) -> u32;

    /// Short human label used in audit summaries
    fn label(&self) -> String;

    fn deleted_at(&self) -> Option<DateTime<Utc>>;

    fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>);

    fn collection(store: &Store) -> &Vec<Self>;

    fn collection_mut(store: &mut Store) -> &mut Vec<Self>;

    /// Descriptions of records that block a hard delete
    fn references(_store: &Store, _id: u32) -> Vec<String> {
        Vec::new()
    }

    fn is_deleted(&self) -> bool {
        self.deleted_at().is_some()
    }
}

/// Entities that carry uploaded attachments
pub trait Attachable: Entity {
    fn files(&self) -> &[String];

    fn files_mut(&mut self) -> &mut Vec<String>;
}

/// Last id handed out per entity; ids are never reused
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Counters {
    #[serde(default)]
    pub vendor: u32,
    #[serde(default)]
    pub client: u32,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub sub_admin: u32,
    #[serde(default)]
    pub work_type: u32,
    /// Sequence behind order numbers, reset each year
    #[serde(default)]
    pub order_seq: u32,
    #[serde(default)]
    pub order_year: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Store {
    #[serde(default)]
    pub counters: Counters,
    #[serde(default)]
    pub work_types: Vec<WorkType>,
    #[serde(default)]
    pub vendors: Vec<Vendor>,
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub sub_admins: Vec<SubAdmin>,
    #[serde(default)]
    pub audit: Vec<AuditEntry>,
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

impl Store {
    /// Load store.toml (empty store if missing)
    pub fn load(data_dir: &Path) -> Result<Store> {
        let path = data_dir.join(STORE_FILE);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no store yet, starting empty");
            return Ok(Store::default());
        }
        let content = fs::read_to_string(&path)?;
        let store: Store = toml::from_str(&content)
            .map_err(|e| InnoventoryError::ConfigParse { path, source: e })?;
        tracing::debug!(
            vendors = store.vendors.len(),
            clients = store.clients.len(),
            orders = store.orders.len(),
            "loaded store"
        );
        Ok(store)
    }

    /// Save store.toml
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let path = data_dir.join(STORE_FILE);
        let content = toml::to_string_pretty(self).map_err(|e| InnoventoryError::StoreWrite {
            path: path.clone(),
            source: e,
        })?;
        fs::write(&path, content)?;
        Ok(())
    }

    pub fn get<E: Entity>(&self, id: u32) -> Result<&E> {
        E::collection(self)
            .iter()
            .find(|e| e.id() == id)
            .ok_or_else(|| not_found(E::KIND, id))
    }

    /// Like `get`, but soft-deleted records are an error
    pub fn get_live<E: Entity>(&self, id: u32) -> Result<&E> {
        let entity = self.get::<E>(id)?;
        if entity.is_deleted() {
            return Err(InnoventoryError::Deleted {
                entity: E::KIND.title(),
                id,
            });
        }
        Ok(entity)
    }

    pub(crate) fn position<E: Entity>(&self, id: u32) -> Result<usize> {
        E::collection(self)
            .iter()
            .position(|e| e.id() == id)
            .ok_or_else(|| not_found(E::KIND, id))
    }

    /// Records for a list page, hiding soft-deleted ones unless asked
    pub fn listing<E: Entity>(&self, include_deleted: bool) -> Vec<&E> {
        E::collection(self)
            .iter()
            .filter(|e| include_deleted || !e.is_deleted())
            .collect()
    }

    pub fn soft_delete<E: Entity>(&mut self, id: u32) -> Result<()> {
        let idx = self.position::<E>(id)?;
        let entity = &mut E::collection_mut(self)[idx];
        if entity.is_deleted() {
            return Err(InnoventoryError::Deleted {
                entity: E::KIND.title(),
                id,
            });
        }
        entity.set_deleted_at(Some(Utc::now()));
        let label = entity.label();
        tracing::info!(entity = %E::KIND, id, "soft-deleted");
        self.record(AuditAction::Deleted, E::KIND, Some(id), label);
        Ok(())
    }

    /// Remove a record for good; refused while other records point at it
    pub fn hard_delete<E: Entity>(&mut self, id: u32) -> Result<E> {
        let idx = self.position::<E>(id)?;
        let refs = E::references(self, id);
        if !refs.is_empty() {
            return Err(InnoventoryError::InUse {
                entity: E::KIND.title(),
                id,
                referenced_by: refs.join(", "),
            });
        }
        let removed = E::collection_mut(self).remove(idx);
        tracing::info!(entity = %E::KIND, id, "hard-deleted");
        self.record(
            AuditAction::Deleted,
            E::KIND,
            Some(id),
            format!("{} (permanently)", removed.label()),
        );
        Ok(removed)
    }

    pub fn restore<E: Entity>(&mut self, id: u32) -> Result<()> {
        let idx = self.position::<E>(id)?;
        let entity = &mut E::collection_mut(self)[idx];
        if !entity.is_deleted() {
            return Err(InnoventoryError::NotDeleted {
                entity: E::KIND.title(),
                id,
            });
        }
        entity.set_deleted_at(None);
        let label = entity.label();
        tracing::info!(entity = %E::KIND, id, "restored");
        self.record(AuditAction::Restored, E::KIND, Some(id), label);
        Ok(())
    }

    /// Register an uploaded file name on a record
    pub fn attach<E: Attachable>(&mut self, id: u32, stored_name: &str) -> Result<()> {
        self.get_live::<E>(id)?;
        let idx = self.position::<E>(id)?;
        E::collection_mut(self)[idx]
            .files_mut()
            .push(stored_name.to_string());
        self.record(
            AuditAction::Attached,
            E::KIND,
            Some(id),
            stored_name.to_string(),
        );
        Ok(())
    }

    pub fn detach<E: Attachable>(&mut self, id: u32, stored_name: &str) -> Result<()> {
        let idx = self.position::<E>(id)?;
        let files = E::collection_mut(self)[idx].files_mut();
        let pos = files
            .iter()
            .position(|f| f == stored_name)
            .ok_or_else(|| InnoventoryError::AttachmentNotFound {
                entity: E::KIND.title(),
                id,
                name: stored_name.to_string(),
            })?;
        files.remove(pos);
        self.record(
            AuditAction::Detached,
            E::KIND,
            Some(id),
            stored_name.to_string(),
        );
        Ok(())
    }

    pub fn record(
        &mut self,
        action: AuditAction,
        entity: EntityKind,
        entity_id: Option<u32>,
        summary: impl Into<String>,
    ) {
        self.audit.push(AuditEntry {
            at: Utc::now(),
            action,
            entity,
            entity_id,
            summary: summary.into(),
        });
    }
}

fn not_found(kind: EntityKind, id: u32) -> InnoventoryError {
    InnoventoryError::NotFound {
        entity: kind.title(),
        id: id.to_string(),
    }
}

/// Describe which fields a patch touched, for audit summaries
pub(crate) fn changed_fields(fields: &[(&'static str, bool)]) -> String {
    let changed: Vec<&str> = fields
        .iter()
        .filter(|(_, touched)| *touched)
        .map(|(name, _)| *name)
        .collect();
    if changed.is_empty() {
        "no changes".to_string()
    } else {
        format!("changed {}", changed.join(", "))
    }
}
