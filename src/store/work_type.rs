use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::validate::{optional, required, same_name};
use super::{changed_fields, today, AuditAction, Entity, EntityKind, Store};
use crate::error::{InnoventoryError, Result};
use crate::table::{CellValue, Column, Record};

/// Lookup entry categorizing the services vendors provide and orders request
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WorkType {
    pub id: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    pub created_at: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone)]
pub struct NewWorkType {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct WorkTypePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub active: Option<bool>,
}

static COLUMNS: [Column; 5] = [
    Column::number("id", "ID"),
    Column::text("name", "NAME"),
    Column::text("description", "DESCRIPTION"),
    Column::text("active", "ACTIVE"),
    Column::date("created", "CREATED").hidden(),
];

impl Record for WorkType {
    fn columns() -> &'static [Column] {
        &COLUMNS
    }

    fn cell(&self, key: &str) -> CellValue {
        match key {
            "id" => CellValue::Int(self.id.into()),
            "name" => CellValue::text(&self.name),
            "description" => CellValue::opt_text(self.description.as_deref()),
            "active" => CellValue::text(if self.active { "yes" } else { "no" }),
            "created" => CellValue::Date(self.created_at),
            _ => CellValue::Empty,
        }
    }
}

impl Entity for WorkType {
    const KIND: EntityKind = EntityKind::WorkType;

    fn id(&self) -> u32 {
        self.id
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>) {
        self.deleted_at = at;
    }

    fn collection(store: &Store) -> &Vec<Self> {
        &store.work_types
    }

    fn collection_mut(store: &mut Store) -> &mut Vec<Self> {
        &mut store.work_types
    }

    fn references(store: &Store, id: u32) -> Vec<String> {
        let Some(name) = store.work_types.iter().find(|w| w.id == id).map(|w| &w.name) else {
            return Vec::new();
        };
        let vendors = store
            .vendors
            .iter()
            .filter(|v| v.work_types.iter().any(|w| same_name(w, name)))
            .map(|v| format!("vendor #{}", v.id));
        let orders = store
            .orders
            .iter()
            .filter(|o| same_name(&o.work_type, name))
            .map(|o| format!("order {}", o.number));
        vendors.chain(orders).collect()
    }
}

impl Store {
    /// Find a live, active work type by name (case-insensitive) and return its canonical name
    pub fn resolve_work_type(&self, name: &str) -> Result<String> {
        let name = name.trim();
        let found = self
            .work_types
            .iter()
            .find(|w| same_name(&w.name, name))
            .ok_or_else(|| InnoventoryError::NotFound {
                entity: EntityKind::WorkType.title(),
                id: name.to_string(),
            })?;
        if found.deleted_at.is_some() || !found.active {
            return Err(InnoventoryError::validation(
                "work_type",
                format!("'{}' is not active", found.name),
            ));
        }
        Ok(found.name.clone())
    }

    fn check_work_type_name(&self, name: &str, exclude: Option<u32>) -> Result<()> {
        let taken = self
            .work_types
            .iter()
            .any(|w| Some(w.id) != exclude && same_name(&w.name, name));
        if taken {
            return Err(InnoventoryError::Duplicate {
                entity: EntityKind::WorkType.title(),
                field: "name",
                value: name.to_string(),
            });
        }
        Ok(())
    }

    pub fn add_work_type(&mut self, new: NewWorkType) -> Result<u32> {
        let name = required("name", &new.name)?;
        self.check_work_type_name(&name, None)?;

        self.counters.work_type += 1;
        let id = self.counters.work_type;
        self.work_types.push(WorkType {
            id,
            name: name.clone(),
            description: optional(new.description.as_deref()),
            active: true,
            created_at: today(),
            updated_at: None,
            deleted_at: None,
        });

        tracing::info!(id, name = %name, "added work type");
        self.record(AuditAction::Created, EntityKind::WorkType, Some(id), name);
        Ok(id)
    }

    /// Update a work type; a rename is carried over to vendors and orders
    pub fn update_work_type(&mut self, id: u32, patch: WorkTypePatch) -> Result<()> {
        let current = self.get_live::<WorkType>(id)?.clone();
        let mut updated = current.clone();

        if let Some(name) = &patch.name {
            updated.name = required("name", name)?;
            self.check_work_type_name(&updated.name, Some(id))?;
        }
        if let Some(description) = &patch.description {
            updated.description = optional(Some(description));
        }
        if let Some(active) = patch.active {
            updated.active = active;
        }
        updated.updated_at = Some(today());

        let renamed = updated.name != current.name;
        if renamed {
            for vendor in &mut self.vendors {
                for w in &mut vendor.work_types {
                    if same_name(w, &current.name) {
                        *w = updated.name.clone();
                    }
                }
            }
            for order in &mut self.orders {
                if same_name(&order.work_type, &current.name) {
                    order.work_type = updated.name.clone();
                }
            }
        }

        let summary = changed_fields(&[
            ("name", renamed),
            ("description", updated.description != current.description),
            ("active", updated.active != current.active),
        ]);
        let idx = self.position::<WorkType>(id)?;
        self.work_types[idx] = updated;

        tracing::info!(id, renamed, "updated work type");
        self.record(AuditAction::Updated, EntityKind::WorkType, Some(id), summary);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::store_with_basics;
    use crate::store::{NewOrder, Vendor};

    #[test]
    fn names_are_unique_ignoring_case() {
        let mut store = store_with_basics();
        let err = store
            .add_work_type(NewWorkType {
                name: "  trademark ".to_string(),
                description: None,
            })
            .unwrap_err();
        assert!(matches!(err, InnoventoryError::Duplicate { field: "name", .. }));
    }

    #[test]
    fn accented_names_resolve_and_clash_ignoring_case() {
        let mut store = store_with_basics();
        store
            .add_work_type(NewWorkType {
                name: "Évaluation".to_string(),
                description: None,
            })
            .unwrap();
        assert_eq!(store.resolve_work_type("évaluation").unwrap(), "Évaluation");
        let err = store
            .add_work_type(NewWorkType {
                name: "ÉVALUATION".to_string(),
                description: None,
            })
            .unwrap_err();
        assert!(matches!(err, InnoventoryError::Duplicate { field: "name", .. }));
    }

    #[test]
    fn rename_rewrites_references() {
        let mut store = store_with_basics();
        store
            .add_order(
                NewOrder {
                    client_id: 1,
                    vendor_id: Some(1),
                    work_type: "Patent Filing".to_string(),
                    description: None,
                    order_date: None,
                    due_date: None,
                    amount_to_client: 100.0,
                    amount_to_vendor: 60.0,
                },
                "ORD-{year}-{seq:04}",
                today(),
            )
            .unwrap();

        store
            .update_work_type(
                1,
                WorkTypePatch {
                    name: Some("Patent Prosecution".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(
            store.get::<Vendor>(1).unwrap().work_types,
            vec!["Patent Prosecution"]
        );
        assert_eq!(store.orders[0].work_type, "Patent Prosecution");
    }

    #[test]
    fn inactive_types_cannot_be_resolved() {
        let mut store = store_with_basics();
        store
            .update_work_type(
                2,
                WorkTypePatch {
                    active: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(store.resolve_work_type("trademark").is_err());
        assert_eq!(store.resolve_work_type("PATENT filing").unwrap(), "Patent Filing");
    }

    #[test]
    fn referenced_type_cannot_be_hard_deleted() {
        let mut store = store_with_basics();
        let err = store.hard_delete::<WorkType>(1).unwrap_err();
        assert!(matches!(err, InnoventoryError::InUse { .. }));
        assert!(err.to_string().contains("vendor #1"));

        store.hard_delete::<WorkType>(2).unwrap();
        assert_eq!(store.work_types.len(), 1);
    }
}
