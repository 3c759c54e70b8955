use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::EntityKind;
use crate::table::{CellValue, Column, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuditAction {
    Created,
    Updated,
    Deleted,
    Restored,
    Attached,
    Detached,
    Exported,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuditAction::Created => "created",
            AuditAction::Updated => "updated",
            AuditAction::Deleted => "deleted",
            AuditAction::Restored => "restored",
            AuditAction::Attached => "attached",
            AuditAction::Detached => "detached",
            AuditAction::Exported => "exported",
        };
        f.write_str(s)
    }
}

/// One line of the change log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub at: DateTime<Utc>,
    pub action: AuditAction,
    pub entity: EntityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<u32>,
    pub summary: String,
}

static COLUMNS: [Column; 5] = [
    Column::text("at", "WHEN"),
    Column::text("action", "ACTION"),
    Column::text("entity", "ENTITY"),
    Column::number("id", "ID"),
    Column::text("summary", "SUMMARY"),
];

impl Record for AuditEntry {
    fn columns() -> &'static [Column] {
        &COLUMNS
    }

    fn cell(&self, key: &str) -> CellValue {
        match key {
            "at" => CellValue::text(self.at.format("%Y-%m-%d %H:%M:%S").to_string()),
            "action" => CellValue::text(self.action.to_string()),
            "entity" => CellValue::text(self.entity.as_str()),
            "id" => self
                .entity_id
                .map(|id| CellValue::Int(id.into()))
                .unwrap_or(CellValue::Empty),
            "summary" => CellValue::text(&self.summary),
            _ => CellValue::Empty,
        }
    }
}
