use chrono::{DateTime, Datelike, NaiveDate, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::validate;
use super::{
    changed_fields, today, Attachable, AuditAction, Client, Entity, EntityKind, Store, Vendor,
};
use crate::error::{InnoventoryError, Result};
use crate::table::{CellValue, Column, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::InProgress,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "pending"),
            OrderStatus::InProgress => write!(f, "in-progress"),
            OrderStatus::Completed => write!(f, "completed"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Order {
    pub id: u32,
    /// Formatted reference such as ORD-2026-0001
    pub number: String,
    pub client_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<u32>,
    pub work_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub order_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub amount_to_client: f64,
    pub amount_to_vendor: f64,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub files: Vec<String>,
    pub created_at: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn margin(&self) -> f64 {
        self.amount_to_client - self.amount_to_vendor
    }
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub client_id: u32,
    pub vendor_id: Option<u32>,
    pub work_type: String,
    pub description: Option<String>,
    /// Defaults to today
    pub order_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub amount_to_client: f64,
    pub amount_to_vendor: f64,
}

#[derive(Debug, Clone, Default)]
pub struct OrderPatch {
    pub client_id: Option<u32>,
    /// `Some(None)` unassigns the vendor
    pub vendor_id: Option<Option<u32>>,
    pub work_type: Option<String>,
    pub description: Option<String>,
    pub order_date: Option<NaiveDate>,
    /// `Some(None)` clears the due date
    pub due_date: Option<Option<NaiveDate>>,
    pub amount_to_client: Option<f64>,
    pub amount_to_vendor: Option<f64>,
    pub status: Option<OrderStatus>,
}

/// Fill an order number template: {year}, {seq:03}, {seq:04}, {seq:05}
pub fn format_order_number(format: &str, year: i32, seq: u32) -> String {
    format
        .replace("{year}", &year.to_string())
        .replace("{seq:04}", &format!("{:04}", seq))
        .replace("{seq:05}", &format!("{:05}", seq))
        .replace("{seq:03}", &format!("{:03}", seq))
}

/// An order joined with its client and vendor names, for tables and exports
pub struct OrderRow<'a> {
    pub order: &'a Order,
    pub client: &'a str,
    pub vendor: &'a str,
}

static COLUMNS: [Column; 14] = [
    Column::number("id", "ID").hidden(),
    Column::text("number", "NUMBER"),
    Column::date("date", "DATE"),
    Column::text("client", "CLIENT"),
    Column::text("vendor", "VENDOR"),
    Column::text("work", "TYPE OF WORK"),
    Column::text("description", "DESCRIPTION").hidden(),
    Column::date("due", "DUE").hidden(),
    Column::text("status", "STATUS"),
    Column::number("client_amount", "CLIENT AMT"),
    Column::number("vendor_amount", "VENDOR AMT"),
    Column::number("margin", "MARGIN"),
    Column::number("files", "FILES").hidden(),
    Column::date("created", "CREATED").hidden(),
];

impl Record for OrderRow<'_> {
    fn columns() -> &'static [Column] {
        &COLUMNS
    }

    fn cell(&self, key: &str) -> CellValue {
        let o = self.order;
        match key {
            "id" => CellValue::Int(o.id.into()),
            "number" => CellValue::text(&o.number),
            "date" => CellValue::Date(o.order_date),
            "client" => CellValue::text(self.client),
            "vendor" => CellValue::text(self.vendor),
            "work" => CellValue::text(&o.work_type),
            "description" => CellValue::opt_text(o.description.as_deref()),
            "due" => o.due_date.map(CellValue::Date).unwrap_or(CellValue::Empty),
            "status" if o.deleted_at.is_some() => CellValue::text("deleted"),
            "status" => CellValue::text(o.status.to_string()),
            "client_amount" => CellValue::Money(o.amount_to_client),
            "vendor_amount" => CellValue::Money(o.amount_to_vendor),
            "margin" => CellValue::Money(o.margin()),
            "files" => CellValue::Int(o.files.len() as i64),
            "created" => CellValue::Date(o.created_at),
            _ => CellValue::Empty,
        }
    }
}

impl Record for Order {
    fn columns() -> &'static [Column] {
        &COLUMNS
    }

    fn cell(&self, key: &str) -> CellValue {
        let client = self.client_id.to_string();
        let vendor = self.vendor_id.map(|v| v.to_string()).unwrap_or_default();
        OrderRow {
            order: self,
            client: &client,
            vendor: &vendor,
        }
        .cell(key)
    }
}

impl Entity for Order {
    const KIND: EntityKind = EntityKind::Order;

    fn id(&self) -> u32 {
        self.id
    }

    fn label(&self) -> String {
        self.number.clone()
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>) {
        self.deleted_at = at;
    }

    fn collection(store: &Store) -> &Vec<Self> {
        &store.orders
    }

    fn collection_mut(store: &mut Store) -> &mut Vec<Self> {
        &mut store.orders
    }
}

impl Attachable for Order {
    fn files(&self) -> &[String] {
        &self.files
    }

    fn files_mut(&mut self) -> &mut Vec<String> {
        &mut self.files
    }
}

fn check_dates(order_date: NaiveDate, due_date: Option<NaiveDate>) -> Result<()> {
    if let Some(due) = due_date {
        if due < order_date {
            return Err(InnoventoryError::validation(
                "due_date",
                format!("{due} is before the order date {order_date}"),
            ));
        }
    }
    Ok(())
}

impl Store {
    /// Only formats carrying {year} restart the sequence; others keep counting
    fn next_order_seq(&self, number_format: &str, year: i32) -> u32 {
        if self.counters.order_year != year && number_format.contains("{year}") {
            1
        } else {
            self.counters.order_seq + 1
        }
    }

    /// The number the next order would get, without claiming it
    pub fn peek_order_number(&self, number_format: &str, today: NaiveDate) -> String {
        let year = today.year();
        format_order_number(number_format, year, self.next_order_seq(number_format, year))
    }

    /// Claim the next order number; the sequence restarts when the year changes
    fn next_order_number(&mut self, number_format: &str, today: NaiveDate) -> Result<String> {
        let year = today.year();
        let seq = self.next_order_seq(number_format, year);
        let number = format_order_number(number_format, year, seq);
        if self.orders.iter().any(|o| o.number.eq_ignore_ascii_case(&number)) {
            return Err(InnoventoryError::Duplicate {
                entity: EntityKind::Order.title(),
                field: "number",
                value: number,
            });
        }
        self.counters.order_seq = seq;
        self.counters.order_year = year;
        Ok(number)
    }

    /// Resolve an order by its formatted number, falling back to the numeric id
    pub fn find_order(&self, reference: &str) -> Result<&Order> {
        let reference = reference.trim();
        let matches: Vec<&Order> = self
            .orders
            .iter()
            .filter(|o| o.number.eq_ignore_ascii_case(reference))
            .collect();
        match matches.as_slice() {
            [order] => return Ok(*order),
            [] => {}
            many => {
                return Err(InnoventoryError::Ambiguous {
                    entity: EntityKind::Order.title(),
                    reference: reference.to_string(),
                    matches: many
                        .iter()
                        .map(|o| format!("#{}", o.id))
                        .collect::<Vec<_>>()
                        .join(", "),
                })
            }
        }
        match reference.parse::<u32>() {
            Ok(id) => self.get::<Order>(id),
            Err(_) => Err(InnoventoryError::NotFound {
                entity: EntityKind::Order.title(),
                id: reference.to_string(),
            }),
        }
    }

    /// Join orders with client and vendor names for display
    pub fn order_rows<'a>(&'a self, orders: &[&'a Order]) -> Vec<OrderRow<'a>> {
        orders
            .iter()
            .map(|&o| OrderRow {
                order: o,
                client: self
                    .clients
                    .iter()
                    .find(|c| c.id == o.client_id)
                    .map(|c| c.company_name.as_str())
                    .unwrap_or("?"),
                vendor: o
                    .vendor_id
                    .and_then(|vid| self.vendors.iter().find(|v| v.id == vid))
                    .map(|v| v.company_name.as_str())
                    .unwrap_or(""),
            })
            .collect()
    }

    pub fn add_order(
        &mut self,
        new: NewOrder,
        number_format: &str,
        today: NaiveDate,
    ) -> Result<u32> {
        self.get_live::<Client>(new.client_id)?;
        if let Some(vendor_id) = new.vendor_id {
            self.get_live::<Vendor>(vendor_id)?;
        }
        let work_type = self.resolve_work_type(&new.work_type)?;
        let amount_to_client = validate::amount("amount_to_client", new.amount_to_client)?;
        let amount_to_vendor = validate::amount("amount_to_vendor", new.amount_to_vendor)?;
        let order_date = new.order_date.unwrap_or(today);
        check_dates(order_date, new.due_date)?;

        let number = self.next_order_number(number_format, today)?;
        self.counters.order += 1;
        let id = self.counters.order;
        self.orders.push(Order {
            id,
            number: number.clone(),
            client_id: new.client_id,
            vendor_id: new.vendor_id,
            work_type,
            description: validate::optional(new.description.as_deref()),
            order_date,
            due_date: new.due_date,
            amount_to_client,
            amount_to_vendor,
            status: OrderStatus::Pending,
            files: Vec::new(),
            created_at: today,
            updated_at: None,
            deleted_at: None,
        });

        tracing::info!(id, number = %number, client = new.client_id, "added order");
        self.record(AuditAction::Created, EntityKind::Order, Some(id), number);
        Ok(id)
    }

    pub fn update_order(&mut self, id: u32, patch: OrderPatch) -> Result<()> {
        let current = self.get_live::<Order>(id)?.clone();
        let mut updated = current.clone();

        if let Some(client_id) = patch.client_id {
            if client_id != current.client_id {
                self.get_live::<Client>(client_id)?;
            }
            updated.client_id = client_id;
        }
        if let Some(vendor_id) = patch.vendor_id {
            if let Some(vid) = vendor_id {
                if Some(vid) != current.vendor_id {
                    self.get_live::<Vendor>(vid)?;
                }
            }
            updated.vendor_id = vendor_id;
        }
        if let Some(work_type) = &patch.work_type {
            updated.work_type = self.resolve_work_type(work_type)?;
        }
        if let Some(description) = &patch.description {
            updated.description = validate::optional(Some(description));
        }
        if let Some(date) = patch.order_date {
            updated.order_date = date;
        }
        if let Some(due) = patch.due_date {
            updated.due_date = due;
        }
        if let Some(v) = patch.amount_to_client {
            updated.amount_to_client = validate::amount("amount_to_client", v)?;
        }
        if let Some(v) = patch.amount_to_vendor {
            updated.amount_to_vendor = validate::amount("amount_to_vendor", v)?;
        }
        if let Some(status) = patch.status {
            updated.status = status;
        }
        check_dates(updated.order_date, updated.due_date)?;
        updated.updated_at = Some(today());

        let summary = changed_fields(&[
            ("client", updated.client_id != current.client_id),
            ("vendor", updated.vendor_id != current.vendor_id),
            ("work_type", updated.work_type != current.work_type),
            ("description", updated.description != current.description),
            ("order_date", updated.order_date != current.order_date),
            ("due_date", updated.due_date != current.due_date),
            (
                "amount_to_client",
                updated.amount_to_client != current.amount_to_client,
            ),
            (
                "amount_to_vendor",
                updated.amount_to_vendor != current.amount_to_vendor,
            ),
            ("status", updated.status != current.status),
        ]);
        let idx = self.position::<Order>(id)?;
        self.orders[idx] = updated;

        tracing::info!(id, %summary, "updated order");
        self.record(AuditAction::Updated, EntityKind::Order, Some(id), summary);
        Ok(())
    }
}
