//! Client-side table view over entity lists
//!
//! Every list page and every export runs through [`apply`]: per-column
//! filters, a global search, a stable sort, offset pagination and column
//! selection. The input slice is only read; the result is a [`TableView`]
//! of display cells.

use chrono::NaiveDate;
use std::cmp::Ordering;
use tabled::{builder::Builder, settings::Style};

use crate::error::{InnoventoryError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Number,
    Date,
}

/// Static description of one column an entity exposes
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub key: &'static str,
    pub header: &'static str,
    pub kind: ColumnKind,
    /// Shown when no explicit column list is requested
    pub default_visible: bool,
}

impl Column {
    pub const fn text(key: &'static str, header: &'static str) -> Self {
        Self {
            key,
            header,
            kind: ColumnKind::Text,
            default_visible: true,
        }
    }

    pub const fn number(key: &'static str, header: &'static str) -> Self {
        Self {
            key,
            header,
            kind: ColumnKind::Number,
            default_visible: true,
        }
    }

    pub const fn date(key: &'static str, header: &'static str) -> Self {
        Self {
            key,
            header,
            kind: ColumnKind::Date,
            default_visible: true,
        }
    }

    pub const fn hidden(mut self) -> Self {
        self.default_visible = false;
        self
    }
}

/// A typed cell, so sorting can be numeric or chronological where it matters
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Int(i64),
    Money(f64),
    Date(NaiveDate),
    Empty,
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s)
        }
    }

    pub fn opt_text(s: Option<&str>) -> Self {
        s.map(CellValue::text).unwrap_or(CellValue::Empty)
    }

    pub fn list(items: &[String]) -> Self {
        CellValue::text(items.join(", "))
    }

    pub fn display(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Int(n) => n.to_string(),
            CellValue::Money(v) => format!("{v:.2}"),
            CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            CellValue::Empty => String::new(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CellValue::Text(s) => serde_json::Value::String(s.clone()),
            CellValue::Int(n) => serde_json::Value::from(*n),
            CellValue::Money(v) => serde_json::Value::from((v * 100.0).round() / 100.0),
            CellValue::Date(d) => serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
            CellValue::Empty => serde_json::Value::Null,
        }
    }

    fn contains_ci(&self, needle_lower: &str) -> bool {
        self.display().to_lowercase().contains(needle_lower)
    }

    /// Ordering used by sort: empty first, then by the natural order of the kind
    fn sort_cmp(&self, other: &CellValue) -> Ordering {
        use CellValue::*;
        match (self, other) {
            (Empty, Empty) => Ordering::Equal,
            (Empty, _) => Ordering::Less,
            (_, Empty) => Ordering::Greater,
            (Int(a), Int(b)) => a.cmp(b),
            (Money(a), Money(b)) => a.total_cmp(b),
            (Int(a), Money(b)) => (*a as f64).total_cmp(b),
            (Money(a), Int(b)) => a.total_cmp(&(*b as f64)),
            (Date(a), Date(b)) => a.cmp(b),
            (Text(a), Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
            (a, b) => a.display().to_lowercase().cmp(&b.display().to_lowercase()),
        }
    }
}

/// Anything that can be shown as a table row
pub trait Record {
    fn columns() -> &'static [Column];

    fn cell(&self, key: &str) -> CellValue;
}

impl<R: Record> Record for &R {
    fn columns() -> &'static [Column] {
        R::columns()
    }

    fn cell(&self, key: &str) -> CellValue {
        (**self).cell(key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggle(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub column: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Desc,
        }
    }

    /// Sorting the same column again flips direction; a new column starts ascending
    pub fn toggled(current: Option<&Sort>, column: &str) -> Sort {
        match current {
            Some(s) if s.column == column => Sort {
                column: s.column.clone(),
                direction: s.direction.toggle(),
            },
            _ => Sort::asc(column),
        }
    }
}

/// Case-insensitive substring match on one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub needle: String,
}

impl Filter {
    /// Parse "column=value"
    pub fn parse(input: &str) -> Result<Self> {
        let (column, needle) = input
            .split_once('=')
            .ok_or_else(|| InnoventoryError::InvalidFilter(input.to_string()))?;
        let column = column.trim();
        if column.is_empty() {
            return Err(InnoventoryError::InvalidFilter(input.to_string()));
        }
        Ok(Self {
            column: column.to_string(),
            needle: needle.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// 1-based
    pub number: usize,
    pub size: usize,
}

#[derive(Debug, Clone, Default)]
pub struct TableQuery {
    pub search: Option<String>,
    pub filters: Vec<Filter>,
    pub sort: Option<Sort>,
    pub page: Option<Page>,
    pub columns: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct TableView {
    pub keys: Vec<&'static str>,
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<CellValue>>,
    /// Records handed to the query
    pub total: usize,
    /// Records left after filtering and search
    pub matching: usize,
    /// Position of the first row of this page within the matching records
    pub offset: usize,
    pub page: Option<Page>,
}

impl TableView {
    pub fn page_count(&self) -> usize {
        match self.page {
            Some(p) if p.size > 0 => self.matching.div_ceil(p.size).max(1),
            _ => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// "Showing 1-10 of 23 (page 1/3)"
    pub fn summary(&self) -> String {
        if self.rows.is_empty() {
            return format!("Showing 0 of {}", self.matching);
        }
        let first = self.offset + 1;
        let last = self.offset + self.rows.len();
        let mut out = format!("Showing {first}-{last} of {}", self.matching);
        if self.matching != self.total {
            out.push_str(&format!(" (filtered from {})", self.total));
        }
        if let Some(page) = self.page {
            out.push_str(&format!(" (page {}/{})", page.number, self.page_count()));
        }
        out
    }

    /// Render as a rounded box table
    pub fn render(&self) -> String {
        let mut builder = Builder::default();
        builder.push_record(self.headers.iter().map(|h| h.to_string()));
        for row in &self.rows {
            builder.push_record(row.iter().map(CellValue::display));
        }
        builder.build().with(Style::rounded()).to_string()
    }
}

fn available_keys<R: Record>() -> String {
    R::columns()
        .iter()
        .map(|c| c.key)
        .collect::<Vec<_>>()
        .join(", ")
}

fn find_column<R: Record>(key: &str) -> Result<&'static Column> {
    R::columns()
        .iter()
        .find(|c| c.key.eq_ignore_ascii_case(key))
        .ok_or_else(|| InnoventoryError::UnknownColumn {
            column: key.to_string(),
            available: available_keys::<R>(),
        })
}

/// Run a query over a slice of records
pub fn apply<R: Record>(records: &[R], query: &TableQuery) -> Result<TableView> {
    let visible: Vec<&'static Column> = match &query.columns {
        Some(keys) if !keys.is_empty() => keys
            .iter()
            .map(|k| find_column::<R>(k.trim()))
            .collect::<Result<_>>()?,
        _ => R::columns().iter().filter(|c| c.default_visible).collect(),
    };

    let filters: Vec<(&'static str, String)> = query
        .filters
        .iter()
        .map(|f| -> Result<(&'static str, String)> {
            Ok((find_column::<R>(&f.column)?.key, f.needle.to_lowercase()))
        })
        .collect::<Result<_>>()?;

    let sort = query
        .sort
        .as_ref()
        .map(|s| -> Result<(&'static str, SortDirection)> {
            Ok((find_column::<R>(&s.column)?.key, s.direction))
        })
        .transpose()?;

    if let Some(page) = query.page {
        if page.number == 0 {
            return Err(InnoventoryError::InvalidPage("pages start at 1".to_string()));
        }
        if page.size == 0 {
            return Err(InnoventoryError::InvalidPage(
                "page size must be at least 1".to_string(),
            ));
        }
    }

    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let mut matched: Vec<&R> = records
        .iter()
        .filter(|r| {
            filters
                .iter()
                .all(|(key, needle)| r.cell(key).contains_ci(needle))
        })
        .filter(|r| match &search {
            Some(needle) => visible.iter().any(|c| r.cell(c.key).contains_ci(needle)),
            None => true,
        })
        .collect();

    if let Some((key, direction)) = sort {
        // sort_by is stable, so equal keys keep their input order in both directions
        matched.sort_by(|a, b| {
            let ord = a.cell(key).sort_cmp(&b.cell(key));
            match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });
    }

    let matching = matched.len();
    let (offset, page_rows): (usize, &[&R]) = match query.page {
        Some(page) => {
            let start = (page.number - 1).saturating_mul(page.size);
            if start >= matching {
                (start, &[])
            } else {
                let end = (start + page.size).min(matching);
                (start, &matched[start..end])
            }
        }
        None => (0, &matched[..]),
    };

    tracing::debug!(
        total = records.len(),
        matching,
        shown = page_rows.len(),
        "applied table query"
    );

    Ok(TableView {
        keys: visible.iter().map(|c| c.key).collect(),
        headers: visible.iter().map(|c| c.header).collect(),
        rows: page_rows
            .iter()
            .map(|r| visible.iter().map(|c| r.cell(c.key)).collect())
            .collect(),
        total: records.len(),
        matching,
        offset,
        page: query.page,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: i64,
        name: &'static str,
        city: &'static str,
        amount: f64,
    }

    static ROW_COLUMNS: [Column; 4] = [
        Column::number("id", "ID"),
        Column::text("name", "NAME"),
        Column::text("city", "CITY"),
        Column::number("amount", "AMOUNT").hidden(),
    ];

    impl Record for Row {
        fn columns() -> &'static [Column] {
            &ROW_COLUMNS
        }

        fn cell(&self, key: &str) -> CellValue {
            match key {
                "id" => CellValue::Int(self.id),
                "name" => CellValue::text(self.name),
                "city" => CellValue::text(self.city),
                "amount" => CellValue::Money(self.amount),
                _ => CellValue::Empty,
            }
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { id: 1, name: "beta", city: "Pune", amount: 20.0 },
            Row { id: 2, name: "Alpha", city: "Mumbai", amount: 5.0 },
            Row { id: 3, name: "gamma", city: "pune", amount: 100.0 },
            Row { id: 4, name: "delta", city: "", amount: 5.0 },
        ]
    }

    fn ids(view: &TableView) -> Vec<String> {
        view.rows.iter().map(|r| r[0].display()).collect()
    }

    #[test]
    fn default_columns_skip_hidden() {
        let view = apply(&rows(), &TableQuery::default()).unwrap();
        assert_eq!(view.keys, vec!["id", "name", "city"]);
        assert_eq!(view.rows.len(), 4);
    }

    #[test]
    fn filter_is_case_insensitive_substring() {
        let query = TableQuery {
            filters: vec![Filter::parse("city=PUN").unwrap()],
            ..Default::default()
        };
        let view = apply(&rows(), &query).unwrap();
        assert_eq!(ids(&view), vec!["1", "3"]);
        assert_eq!(view.matching, 2);
        assert_eq!(view.total, 4);
    }

    #[test]
    fn filter_may_target_hidden_column() {
        let query = TableQuery {
            filters: vec![Filter::parse("amount=100").unwrap()],
            ..Default::default()
        };
        assert_eq!(ids(&apply(&rows(), &query).unwrap()), vec!["3"]);
    }

    #[test]
    fn search_covers_visible_columns_only() {
        let query = TableQuery {
            search: Some("mum".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&apply(&rows(), &query).unwrap()), vec!["2"]);

        let hidden = TableQuery {
            search: Some("100".to_string()),
            ..Default::default()
        };
        assert!(apply(&rows(), &hidden).unwrap().is_empty());
    }

    #[test]
    fn text_sort_ignores_case() {
        let query = TableQuery {
            sort: Some(Sort::asc("name")),
            ..Default::default()
        };
        assert_eq!(ids(&apply(&rows(), &query).unwrap()), vec!["2", "1", "4", "3"]);
    }

    #[test]
    fn numeric_sort_is_stable_in_both_directions() {
        let columns = Some(vec!["id".to_string(), "amount".to_string()]);
        let asc = TableQuery {
            sort: Some(Sort::asc("amount")),
            columns: columns.clone(),
            ..Default::default()
        };
        assert_eq!(ids(&apply(&rows(), &asc).unwrap()), vec!["2", "4", "1", "3"]);

        let desc = TableQuery {
            sort: Some(Sort::desc("amount")),
            columns,
            ..Default::default()
        };
        assert_eq!(ids(&apply(&rows(), &desc).unwrap()), vec!["3", "1", "2", "4"]);
    }

    #[test]
    fn empty_cells_sort_first() {
        let query = TableQuery {
            sort: Some(Sort::asc("city")),
            ..Default::default()
        };
        assert_eq!(ids(&apply(&rows(), &query).unwrap())[0], "4");
    }

    #[test]
    fn sorting_twice_is_idempotent() {
        let query = TableQuery {
            sort: Some(Sort::asc("city")),
            ..Default::default()
        };
        let first = apply(&rows(), &query).unwrap();
        let second = apply(&rows(), &query).unwrap();
        assert_eq!(first.rows, second.rows);
    }

    #[test]
    fn toggling_sort_flips_direction() {
        let first = Sort::toggled(None, "name");
        assert_eq!(first.direction, SortDirection::Asc);
        let second = Sort::toggled(Some(&first), "name");
        assert_eq!(second.direction, SortDirection::Desc);
        let other = Sort::toggled(Some(&second), "city");
        assert_eq!(other, Sort::asc("city"));
    }

    #[test]
    fn pagination_slices_and_reports_position() {
        let query = TableQuery {
            page: Some(Page { number: 2, size: 3 }),
            ..Default::default()
        };
        let view = apply(&rows(), &query).unwrap();
        assert_eq!(ids(&view), vec!["4"]);
        assert_eq!(view.page_count(), 2);
        assert_eq!(view.summary(), "Showing 4-4 of 4 (page 2/2)");
    }

    #[test]
    fn page_past_end_is_empty() {
        let query = TableQuery {
            page: Some(Page { number: 9, size: 3 }),
            ..Default::default()
        };
        let view = apply(&rows(), &query).unwrap();
        assert!(view.is_empty());
        assert_eq!(view.matching, 4);
    }

    #[test]
    fn zero_page_is_rejected() {
        let query = TableQuery {
            page: Some(Page { number: 0, size: 3 }),
            ..Default::default()
        };
        assert!(matches!(
            apply(&rows(), &query),
            Err(InnoventoryError::InvalidPage(_))
        ));
    }

    #[test]
    fn unknown_column_lists_available_keys() {
        let query = TableQuery {
            sort: Some(Sort::asc("nope")),
            ..Default::default()
        };
        match apply(&rows(), &query) {
            Err(InnoventoryError::UnknownColumn { column, available }) => {
                assert_eq!(column, "nope");
                assert_eq!(available, "id, name, city, amount");
            }
            other => panic!("expected UnknownColumn, got {other:?}"),
        }
    }

    #[test]
    fn input_is_left_untouched() {
        let input = rows();
        let query = TableQuery {
            sort: Some(Sort::desc("id")),
            filters: vec![Filter::parse("name=a").unwrap()],
            ..Default::default()
        };
        apply(&input, &query).unwrap();
        assert_eq!(input, rows());
    }

    #[test]
    fn filter_requires_equals_sign() {
        assert!(Filter::parse("city").is_err());
        assert!(Filter::parse("=pune").is_err());
        assert_eq!(
            Filter::parse("city = Pune").unwrap(),
            Filter {
                column: "city".to_string(),
                needle: "Pune".to_string()
            }
        );
    }

    #[test]
    fn render_includes_headers_and_cells() {
        let view = apply(&rows(), &TableQuery::default()).unwrap();
        let out = view.render();
        assert!(out.contains("NAME"));
        assert!(out.contains("Mumbai"));
        assert!(out.starts_with('╭'));
    }

    #[test]
    fn money_json_is_rounded_to_cents() {
        assert_eq!(CellValue::Money(0.1 + 0.2).to_json(), serde_json::json!(0.3));
        assert_eq!(
            CellValue::Money(1000.5 - 400.4).to_json(),
            serde_json::json!(600.1)
        );
        assert_eq!(CellValue::Money(12.0).to_json(), serde_json::json!(12.0));
    }
}
