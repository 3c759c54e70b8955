//! Writing table views to CSV, JSON or PDF files

use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{resolve_dir, Config};
use crate::error::Result;
use crate::pdf::generate_table_pdf;
use crate::store::EntityKind;
use crate::table::{CellValue, TableView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Pdf => "pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Fill the file name template ({entity}, {date}, {time}) and add the extension
pub fn export_filename(
    template: &str,
    kind: EntityKind,
    format: ExportFormat,
    now: NaiveDateTime,
) -> String {
    let stem = template
        .replace("{entity}", kind.plural())
        .replace("{date}", &now.format("%Y-%m-%d").to_string())
        .replace("{time}", &now.format("%H%M%S").to_string())
        .replace(['/', '\\'], "-");
    format!("{stem}.{}", format.extension())
}

/// Where an export goes when no --output is given
pub fn default_export_path(
    config: &Config,
    data_dir: &Path,
    kind: EntityKind,
    format: ExportFormat,
    now: NaiveDateTime,
) -> PathBuf {
    resolve_dir(&config.export.output_dir, data_dir).join(export_filename(
        &config.export.filename_format,
        kind,
        format,
        now,
    ))
}

/// Data handed to the PDF template
#[derive(Debug, Serialize)]
pub struct TablePdfData {
    pub title: String,
    pub company: String,
    pub generated: String,
    pub summary: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

fn write_csv(view: &TableView, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&view.headers)?;
    for row in &view.rows {
        writer.write_record(row.iter().map(CellValue::display))?;
    }
    writer.flush()?;
    Ok(())
}

/// Array of objects keyed by column key, keeping numbers as numbers
fn to_json(view: &TableView) -> serde_json::Value {
    let rows = view
        .rows
        .iter()
        .map(|row| {
            let object: serde_json::Map<String, serde_json::Value> = view
                .keys
                .iter()
                .zip(row)
                .map(|(key, cell)| (key.to_string(), cell.to_json()))
                .collect();
            serde_json::Value::Object(object)
        })
        .collect();
    serde_json::Value::Array(rows)
}

fn write_json(view: &TableView, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(&to_json(view))?;
    fs::write(path, content)?;
    Ok(())
}

/// Write a view in the requested format, creating parent directories
pub fn export_view(
    view: &TableView,
    kind: EntityKind,
    format: ExportFormat,
    path: &Path,
    company: &str,
    now: NaiveDateTime,
) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    match format {
        ExportFormat::Csv => write_csv(view, path)?,
        ExportFormat::Json => write_json(view, path)?,
        ExportFormat::Pdf => {
            let data = TablePdfData {
                title: kind.plural().replace('-', " ").to_uppercase(),
                company: company.to_string(),
                generated: now.format("%B %d, %Y %H:%M").to_string(),
                summary: view.summary(),
                headers: view.headers.iter().map(|h| h.to_string()).collect(),
                rows: view
                    .rows
                    .iter()
                    .map(|r| r.iter().map(CellValue::display).collect())
                    .collect(),
            };
            generate_table_pdf(&data, path)?;
        }
    }

    tracing::info!(
        entity = %kind,
        format = %format,
        rows = view.rows.len(),
        path = %path.display(),
        "exported"
    );
    Ok(())
}
