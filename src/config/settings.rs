use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub company: Company,
    #[serde(default)]
    pub orders: OrderSettings,
    #[serde(default)]
    pub uploads: UploadSettings,
    #[serde(default)]
    pub export: ExportSettings,
    #[serde(default)]
    pub table: TableSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Company {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Default for Company {
    fn default() -> Self {
        Self {
            name: "Innoventory".to_string(),
            email: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OrderSettings {
    pub number_format: String,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

impl Default for OrderSettings {
    fn default() -> Self {
        Self {
            number_format: "ORD-{year}-{seq:04}".to_string(),
            currency_symbol: default_currency_symbol(),
        }
    }
}

fn default_currency_symbol() -> String {
    "₹".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UploadSettings {
    #[serde(default = "default_max_size_mb")]
    pub max_size_mb: u64,
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            max_size_mb: default_max_size_mb(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

impl UploadSettings {
    pub fn max_bytes(&self) -> u64 {
        self.max_size_mb.saturating_mul(1024 * 1024)
    }
}

fn default_max_size_mb() -> u64 {
    10
}

fn default_allowed_extensions() -> Vec<String> {
    ["pdf", "png", "jpg", "jpeg", "doc", "docx", "xls", "xlsx", "csv", "txt"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExportSettings {
    #[serde(default = "default_export_dir")]
    pub output_dir: String,
    #[serde(default = "default_filename_format")]
    pub filename_format: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            output_dir: default_export_dir(),
            filename_format: default_filename_format(),
        }
    }
}

fn default_export_dir() -> String {
    "exports".to_string()
}

fn default_filename_format() -> String {
    "{entity}_{date}".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TableSettings {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> usize {
    10
}

/// Points `innoventory` at a data directory without passing `-C` every time
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct GlobalConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
}
