pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod pdf;
pub mod store;
pub mod table;
pub mod upload;

pub use config::{Config, GlobalConfig};
pub use error::{InnoventoryError, Result};
pub use store::{Client, EntityKind, Order, Store, SubAdmin, Vendor, WorkType};
pub use table::{apply, Record, TableQuery, TableView};
