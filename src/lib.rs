pub mod component;
pub mod config;
pub mod descriptor;
pub mod editor;
pub mod error;
pub mod host;
pub mod request;
pub mod service;
pub mod table;
pub mod util;

pub use config::{ConsoleConfig, PropertyTableConfig};
pub use error::{PropertyTableError, Result};
pub use table::PropertyTable;
