pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, ScanBudget};
pub use error::FactCheckError;
pub use types::*;
