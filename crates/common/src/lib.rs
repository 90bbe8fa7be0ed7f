pub mod config;
pub mod error;
pub mod timeseries;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use timeseries::{PricePoint, PriceSource};
pub use types::*;
