pub mod config;
pub mod error;
pub mod market;
pub mod notify;
pub mod types;
pub mod universe;

pub use config::Config;
pub use error::{Error, Result};
pub use market::MarketData;
pub use notify::NotificationSink;
pub use types::*;
