pub mod analyzers;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod fetch;
pub mod model;
pub mod output;
pub mod parser;
pub mod report;
pub mod views;

pub use dashboard::Dashboard;
pub use error::{Error, Result};
