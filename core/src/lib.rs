pub mod db;
pub mod diagnostics;
pub mod error;
pub mod filter;
pub mod models;
pub mod notify;
pub mod query;
pub mod seed;
pub mod store;
pub mod workflow;
mod migrations;

pub use db::{open_support_db, SupportDb};
pub use error::CoreError;
