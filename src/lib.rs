#![doc = include_str!("../README.md")]
pub mod auth;
pub mod error;
pub mod money;
pub mod render;
pub mod shell;
pub mod stats;
pub mod table;

pub use auth::{Credentials, Session};
pub use error::{Error, Result};
pub use money::Money;
pub use shell::{Options, Shell};
pub use stats::Summary;
pub use table::{SalesRecord, SalesTable, DAYS};
