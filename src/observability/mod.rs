//! Observability for the restore core

mod logger;

pub use logger::{Logger, Severity};
