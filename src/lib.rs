pub mod severity;
pub mod grammar;
pub mod multiline;
pub mod parser;
pub mod temporal;
pub mod query;
pub mod priority;
pub mod ai;
pub mod realtime;
pub mod source;
pub mod config;
pub mod error;

pub use error::{Result, TriageError};
