//! CLI commands implementation

pub mod chat;
pub mod ingest;
pub mod search;
pub mod status;

#[cfg(test)]
pub(crate) mod testing;

pub use chat::*;
pub use ingest::*;
pub use search::*;
pub use status::*;
