// src/records/mod.rs
pub mod merge;
pub mod models;

// Re-export key record types for convenience
pub use merge::{find_by_domain, merge_by_domain, merge_by_key};
pub use models::BankRecord;
