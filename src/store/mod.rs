//! In-memory stores

pub mod history;

pub use history::{HistoryEntry, HistoryLog};
