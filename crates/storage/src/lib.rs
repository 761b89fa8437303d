#![forbid(unsafe_code)]

pub mod records;
pub mod repository;
pub mod sqlite;

pub use records::{InitReport, RecordName, RecordStore};
pub use repository::{InMemoryStore, KeyValueStore, Storage, StorageError};
