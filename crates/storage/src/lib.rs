#![forbid(unsafe_code)]

pub mod codec;
pub mod keys;
pub mod repository;
pub mod sqlite;

pub use codec::StorageCodec;
pub use repository::{InMemoryStore, KeyValueStore, Storage, StorageError};
