//! Persistence module split across logical submodules.

mod bridge;
mod kv;

pub use bridge::{SaveQueue, SaveWorker, StoreBridge, BOOKS_KEY};
pub use kv::{data_dir, BlobStore, MemoryStore, SqliteStore, DB_FILE_NAME};
