//! Core library surface for the reading-log TUI application.
//!
//! The collection engine (models, library, view derivation, persistence
//! bridge) lives here so the binary and the tests consume the same API. The
//! re-exports below are the pieces `main.rs` wires together.
pub mod error;
pub mod library;
pub mod models;
pub mod store;
pub mod ui;
pub mod view;

/// The error taxonomy every engine operation reports through.
pub use error::LibraryError;

/// The collection store: the one owner of the in-memory book list.
pub use library::Library;

/// The primary domain types other layers manipulate.
pub use models::{Book, BookDraft, Status};

/// Persistence: the durable store contract, the bridge, and the save worker.
pub use store::{SaveWorker, SqliteStore, StoreBridge};

/// Pure view derivation consumed by the UI on every render.
pub use view::{build_view, BookListView, SortOption, StatusFilter, ViewQuery};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
