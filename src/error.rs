//! Typed error taxonomy for the collection engine. Every variant is a
//! recoverable, caller-facing condition; nothing here should abort the
//! process. The UI layer wraps these in `anyhow` context chains where it
//! needs to add its own framing.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LibraryError {
    /// A create/update arrived with a title that is empty after trimming.
    #[error("Book title is required.")]
    EmptyTitle,

    /// An update/delete referenced an id the collection does not hold. This
    /// signals a caller/state desync and is surfaced rather than swallowed.
    #[error("Book not found.")]
    BookNotFound { id: String },

    /// The stored blob exists but could not be read or parsed. The collection
    /// only falls back to empty after this has been reported.
    #[error("Could not read the saved collection: {0:#}")]
    StoreRead(anyhow::Error),

    /// A save failed. The in-memory mutation stays applied; the most recent
    /// change is lost if the process exits before a later save succeeds.
    #[error("Could not save the collection: {0:#}")]
    StoreWrite(anyhow::Error),

    /// A save was attempted before the one-shot hydration completed. Guards
    /// against wiping the durable copy with a still-empty collection.
    #[error("Collection is not loaded yet.")]
    NotHydrated,
}
