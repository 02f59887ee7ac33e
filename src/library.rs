//! The collection store: exclusive owner of the in-memory book list. All
//! writes go through `add_book`/`update_book`/`delete_book`, which validate
//! and normalize the draft, apply the change synchronously, and enqueue
//! exactly one save snapshot per committed mutation. Rejected mutations
//! change nothing at all.
//!
//! Views observe mutations through the monotonic `revision` counter: it moves
//! once per committed mutation, so a consumer that remembers the last value
//! it rendered knows exactly when to recompute.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::info;

use crate::error::LibraryError;
use crate::models::{Book, BookDraft};
use crate::store::SaveQueue;
use crate::view::{build_view, BookListView, ViewQuery};

pub struct Library {
    books: Vec<Book>,
    revision: u64,
    saves: SaveQueue,
    /// Lower bound for the next minted id. Ids are epoch-millisecond values,
    /// and the floor keeps same-millisecond adds (or a clock stepping back)
    /// from reusing one.
    next_id_floor: u64,
}

impl Library {
    /// Wrap the hydrated collection. Insertion order of `books` is preserved
    /// as the internal order; display order is the view engine's concern.
    pub fn new(books: Vec<Book>, saves: SaveQueue) -> Self {
        let next_id_floor = books
            .iter()
            .filter_map(|b| b.id.parse::<u64>().ok())
            .max()
            .map_or(0, |max| max + 1);
        Self {
            books,
            revision: 0,
            saves,
            next_id_floor,
        }
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    /// Moves once per committed mutation; never on a rejected one.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Derive the display list and aggregates for the given view state.
    pub fn view(&self, query: &ViewQuery) -> BookListView {
        build_view(&self.books, query)
    }

    pub fn find(&self, id: &str) -> Option<&Book> {
        self.books.iter().find(|b| b.id == id)
    }

    /// Validate, normalize, and append a new record. The returned record
    /// carries the committed status, so a caller can detect the forced
    /// `Finished` override by comparing it against what it requested.
    pub fn add_book(&mut self, draft: BookDraft) -> Result<Book, LibraryError> {
        let draft = draft.normalize()?;
        let stamp = self.mint_timestamp();
        let book = Book {
            id: stamp.to_string(),
            title: draft.title,
            author: draft.author,
            total_pages: draft.total_pages,
            pages_read: draft.pages_read,
            description: draft.description,
            status: Some(draft.status),
            rating: draft.rating,
            created_at: stamp,
        };
        self.books.push(book.clone());
        self.commit();
        info!(id = %book.id, title = %book.title, "added book");
        Ok(book)
    }

    /// Replace every field of an existing record except `id`/`created_at`.
    pub fn update_book(&mut self, id: &str, draft: BookDraft) -> Result<Book, LibraryError> {
        let index = self.index_of(id)?;
        let draft = draft.normalize()?;
        let existing = &self.books[index];
        let book = Book {
            id: existing.id.clone(),
            title: draft.title,
            author: draft.author,
            total_pages: draft.total_pages,
            pages_read: draft.pages_read,
            description: draft.description,
            status: Some(draft.status),
            rating: draft.rating,
            created_at: existing.created_at,
        };
        self.books[index] = book.clone();
        self.commit();
        info!(id = %book.id, title = %book.title, "updated book");
        Ok(book)
    }

    /// Remove a record, returning it so the caller can report what was
    /// deleted. A second delete of the same id fails with `BookNotFound`
    /// instead of silently succeeding, to surface caller/state desyncs.
    pub fn delete_book(&mut self, id: &str) -> Result<Book, LibraryError> {
        let index = self.index_of(id)?;
        let book = self.books.remove(index);
        self.commit();
        info!(id = %book.id, title = %book.title, "deleted book");
        Ok(book)
    }

    fn index_of(&self, id: &str) -> Result<usize, LibraryError> {
        self.books
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| LibraryError::BookNotFound { id: id.to_string() })
    }

    /// Bump the revision and enqueue the post-mutation snapshot. The
    /// in-memory change is already applied; a failed save is reported by the
    /// worker and never rolls it back.
    fn commit(&mut self) {
        self.revision += 1;
        self.saves.push(self.books.clone());
    }

    fn mint_timestamp(&mut self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as u64);
        let stamp = now.max(self.next_id_floor);
        self.next_id_floor = stamp + 1;
        stamp
    }
}
