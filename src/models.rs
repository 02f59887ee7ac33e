//! Domain models for the reading log. The `Book` struct mirrors the shape of
//! the persisted JSON blob exactly (camelCase field names, status stored as
//! its display label), so collections written by earlier versions of the app
//! hydrate unchanged. Everything that normalizes user input lives on
//! `BookDraft` so the rule is a pure function, testable without a store or a
//! terminal attached.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::LibraryError;

/// Reading status of a tracked book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    Reading,
    Finished,
    /// Serialized with the space-separated label the stored format uses.
    #[serde(rename = "Want to read")]
    WantToRead,
}

impl Status {
    /// All statuses, in the order the UI selector cycles through them.
    pub const ALL: [Status; 3] = [Status::Reading, Status::Finished, Status::WantToRead];

    /// The display label, which doubles as the stored representation.
    pub fn label(self) -> &'static str {
        match self {
            Status::Reading => "Reading",
            Status::Finished => "Finished",
            Status::WantToRead => "Want to read",
        }
    }

    /// Parse a stored label. Unknown labels map to `None` so a legacy blob
    /// with an unrecognized status hydrates as "not set" instead of failing
    /// the whole load.
    pub fn from_label(label: &str) -> Option<Status> {
        match label {
            "Reading" => Some(Status::Reading),
            "Finished" => Some(Status::Finished),
            "Want to read" => Some(Status::WantToRead),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

fn status_from_label<'de, D>(deserializer: D) -> Result<Option<Status>, D::Error>
where
    D: Deserializer<'de>,
{
    let label: Option<String> = Option::deserialize(deserializer)?;
    Ok(label.as_deref().and_then(Status::from_label))
}

/// One tracked book. Field names serialize in camelCase to stay
/// byte-compatible with the original stored format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Opaque identity key, minted once at creation and never changed. Minted
    /// ids are epoch-millisecond strings, but hydrated ids are treated as
    /// opaque text.
    pub id: String,
    /// Never empty after a successful add/update.
    pub title: String,
    /// May be empty; the UI falls back to "Unknown author".
    #[serde(default)]
    pub author: String,
    /// 0 means "not set".
    #[serde(default)]
    pub total_pages: u32,
    /// Clamped so it never exceeds `total_pages` when the latter is positive.
    #[serde(default)]
    pub pages_read: u32,
    #[serde(default)]
    pub description: String,
    /// `None` only for legacy records whose stored status is missing or
    /// unrecognized; records written by this program always carry a status.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "status_from_label"
    )]
    pub status: Option<Status>,
    /// 0..=5, where 0 means "unrated".
    #[serde(default)]
    pub rating: u8,
    /// Epoch milliseconds at creation; drives the default "Recent" ordering.
    #[serde(default)]
    pub created_at: u64,
}

impl Book {
    /// Status label with the fallback used for display and filtering alike.
    pub fn status_label(&self) -> &'static str {
        match self.status {
            Some(status) => status.label(),
            None => "Status not set",
        }
    }

    /// Pages read, capped at the total so progress never reads above 100%.
    pub fn pages_read_capped(&self) -> u32 {
        self.pages_read.min(self.total_pages)
    }

    /// Rounded progress percentage, or `None` when the total is not set.
    pub fn progress_percent(&self) -> Option<u8> {
        if self.total_pages == 0 {
            return None;
        }
        let read = f64::from(self.pages_read_capped());
        let total = f64::from(self.total_pages);
        Some((read / total * 100.0).round() as u8)
    }
}

/// Caller-supplied fields for a create or update, before identity is assigned
/// and the clamp-and-derive rule has run.
#[derive(Debug, Clone, PartialEq)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub total_pages: u32,
    pub pages_read: u32,
    pub description: String,
    pub status: Status,
    pub rating: u8,
}

impl BookDraft {
    /// Validate and normalize the draft: trim the text fields, reject an
    /// empty title, clamp `pages_read` to `total_pages`, and force the status
    /// to `Finished` once every page is read. Idempotent, so running it again
    /// on its own output changes nothing.
    pub fn normalize(mut self) -> Result<BookDraft, LibraryError> {
        self.title = self.title.trim().to_string();
        if self.title.is_empty() {
            return Err(LibraryError::EmptyTitle);
        }
        self.author = self.author.trim().to_string();
        self.description = self.description.trim().to_string();

        if self.total_pages > 0 && self.pages_read > self.total_pages {
            self.pages_read = self.total_pages;
        }
        if self.total_pages > 0 && self.pages_read >= self.total_pages {
            self.status = Status::Finished;
        }
        self.rating = self.rating.min(5);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(total_pages: u32, pages_read: u32, status: Status) -> BookDraft {
        BookDraft {
            title: "The Hobbit".to_string(),
            author: "J.R.R. Tolkien".to_string(),
            total_pages,
            pages_read,
            description: String::new(),
            status,
            rating: 4,
        }
    }

    #[test]
    fn normalize_rejects_blank_title() {
        let mut d = draft(0, 0, Status::Reading);
        d.title = "   ".to_string();
        assert!(matches!(d.normalize(), Err(LibraryError::EmptyTitle)));
    }

    #[test]
    fn normalize_trims_text_fields() {
        let mut d = draft(0, 0, Status::Reading);
        d.title = "  Dune ".to_string();
        d.author = " Frank Herbert  ".to_string();
        d.description = " sand ".to_string();
        let d = d.normalize().unwrap();
        assert_eq!(d.title, "Dune");
        assert_eq!(d.author, "Frank Herbert");
        assert_eq!(d.description, "sand");
    }

    #[test]
    fn normalize_clamps_pages_and_forces_finished() {
        let d = draft(200, 250, Status::WantToRead).normalize().unwrap();
        assert_eq!(d.pages_read, 200);
        assert_eq!(d.status, Status::Finished);
    }

    #[test]
    fn normalize_keeps_requested_status_below_total() {
        let d = draft(200, 120, Status::WantToRead).normalize().unwrap();
        assert_eq!(d.pages_read, 120);
        assert_eq!(d.status, Status::WantToRead);
    }

    #[test]
    fn normalize_ignores_pages_read_when_total_unset() {
        let d = draft(0, 50, Status::Reading).normalize().unwrap();
        assert_eq!(d.pages_read, 50);
        assert_eq!(d.status, Status::Reading);
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = draft(200, 250, Status::Reading).normalize().unwrap();
        let twice = once.clone().normalize().unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn progress_percent_rounds_and_caps() {
        let book = Book {
            id: "1".to_string(),
            title: "x".to_string(),
            author: String::new(),
            total_pages: 3,
            pages_read: 1,
            description: String::new(),
            status: None,
            rating: 0,
            created_at: 0,
        };
        assert_eq!(book.progress_percent(), Some(33));

        let over = Book {
            pages_read: 10,
            ..book.clone()
        };
        assert_eq!(over.progress_percent(), Some(100));
        assert_eq!(over.pages_read_capped(), 3);

        let unset = Book {
            total_pages: 0,
            ..book
        };
        assert_eq!(unset.progress_percent(), None);
    }

    #[test]
    fn book_serializes_with_stored_field_names() {
        let book = Book {
            id: "1700000000000".to_string(),
            title: "The Hobbit".to_string(),
            author: "J.R.R. Tolkien".to_string(),
            total_pages: 310,
            pages_read: 120,
            description: String::new(),
            status: Some(Status::WantToRead),
            rating: 5,
            created_at: 1_700_000_000_000,
        };
        let json = serde_json::to_string(&book).unwrap();
        assert!(json.contains("\"totalPages\":310"));
        assert!(json.contains("\"pagesRead\":120"));
        assert!(json.contains("\"createdAt\":1700000000000"));
        assert!(json.contains("\"status\":\"Want to read\""));
    }

    #[test]
    fn book_deserializes_legacy_status() {
        let json = r#"{"id":"1","title":"Old","createdAt":5}"#;
        let book: Book = serde_json::from_str(json).unwrap();
        assert_eq!(book.status, None);
        assert_eq!(book.status_label(), "Status not set");

        let json = r#"{"id":"1","title":"Old","status":"On hold","createdAt":5}"#;
        let book: Book = serde_json::from_str(json).unwrap();
        assert_eq!(book.status, None);
    }
}
