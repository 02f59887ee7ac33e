//! Pure view derivation: sorting, status filtering, searching, and the
//! aggregate counters shown in the list header. Nothing in this module
//! mutates the collection or touches the store; callers pass a snapshot in
//! and get disposable display data back.
//!
//! The pipeline order is fixed: sort the whole collection first, then apply
//! the status filter, then the search. Aggregates are always computed over
//! the full unfiltered collection, so the header keeps describing the whole
//! log even while a filter or search narrows the list.

use crate::models::{Book, Status};

/// Sort orders the list screen cycles through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOption {
    /// Newest first, by creation time. The default.
    Recent,
    /// Ascending by title, case-insensitively.
    Title,
    /// Descending by total pages; unset totals sort last.
    Pages,
    /// Descending by rating; unrated books sort last.
    Rating,
}

impl SortOption {
    pub const ALL: [SortOption; 4] = [
        SortOption::Recent,
        SortOption::Title,
        SortOption::Pages,
        SortOption::Rating,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SortOption::Recent => "Recent",
            SortOption::Title => "Title",
            SortOption::Pages => "Pages",
            SortOption::Rating => "Rating",
        }
    }

    /// The next option in cycling order, wrapping around.
    pub fn next(self) -> SortOption {
        let idx = Self::ALL.iter().position(|&s| s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

/// Status filter for the list screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    Only(Status),
}

impl StatusFilter {
    pub const ALL: [StatusFilter; 4] = [
        StatusFilter::All,
        StatusFilter::Only(Status::Reading),
        StatusFilter::Only(Status::Finished),
        StatusFilter::Only(Status::WantToRead),
    ];

    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Only(status) => status.label(),
        }
    }

    pub fn next(self) -> StatusFilter {
        let idx = Self::ALL.iter().position(|&f| f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Whether a book passes this filter. A book with no status never matches
    /// a concrete filter value; its effective label is "Status not set".
    pub fn matches(self, book: &Book) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(status) => book.status == Some(status),
        }
    }
}

/// User-selected view state the derivation is parameterized by.
#[derive(Debug, Clone)]
pub struct ViewQuery {
    pub status_filter: StatusFilter,
    pub sort: SortOption,
    pub search: String,
}

impl Default for ViewQuery {
    fn default() -> Self {
        Self {
            status_filter: StatusFilter::All,
            sort: SortOption::Recent,
            search: String::new(),
        }
    }
}

/// Counters over the full unfiltered collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub books: usize,
    pub pages: u64,
    pub reading: usize,
    pub finished: usize,
    pub want_to_read: usize,
}

/// A derived, read-only projection of the collection for display.
#[derive(Debug, Clone)]
pub struct BookListView {
    /// Books visible under the current filter/search, in sort order.
    pub books: Vec<Book>,
    /// Aggregates over the whole collection, independent of filter/search.
    pub totals: Totals,
}

/// Derive the display list and aggregates for one render.
pub fn build_view(collection: &[Book], query: &ViewQuery) -> BookListView {
    let totals = Totals {
        books: collection.len(),
        pages: collection.iter().map(|b| u64::from(b.total_pages)).sum(),
        reading: count_status(collection, Status::Reading),
        finished: count_status(collection, Status::Finished),
        want_to_read: count_status(collection, Status::WantToRead),
    };

    let mut sorted: Vec<Book> = collection.to_vec();
    // Stable sort, so Recent ties keep insertion order.
    match query.sort {
        SortOption::Recent => sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortOption::Title => {
            sorted.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
        }
        SortOption::Pages => sorted.sort_by(|a, b| b.total_pages.cmp(&a.total_pages)),
        SortOption::Rating => sorted.sort_by(|a, b| b.rating.cmp(&a.rating)),
    }

    let needle = query.search.trim().to_lowercase();
    let books = sorted
        .into_iter()
        .filter(|book| query.status_filter.matches(book))
        .filter(|book| {
            needle.is_empty()
                || book.title.to_lowercase().contains(&needle)
                || book.author.to_lowercase().contains(&needle)
        })
        .collect();

    BookListView { books, totals }
}

fn count_status(collection: &[Book], status: Status) -> usize {
    collection
        .iter()
        .filter(|b| b.status == Some(status))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(title: &str, author: &str, created_at: u64) -> Book {
        Book {
            id: created_at.to_string(),
            title: title.to_string(),
            author: author.to_string(),
            total_pages: 0,
            pages_read: 0,
            description: String::new(),
            status: None,
            rating: 0,
            created_at,
        }
    }

    fn query(filter: StatusFilter, sort: SortOption, search: &str) -> ViewQuery {
        ViewQuery {
            status_filter: filter,
            sort,
            search: search.to_string(),
        }
    }

    fn titles(view: &BookListView) -> Vec<&str> {
        view.books.iter().map(|b| b.title.as_str()).collect()
    }

    #[test]
    fn recent_sorts_newest_first() {
        let books = vec![book("Old", "", 1), book("New", "", 3), book("Mid", "", 2)];
        let view = build_view(&books, &ViewQuery::default());
        assert_eq!(titles(&view), ["New", "Mid", "Old"]);
    }

    #[test]
    fn title_sort_is_case_insensitive() {
        let books = vec![
            book("Bravo", "", 1),
            book("alpha", "", 2),
            book("Charlie", "", 3),
        ];
        let view = build_view(&books, &query(StatusFilter::All, SortOption::Title, ""));
        assert_eq!(titles(&view), ["alpha", "Bravo", "Charlie"]);
    }

    #[test]
    fn pages_and_rating_sort_descending() {
        let mut a = book("A", "", 1);
        a.total_pages = 100;
        a.rating = 2;
        let mut b = book("B", "", 2);
        b.total_pages = 300;
        b.rating = 5;
        let c = book("C", "", 3);

        let books = vec![a, b, c];
        let view = build_view(&books, &query(StatusFilter::All, SortOption::Pages, ""));
        assert_eq!(titles(&view), ["B", "A", "C"]);
        let view = build_view(&books, &query(StatusFilter::All, SortOption::Rating, ""));
        assert_eq!(titles(&view), ["B", "A", "C"]);
    }

    #[test]
    fn status_filter_excludes_unset_status() {
        let mut reading = book("Reading one", "", 1);
        reading.status = Some(Status::Reading);
        let mut finished = book("Done", "", 2);
        finished.status = Some(Status::Finished);
        let unset = book("No status", "", 3);

        let books = vec![reading, finished, unset];
        let view = build_view(
            &books,
            &query(
                StatusFilter::Only(Status::Reading),
                SortOption::Recent,
                "",
            ),
        );
        assert_eq!(titles(&view), ["Reading one"]);
    }

    #[test]
    fn aggregates_ignore_filter_and_search() {
        let mut reading = book("Reading one", "", 1);
        reading.status = Some(Status::Reading);
        reading.total_pages = 120;
        let mut finished = book("Done", "", 2);
        finished.status = Some(Status::Finished);
        finished.total_pages = 80;
        let unset = book("No status", "", 3);

        let books = vec![reading, finished, unset];
        let view = build_view(
            &books,
            &query(
                StatusFilter::Only(Status::Finished),
                SortOption::Recent,
                "zzz no match",
            ),
        );
        assert!(view.books.is_empty());
        assert_eq!(view.totals.books, 3);
        assert_eq!(view.totals.pages, 200);
        assert_eq!(view.totals.reading, 1);
        assert_eq!(view.totals.finished, 1);
        assert_eq!(view.totals.want_to_read, 0);
    }

    #[test]
    fn search_matches_title_or_author() {
        let books = vec![
            book("The Hobbit", "J.R.R. Tolkien", 1),
            book("Dune", "Frank Herbert", 2),
        ];
        let view = build_view(&books, &query(StatusFilter::All, SortOption::Recent, "tolk"));
        assert_eq!(titles(&view), ["The Hobbit"]);

        let view = build_view(&books, &query(StatusFilter::All, SortOption::Recent, "DUNE"));
        assert_eq!(titles(&view), ["Dune"]);

        let view = build_view(&books, &query(StatusFilter::All, SortOption::Recent, ""));
        assert_eq!(view.books.len(), 2);
    }

    #[test]
    fn filter_and_sort_cycle_through_every_option() {
        let mut sort = SortOption::Recent;
        for _ in 0..SortOption::ALL.len() {
            sort = sort.next();
        }
        assert_eq!(sort, SortOption::Recent);

        let mut filter = StatusFilter::All;
        for _ in 0..StatusFilter::ALL.len() {
            filter = filter.next();
        }
        assert_eq!(filter, StatusFilter::All);
    }
}
