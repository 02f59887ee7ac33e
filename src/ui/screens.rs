//! List-screen state: the cached derived view, the selection, and the
//! user-selected view parameters. The cache is refreshed whenever the
//! library's revision counter moves past the last one rendered, which is how
//! the screen observes committed mutations without holding callbacks into
//! the store.

use crate::library::Library;
use crate::models::Book;
use crate::view::{SortOption, StatusFilter, Totals, ViewQuery};

pub(crate) struct BookListScreen {
    pub(crate) query: ViewQuery,
    /// Books visible under the current query, in display order.
    pub(crate) visible: Vec<Book>,
    pub(crate) totals: Totals,
    pub(crate) selected: usize,
    seen_revision: Option<u64>,
}

impl BookListScreen {
    pub(crate) fn new() -> Self {
        Self {
            query: ViewQuery::default(),
            visible: Vec::new(),
            totals: Totals::default(),
            selected: 0,
            seen_revision: None,
        }
    }

    /// Recompute the cached view if the library has committed a mutation
    /// since the last recompute. Called before every draw and key dispatch.
    pub(crate) fn sync(&mut self, library: &Library) {
        if self.seen_revision != Some(library.revision()) {
            self.recompute(library);
        }
    }

    /// Unconditionally rebuild the cached view from the current collection
    /// and query, clamping the selection into bounds.
    pub(crate) fn recompute(&mut self, library: &Library) {
        let view = library.view(&self.query);
        self.visible = view.books;
        self.totals = view.totals;
        self.seen_revision = Some(library.revision());
        self.ensure_in_bounds();
    }

    pub(crate) fn set_search(&mut self, search: String, library: &Library) {
        self.query.search = search;
        self.recompute(library);
    }

    pub(crate) fn cycle_sort(&mut self, library: &Library) -> SortOption {
        self.query.sort = self.query.sort.next();
        self.recompute(library);
        self.query.sort
    }

    pub(crate) fn cycle_filter(&mut self, library: &Library) -> StatusFilter {
        self.query.status_filter = self.query.status_filter.next();
        self.recompute(library);
        self.query.status_filter
    }

    pub(crate) fn current_book(&self) -> Option<&Book> {
        self.visible.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.visible.is_empty() {
            return;
        }
        let len = self.visible.len() as isize;
        let new = (self.selected as isize + offset).clamp(0, len - 1);
        self.selected = new as usize;
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        if !self.visible.is_empty() {
            self.selected = self.visible.len() - 1;
        }
    }

    /// Move the selection onto the given id if it is visible, e.g. after an
    /// add or update landed.
    pub(crate) fn select_id(&mut self, id: &str) {
        if let Some(pos) = self.visible.iter().position(|b| b.id == id) {
            self.selected = pos;
        }
    }

    fn ensure_in_bounds(&mut self) {
        if self.visible.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.visible.len() {
            self.selected = self.visible.len() - 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc::sync_channel;

    use super::*;
    use crate::models::{BookDraft, Status};
    use crate::store::SaveQueue;

    fn library_with(titles: &[&str]) -> Library {
        let (tx, _rx) = sync_channel(64);
        let mut library = Library::new(Vec::new(), SaveQueue::for_tests(tx));
        for title in titles {
            library
                .add_book(BookDraft {
                    title: title.to_string(),
                    author: String::new(),
                    total_pages: 0,
                    pages_read: 0,
                    description: String::new(),
                    status: Status::Reading,
                    rating: 0,
                })
                .unwrap();
        }
        library
    }

    #[test]
    fn sync_recomputes_only_when_revision_moves() {
        let mut library = library_with(&["A"]);
        let mut screen = BookListScreen::new();
        screen.sync(&library);
        assert_eq!(screen.visible.len(), 1);

        // No mutation: the cache stays as-is even if poked.
        screen.sync(&library);
        assert_eq!(screen.visible.len(), 1);

        library
            .add_book(BookDraft {
                title: "B".to_string(),
                author: String::new(),
                total_pages: 0,
                pages_read: 0,
                description: String::new(),
                status: Status::Reading,
                rating: 0,
            })
            .unwrap();
        screen.sync(&library);
        assert_eq!(screen.visible.len(), 2);
    }

    #[test]
    fn selection_clamps_after_the_list_shrinks() {
        let mut library = library_with(&["A", "B", "C"]);
        let mut screen = BookListScreen::new();
        screen.sync(&library);
        screen.select_last();
        assert_eq!(screen.selected, 2);

        let last_id = screen.current_book().unwrap().id.clone();
        library.delete_book(&last_id).unwrap();
        screen.sync(&library);
        assert_eq!(screen.selected, 1);
        assert!(screen.current_book().is_some());
    }

    #[test]
    fn search_narrows_the_visible_list() {
        let library = library_with(&["The Hobbit", "Dune"]);
        let mut screen = BookListScreen::new();
        screen.sync(&library);
        screen.set_search("hobb".to_string(), &library);
        assert_eq!(screen.visible.len(), 1);
        assert_eq!(screen.visible[0].title, "The Hobbit");
        // Aggregates still describe the whole collection.
        assert_eq!(screen.totals.books, 2);
    }
}
