use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::models::{Book, BookDraft, Status};

/// State for the login screen. There is no real authentication: the email is
/// kept only as a display identifier, the password goes nowhere. Both fields
/// are still required, matching the original app's gate.
#[derive(Default, Clone)]
pub(crate) struct LoginForm {
    pub(crate) email: String,
    pub(crate) password: String,
    pub(crate) active: LoginField,
    pub(crate) error: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum LoginField {
    #[default]
    Email,
    Password,
}

impl LoginForm {
    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            LoginField::Email => LoginField::Password,
            LoginField::Password => LoginField::Email,
        };
    }

    pub(crate) fn push_char(&mut self, ch: char) {
        if ch.is_control() {
            return;
        }
        match self.active {
            LoginField::Email => self.email.push(ch),
            LoginField::Password => self.password.push(ch),
        }
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            LoginField::Email => {
                self.email.pop();
            }
            LoginField::Password => {
                self.password.pop();
            }
        }
    }

    /// Require both fields, return the trimmed email as the session label.
    pub(crate) fn submit(&self) -> Result<String, String> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err("Please enter both email and password.".to_string());
        }
        Ok(self.email.trim().to_string())
    }

    /// Render one form line; the password renders masked.
    pub(crate) fn build_line(&self, field_name: &str, field: LoginField) -> Line<'static> {
        let (value, masked, is_active) = match field {
            LoginField::Email => (&self.email, false, self.active == LoginField::Email),
            LoginField::Password => (&self.password, true, self.active == LoginField::Password),
        };

        let display = if value.is_empty() {
            "<required>".to_string()
        } else if masked {
            "*".repeat(value.chars().count())
        } else {
            value.clone()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{field_name}: ")),
            Span::styled(display, style),
        ])
    }

    pub(crate) fn value_len(&self, field: LoginField) -> usize {
        match field {
            LoginField::Email => self.email.chars().count(),
            LoginField::Password => self.password.chars().count(),
        }
    }
}

/// Fields of the add/edit book form, in focus-cycling order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum BookField {
    #[default]
    Title,
    Author,
    TotalPages,
    PagesRead,
    Description,
    Status,
    Rating,
}

const FIELD_ORDER: [BookField; 7] = [
    BookField::Title,
    BookField::Author,
    BookField::TotalPages,
    BookField::PagesRead,
    BookField::Description,
    BookField::Status,
    BookField::Rating,
];

/// Form state for creating or editing a book. Page fields hold raw digit
/// strings; parsing (with a default of 0 on empty input) happens in
/// `to_draft`, and the clamp-and-derive rule runs inside the library.
#[derive(Clone)]
pub(crate) struct BookForm {
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) total_pages: String,
    pub(crate) pages_read: String,
    pub(crate) description: String,
    pub(crate) status: Status,
    pub(crate) rating: u8,
    pub(crate) active: BookField,
    pub(crate) error: Option<String>,
}

impl Default for BookForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            author: String::new(),
            total_pages: String::new(),
            pages_read: String::new(),
            description: String::new(),
            // The original app defaulted new books to Finished.
            status: Status::Finished,
            rating: 0,
            active: BookField::Title,
            error: None,
        }
    }
}

impl BookForm {
    /// Populate the form from an existing book when entering edit mode. A
    /// record with no stored status edits as Finished, the original fallback.
    pub(crate) fn from_book(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            total_pages: if book.total_pages > 0 {
                book.total_pages.to_string()
            } else {
                String::new()
            },
            pages_read: book.pages_read.to_string(),
            description: book.description.clone(),
            status: book.status.unwrap_or(Status::Finished),
            rating: book.rating.min(5),
            active: BookField::Title,
            error: None,
        }
    }

    pub(crate) fn next_field(&mut self) {
        self.shift_field(1);
    }

    pub(crate) fn prev_field(&mut self) {
        self.shift_field(-1);
    }

    fn shift_field(&mut self, offset: isize) {
        let len = FIELD_ORDER.len() as isize;
        let idx = FIELD_ORDER
            .iter()
            .position(|&f| f == self.active)
            .unwrap_or(0) as isize;
        self.active = FIELD_ORDER[((idx + offset + len) % len) as usize];
    }

    /// Append a character to the active field, validating allowed input.
    /// Page fields accept only ASCII digits; a digit on the rating field
    /// sets the rating directly.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        match self.active {
            BookField::Title => push_text(&mut self.title, ch),
            BookField::Author => push_text(&mut self.author, ch),
            BookField::Description => push_text(&mut self.description, ch),
            BookField::TotalPages => push_digit(&mut self.total_pages, ch),
            BookField::PagesRead => push_digit(&mut self.pages_read, ch),
            BookField::Rating => {
                if let Some(value) = ch.to_digit(10) {
                    if value <= 5 {
                        self.rating = value as u8;
                        return true;
                    }
                }
                false
            }
            BookField::Status => false,
        }
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            BookField::Title => {
                self.title.pop();
            }
            BookField::Author => {
                self.author.pop();
            }
            BookField::TotalPages => {
                self.total_pages.pop();
            }
            BookField::PagesRead => {
                self.pages_read.pop();
            }
            BookField::Description => {
                self.description.pop();
            }
            BookField::Status | BookField::Rating => {}
        }
    }

    /// Left/Right on the selector fields: cycle the status, step the rating.
    pub(crate) fn adjust(&mut self, offset: isize) {
        match self.active {
            BookField::Status => {
                let len = Status::ALL.len() as isize;
                let idx = Status::ALL
                    .iter()
                    .position(|&s| s == self.status)
                    .unwrap_or(0) as isize;
                self.status = Status::ALL[((idx + offset + len) % len) as usize];
            }
            BookField::Rating => {
                let next = self.rating as isize + offset;
                self.rating = next.clamp(0, 5) as u8;
            }
            _ => {}
        }
    }

    /// Build the engine-facing draft. Empty or overlong page input counts as
    /// 0 ("not set"); the title requirement is enforced by the library.
    pub(crate) fn to_draft(&self) -> BookDraft {
        BookDraft {
            title: self.title.clone(),
            author: self.author.clone(),
            total_pages: self.total_pages.trim().parse().unwrap_or(0),
            pages_read: self.pages_read.trim().parse().unwrap_or(0),
            description: self.description.clone(),
            status: self.status,
            rating: self.rating,
        }
    }

    /// Render a single text-field line for the form widget.
    pub(crate) fn build_line(&self, field_name: &str, field: BookField) -> Line<'static> {
        let value = self.text_value(field);
        let is_active = self.active == field;

        let display = if value.is_empty() {
            match field {
                BookField::Title => "<required>".to_string(),
                _ => "<optional>".to_string(),
            }
        } else {
            value.to_string()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{field_name}: ")),
            Span::styled(display, style),
        ])
    }

    /// Render the status selector with every option visible and the chosen
    /// one highlighted.
    pub(crate) fn status_line(&self) -> Line<'static> {
        let mut spans = vec![Span::raw("Status: ")];
        for (idx, status) in Status::ALL.iter().enumerate() {
            if idx > 0 {
                spans.push(Span::raw("  "));
            }
            let chosen = *status == self.status;
            let mut style = if chosen {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            if chosen && self.active == BookField::Status {
                style = style.fg(Color::Yellow);
            }
            let text = if chosen {
                format!("[{}]", status.label())
            } else {
                format!(" {} ", status.label())
            };
            spans.push(Span::styled(text, style));
        }
        Line::from(spans)
    }

    /// Render the star-rating selector.
    pub(crate) fn rating_line(&self) -> Line<'static> {
        let stars = super::helpers::star_line(self.rating);
        let style = if self.active == BookField::Rating {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        Line::from(vec![
            Span::raw("Rating: "),
            Span::styled(format!("{stars} ({}/5)", self.rating), style),
        ])
    }

    pub(crate) fn value_len(&self, field: BookField) -> usize {
        self.text_value(field).chars().count()
    }

    fn text_value(&self, field: BookField) -> &str {
        match field {
            BookField::Title => &self.title,
            BookField::Author => &self.author,
            BookField::TotalPages => &self.total_pages,
            BookField::PagesRead => &self.pages_read,
            BookField::Description => &self.description,
            BookField::Status | BookField::Rating => "",
        }
    }
}

fn push_text(value: &mut String, ch: char) -> bool {
    if ch.is_control() {
        return false;
    }
    value.push(ch);
    true
}

fn push_digit(value: &mut String, ch: char) -> bool {
    if !ch.is_ascii_digit() {
        return false;
    }
    value.push(ch);
    true
}

/// Confirmation state for a pending delete.
#[derive(Clone)]
pub(crate) struct ConfirmBookDelete {
    pub(crate) id: String,
    pub(crate) title: String,
}

impl ConfirmBookDelete {
    pub(crate) fn from(book: &Book) -> Self {
        Self {
            id: book.id.clone(),
            title: book.title.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_submit_requires_both_fields() {
        let mut form = LoginForm::default();
        assert!(form.submit().is_err());
        form.email = "reader@example.com".to_string();
        assert!(form.submit().is_err());
        form.password = "hunter2".to_string();
        assert_eq!(form.submit().unwrap(), "reader@example.com");
    }

    #[test]
    fn page_fields_accept_only_digits() {
        let mut form = BookForm {
            active: BookField::TotalPages,
            ..BookForm::default()
        };
        assert!(form.push_char('2'));
        assert!(!form.push_char('x'));
        assert!(form.push_char('0'));
        assert_eq!(form.total_pages, "20");
        assert_eq!(form.to_draft().total_pages, 20);
    }

    #[test]
    fn empty_page_input_parses_as_zero() {
        let form = BookForm::default();
        let draft = form.to_draft();
        assert_eq!(draft.total_pages, 0);
        assert_eq!(draft.pages_read, 0);
    }

    #[test]
    fn status_selector_cycles_and_wraps() {
        let mut form = BookForm {
            active: BookField::Status,
            ..BookForm::default()
        };
        assert_eq!(form.status, Status::Finished);
        form.adjust(1);
        assert_eq!(form.status, Status::WantToRead);
        form.adjust(1);
        assert_eq!(form.status, Status::Reading);
        form.adjust(-1);
        assert_eq!(form.status, Status::WantToRead);
    }

    #[test]
    fn rating_stays_within_bounds() {
        let mut form = BookForm {
            active: BookField::Rating,
            ..BookForm::default()
        };
        form.adjust(1);
        assert_eq!(form.rating, 1);
        form.adjust(10);
        assert_eq!(form.rating, 5);
        assert!(form.push_char('3'));
        assert_eq!(form.rating, 3);
        assert!(!form.push_char('9'));
        form.adjust(-10);
        assert_eq!(form.rating, 0);
    }

    #[test]
    fn field_cycling_wraps_both_ways() {
        let mut form = BookForm::default();
        for _ in 0..7 {
            form.next_field();
        }
        assert_eq!(form.active, BookField::Title);
        form.prev_field();
        assert_eq!(form.active, BookField::Rating);
    }

    #[test]
    fn from_book_falls_back_to_finished_status() {
        let book = Book {
            id: "1".to_string(),
            title: "Legacy".to_string(),
            author: String::new(),
            total_pages: 0,
            pages_read: 0,
            description: String::new(),
            status: None,
            rating: 0,
            created_at: 1,
        };
        let form = BookForm::from_book(&book);
        assert_eq!(form.status, Status::Finished);
        assert_eq!(form.total_pages, "");
        assert_eq!(form.pages_read, "0");
    }
}
