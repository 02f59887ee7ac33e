use std::mem;

use anyhow::Result;
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use crate::library::Library;
use crate::models::{Book, Status};

use super::forms::{BookField, BookForm, ConfirmBookDelete, LoginField, LoginForm};
use super::helpers::{centered_rect, star_line, surface_error};
use super::screens::BookListScreen;

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Header space for the app title, session line, and collection summary.
const HEADER_HEIGHT: u16 = 7;

/// High-level navigation states. Login is a full screen rather than a mode
/// because it replaces the list entirely, the way the original app routed.
enum Screen {
    Login(LoginForm),
    Books,
}

/// Fine-grained modes scoped to the list screen.
enum Mode {
    Normal,
    AddingBook(BookForm),
    EditingBook { id: String, form: BookForm },
    ConfirmDelete(ConfirmBookDelete),
    Searching(SearchState),
}

/// State for an active inline search.
struct SearchState {
    query: String,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI. Borrows the library so
/// the collection has exactly one owner (constructed in `main`) and every
/// write funnels through its mutation methods.
pub struct App<'a> {
    library: &'a mut Library,
    screen: Screen,
    mode: Mode,
    list: BookListScreen,
    status: Option<StatusMessage>,
    user_email: Option<String>,
}

impl<'a> App<'a> {
    /// `load_error` carries a hydration failure (a corrupt stored blob) so
    /// it is visible in the footer from the first frame instead of only in
    /// the log file.
    pub fn new(library: &'a mut Library, load_error: Option<String>) -> Self {
        Self {
            library,
            screen: Screen::Login(LoginForm::default()),
            mode: Mode::Normal,
            list: BookListScreen::new(),
            status: load_error.map(|text| StatusMessage {
                text,
                kind: StatusKind::Error,
            }),
            user_email: None,
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        if matches!(self.screen, Screen::Login(_)) {
            return self.handle_login_key(code);
        }

        self.list.sync(self.library);

        let mut exit = false;
        let mut mode = mem::replace(&mut self.mode, Mode::Normal);

        mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::AddingBook(form) => self.handle_add_book(code, form),
            Mode::EditingBook { id, form } => self.handle_edit_book(code, id, form),
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm),
            Mode::Searching(state) => self.handle_search(code, state),
        };

        self.mode = mode;
        Ok(exit)
    }

    fn handle_login_key(&mut self, code: KeyCode) -> Result<bool> {
        let Screen::Login(form) = &mut self.screen else {
            return Ok(false);
        };

        match code {
            KeyCode::Esc => return Ok(true),
            KeyCode::Tab | KeyCode::Up | KeyCode::Down => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match form.submit() {
                Ok(email) => {
                    self.user_email = Some(email);
                    self.screen = Screen::Books;
                    self.list.recompute(self.library);
                }
                Err(message) => form.error = Some(message),
            },
            KeyCode::Char(ch) => {
                form.error = None;
                form.push_char(ch);
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Esc => {
                if !self.list.query.search.is_empty() {
                    self.list.set_search(String::new(), self.library);
                    self.set_status("Search cleared.", StatusKind::Info);
                }
            }
            KeyCode::Up => self.list.move_selection(-1),
            KeyCode::Down => self.list.move_selection(1),
            KeyCode::Home => self.list.select_first(),
            KeyCode::End => self.list.select_last(),
            KeyCode::Char('+') | KeyCode::Char('a') => {
                self.clear_status();
                return Mode::AddingBook(BookForm::default());
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(book) = self.list.current_book() {
                    let id = book.id.clone();
                    let form = BookForm::from_book(book);
                    self.clear_status();
                    return Mode::EditingBook { id, form };
                }
                self.set_status("No book selected.", StatusKind::Error);
            }
            KeyCode::Char('-') | KeyCode::Char('d') => {
                if let Some(book) = self.list.current_book() {
                    return Mode::ConfirmDelete(ConfirmBookDelete::from(book));
                }
                self.set_status("No book selected.", StatusKind::Error);
            }
            KeyCode::Char('/') => {
                return Mode::Searching(SearchState {
                    query: self.list.query.search.clone(),
                });
            }
            KeyCode::Char('s') => {
                let sort = self.list.cycle_sort(self.library);
                self.set_status(format!("Sorted by {}.", sort.label()), StatusKind::Info);
            }
            KeyCode::Char('f') => {
                let filter = self.list.cycle_filter(self.library);
                self.set_status(format!("Filter: {}.", filter.label()), StatusKind::Info);
            }
            KeyCode::Char('l') => {
                self.user_email = None;
                self.screen = Screen::Login(LoginForm::default());
                self.clear_status();
            }
            _ => {}
        }
        Mode::Normal
    }

    fn handle_add_book(&mut self, code: KeyCode, mut form: BookForm) -> Mode {
        match code {
            KeyCode::Esc => Mode::Normal,
            KeyCode::Tab | KeyCode::Down => {
                form.next_field();
                Mode::AddingBook(form)
            }
            KeyCode::BackTab | KeyCode::Up => {
                form.prev_field();
                Mode::AddingBook(form)
            }
            KeyCode::Left => {
                form.adjust(-1);
                Mode::AddingBook(form)
            }
            KeyCode::Right => {
                form.adjust(1);
                Mode::AddingBook(form)
            }
            KeyCode::Backspace => {
                form.error = None;
                form.backspace();
                Mode::AddingBook(form)
            }
            KeyCode::Enter => {
                let requested = form.status;
                match self.library.add_book(form.to_draft()) {
                    Ok(book) => {
                        self.after_commit(&book, requested, format!("Added \"{}\".", book.title));
                        Mode::Normal
                    }
                    Err(err) => {
                        form.error = Some(err.to_string());
                        Mode::AddingBook(form)
                    }
                }
            }
            KeyCode::Char(ch) => {
                form.error = None;
                form.push_char(ch);
                Mode::AddingBook(form)
            }
            _ => Mode::AddingBook(form),
        }
    }

    fn handle_edit_book(&mut self, code: KeyCode, id: String, mut form: BookForm) -> Mode {
        match code {
            KeyCode::Esc => Mode::Normal,
            KeyCode::Tab | KeyCode::Down => {
                form.next_field();
                Mode::EditingBook { id, form }
            }
            KeyCode::BackTab | KeyCode::Up => {
                form.prev_field();
                Mode::EditingBook { id, form }
            }
            KeyCode::Left => {
                form.adjust(-1);
                Mode::EditingBook { id, form }
            }
            KeyCode::Right => {
                form.adjust(1);
                Mode::EditingBook { id, form }
            }
            KeyCode::Backspace => {
                form.error = None;
                form.backspace();
                Mode::EditingBook { id, form }
            }
            KeyCode::Enter => {
                let requested = form.status;
                match self.library.update_book(&id, form.to_draft()) {
                    Ok(book) => {
                        self.after_commit(&book, requested, format!("Updated \"{}\".", book.title));
                        Mode::Normal
                    }
                    Err(err) => {
                        form.error = Some(err.to_string());
                        Mode::EditingBook { id, form }
                    }
                }
            }
            KeyCode::Char(ch) => {
                form.error = None;
                form.push_char(ch);
                Mode::EditingBook { id, form }
            }
            _ => Mode::EditingBook { id, form },
        }
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmBookDelete) -> Mode {
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                match self.library.delete_book(&confirm.id) {
                    Ok(book) => {
                        self.list.recompute(self.library);
                        self.set_status(format!("Removed \"{}\".", book.title), StatusKind::Info);
                    }
                    Err(err) => {
                        self.set_status(surface_error(&err.into()), StatusKind::Error);
                    }
                }
                Mode::Normal
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Mode::Normal,
            _ => Mode::ConfirmDelete(confirm),
        }
    }

    fn handle_search(&mut self, code: KeyCode, mut state: SearchState) -> Mode {
        match code {
            KeyCode::Enter => Mode::Normal,
            KeyCode::Esc => {
                self.list.set_search(String::new(), self.library);
                Mode::Normal
            }
            KeyCode::Backspace => {
                state.query.pop();
                self.list.set_search(state.query.clone(), self.library);
                Mode::Searching(state)
            }
            KeyCode::Char(ch) if !ch.is_control() => {
                state.query.push(ch);
                self.list.set_search(state.query.clone(), self.library);
                Mode::Searching(state)
            }
            _ => Mode::Searching(state),
        }
    }

    /// Refresh the list, keep the committed record selected, and report the
    /// outcome. When the library forced the status to Finished, the footer
    /// says so instead of the plain success message.
    fn after_commit(&mut self, book: &Book, requested: Status, success: String) {
        self.list.recompute(self.library);
        self.list.select_id(&book.id);
        if book.status != Some(requested) {
            self.set_status("Marked as Finished (every page read).", StatusKind::Info);
        } else {
            self.set_status(success, StatusKind::Info);
        }
    }

    pub(crate) fn draw(&mut self, frame: &mut Frame) {
        if matches!(self.screen, Screen::Books) {
            self.list.sync(self.library);
        }

        let area = frame.area();

        if let Screen::Login(form) = &self.screen {
            Self::draw_login(frame, area, form, self.status.as_ref());
            return;
        }

        let footer_height = FOOTER_HEIGHT.min(area.height);
        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        self.draw_book_list(frame, content_area);

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::AddingBook(form) => Self::draw_book_form(frame, area, "Add a Book", form),
            Mode::EditingBook { form, .. } => Self::draw_book_form(frame, area, "Edit Book", form),
            Mode::ConfirmDelete(confirm) => Self::draw_confirm_delete(frame, area, confirm),
            Mode::Searching(state) => Self::draw_search_bar(frame, area, state),
            Mode::Normal => {}
        }
    }

    fn draw_login(
        frame: &mut Frame,
        area: Rect,
        form: &LoginForm,
        status: Option<&StatusMessage>,
    ) {
        let popup_area = centered_rect(60, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("My Reading Log").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            Line::from(Span::styled(
                "Login to continue",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            form.build_line("Email", LoginField::Email),
            form.build_line("Password", LoginField::Password),
            Line::from(""),
        ];

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else if let Some(status) = status {
            lines.push(Line::from(Span::styled(
                status.text.clone(),
                status.kind.style(),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to login \u{2022} Tab to switch \u{2022} Esc to quit",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let (prefix, row, field) = match form.active {
            LoginField::Email => ("Email: ", 2u16, LoginField::Email),
            LoginField::Password => ("Password: ", 3u16, LoginField::Password),
        };
        let cursor_x = inner.x + prefix.len() as u16 + form.value_len(field) as u16;
        frame.set_cursor_position((cursor_x, inner.y + row));
    }

    fn draw_book_list(&self, frame: &mut Frame, area: Rect) {
        let header_height = HEADER_HEIGHT.min(area.height);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(header_height), Constraint::Min(0)])
            .split(area);

        self.draw_header(frame, chunks[0]);

        if self.list.visible.is_empty() {
            let message = Paragraph::new("No books in this view. Try a different filter or add a book.")
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });
            frame.render_widget(message, chunks[1]);
            return;
        }

        let items: Vec<ListItem> = self
            .list
            .visible
            .iter()
            .map(|book| ListItem::new(book_card_lines(book)))
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::NONE))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");

        let mut state = ListState::default();
        state.select(Some(self.list.selected));
        frame.render_stateful_widget(list, chunks[1], &mut state);
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let totals = self.list.totals;
        let mut lines = vec![Line::from(Span::styled(
            "My Reading Log",
            Style::default().add_modifier(Modifier::BOLD),
        ))];

        if let Some(email) = &self.user_email {
            lines.push(Line::from(Span::styled(
                format!("Logged in as: {email}"),
                Style::default().fg(Color::DarkGray),
            )));
        }

        if totals.books > 0 {
            let plural = if totals.books == 1 { "" } else { "s" };
            lines.push(Line::from(format!(
                "You have logged {} book{plural} ({} pages in total)",
                totals.books, totals.pages
            )));
            lines.push(Line::from(Span::styled(
                format!(
                    "Reading: {} \u{b7} Finished: {} \u{b7} Want to read: {}",
                    totals.reading, totals.finished, totals.want_to_read
                ),
                Style::default().fg(Color::DarkGray),
            )));
        }

        let query = &self.list.query;
        let search = if query.search.is_empty() {
            "(none)".to_string()
        } else {
            format!("\"{}\"", query.search)
        };
        lines.push(Line::from(Span::styled(
            format!(
                "Filter: {}   Sort: {}   Search: {}",
                query.status_filter.label(),
                query.sort.label(),
                search
            ),
            Style::default().fg(Color::Cyan),
        )));

        let block = Block::default().borders(Borders::BOTTOM);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        match &self.mode {
            Mode::AddingBook(_) | Mode::EditingBook { .. } => Line::from(vec![
                Span::styled("[Enter]", key_style),
                Span::raw(" Save   "),
                Span::styled("[Tab]", key_style),
                Span::raw(" Next Field   "),
                Span::styled("[\u{2190}\u{2192}]", key_style),
                Span::raw(" Adjust   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Cancel"),
            ]),
            Mode::ConfirmDelete(_) => Line::from(vec![
                Span::styled("[y]", key_style),
                Span::raw(" Delete   "),
                Span::styled("[n]", key_style),
                Span::raw(" Cancel"),
            ]),
            Mode::Searching(_) => Line::from(vec![
                Span::styled("[Enter]", key_style),
                Span::raw(" Accept   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Clear"),
            ]),
            Mode::Normal => Line::from(vec![
                Span::styled("[\u{2191}\u{2193}]", key_style),
                Span::raw(" Select   "),
                Span::styled("[+]", key_style),
                Span::raw(" Add   "),
                Span::styled("[e]", key_style),
                Span::raw(" Edit   "),
                Span::styled("[-]", key_style),
                Span::raw(" Delete   "),
                Span::styled("[/]", key_style),
                Span::raw(" Search   "),
                Span::styled("[s]", key_style),
                Span::raw(" Sort   "),
                Span::styled("[f]", key_style),
                Span::raw(" Filter   "),
                Span::styled("[l]", key_style),
                Span::raw(" Logout   "),
                Span::styled("[q]", key_style),
                Span::raw(" Quit"),
            ]),
        }
    }

    fn draw_book_form(frame: &mut Frame, area: Rect, title: &str, form: &BookForm) {
        let popup_area = centered_rect(70, 60, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title.to_string()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            form.build_line("Title", BookField::Title),
            form.build_line("Author", BookField::Author),
            form.build_line("Total pages", BookField::TotalPages),
            form.build_line("Pages read", BookField::PagesRead),
            form.build_line("Description", BookField::Description),
            form.status_line(),
            form.rating_line(),
            Line::from(""),
        ];

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save \u{2022} Tab to switch \u{2022} \u{2190}\u{2192} to adjust \u{2022} Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        // Cursor only makes sense on the text fields; the selector rows move
        // with Left/Right instead.
        let cursor = match form.active {
            BookField::Title => Some(("Title: ", 0u16)),
            BookField::Author => Some(("Author: ", 1)),
            BookField::TotalPages => Some(("Total pages: ", 2)),
            BookField::PagesRead => Some(("Pages read: ", 3)),
            BookField::Description => Some(("Description: ", 4)),
            BookField::Status | BookField::Rating => None,
        };
        if let Some((prefix, row)) = cursor {
            let cursor_x = inner.x + prefix.len() as u16 + form.value_len(form.active) as u16;
            frame.set_cursor_position((cursor_x, inner.y + row));
        }
    }

    fn draw_confirm_delete(frame: &mut Frame, area: Rect, confirm: &ConfirmBookDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Delete book").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!(
                "Are you sure you want to remove \"{}\" from your log?",
                confirm.title
            )),
            Line::from(""),
            Line::from(Span::styled(
                "y to delete \u{2022} n to cancel",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_search_bar(frame: &mut Frame, area: Rect, state: &SearchState) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title("Search by title or author");
        let paragraph = Paragraph::new(Span::raw(format!("Search: {}", state.query)))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x = inner.x + "Search: ".len() as u16 + state.query.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }
}

/// Lines for one book card in the list, mirroring the original row layout:
/// title, rating stars (only when rated), author, status, pages, progress,
/// and description, with the documented fallbacks.
fn book_card_lines(book: &Book) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        book.title.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    ))];

    if book.rating > 0 {
        lines.push(Line::from(Span::styled(
            format!("{} ({}/5)", star_line(book.rating), book.rating),
            Style::default().fg(Color::Yellow),
        )));
    }

    let author = if book.author.is_empty() {
        "Unknown author".to_string()
    } else {
        book.author.clone()
    };
    lines.push(Line::from(Span::styled(
        author,
        Style::default().fg(Color::DarkGray),
    )));

    lines.push(Line::from(Span::styled(
        book.status_label(),
        Style::default().fg(Color::Blue),
    )));

    let pages = if book.total_pages > 0 {
        format!("{} pages", book.total_pages)
    } else {
        "Pages not set".to_string()
    };
    lines.push(Line::from(Span::styled(
        pages,
        Style::default().fg(Color::DarkGray),
    )));

    if let Some(percent) = book.progress_percent() {
        lines.push(Line::from(Span::styled(
            format!(
                "Progress: {}/{} pages ({percent}%)",
                book.pages_read_capped(),
                book.total_pages
            ),
            Style::default().fg(Color::Green),
        )));
    }

    if !book.description.is_empty() {
        lines.push(Line::from(Span::styled(
            book.description.clone(),
            Style::default().fg(Color::Gray),
        )));
    }

    lines.push(Line::from(""));
    lines
}
