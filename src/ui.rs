//! Ratatui front-end for the reading log: the login gate, the book list with
//! its filter/sort/search controls, the add/edit forms, and the delete
//! confirmation. Everything here reads the collection through `Library` and
//! writes through its mutation methods; no UI state ever touches the store.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
