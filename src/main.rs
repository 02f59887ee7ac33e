//! Binary entry point. The bootstrapping pipeline is: set up file logging,
//! open the SQLite-backed store, hydrate the collection exactly once through
//! the bridge, hand the bridge to the save worker, and drive the Ratatui
//! event loop until the user exits. A corrupt stored blob is reported (log
//! plus footer) before the session continues against an empty collection.

use std::fs::File;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use reading_log::store::{data_dir, SqliteStore, DB_FILE_NAME};
use reading_log::{run_app, App, Library, SaveWorker, StoreBridge};

/// Log file name stored inside the application data directory. Logs go to a
/// file because the UI owns the terminal's alternate screen.
const LOG_FILE_NAME: &str = "reading-log.log";

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let data_dir = data_dir()?;
    init_tracing(&data_dir.join(LOG_FILE_NAME))?;

    let store = SqliteStore::open(&data_dir.join(DB_FILE_NAME))?;
    let mut bridge = StoreBridge::new(store);
    let (books, load_error) = match bridge.load() {
        Ok(books) => (books, None),
        Err(err) => {
            error!(%err, "hydration failed, continuing with an empty collection");
            (Vec::new(), Some(err.to_string()))
        }
    };
    info!(count = books.len(), "collection hydrated");

    let worker = SaveWorker::spawn(bridge);
    let mut library = Library::new(books, worker.queue());

    let mut app = App::new(&mut library, load_error);
    let result = run_app(&mut app);
    drop(app);

    // Close the library's queue handle so the worker can drain and join.
    drop(library);
    worker.stop();
    info!("shut down cleanly");

    result
}

fn init_tracing(log_path: &std::path::Path) -> Result<()> {
    let log_file = File::options()
        .create(true)
        .append(true)
        .open(log_path)
        .context("failed to open log file")?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}
