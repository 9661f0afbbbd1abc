mod ui;

use anyhow::{Context, Result};
use dex_board::{init_logging, BoardConfig, EntrySource, FetchOutcome, FileSource};
use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;
use tracing::info;

/// Terminal mode logs here unless the config names a file
const DEFAULT_TUI_LOG: &str = "dex-board.log";

fn main() -> Result<()> {
    let mut config = BoardConfig::from_env().context("loading configuration")?;
    if config.log.file.is_none() {
        // stderr is hidden behind the alternate screen
        config.log.file = Some(PathBuf::from(DEFAULT_TUI_LOG));
    }
    init_logging(&config.log).context("initialising logging")?;

    info!(
        version = dex_board::VERSION,
        entries = %config.entries_path.display(),
        "starting dex-board"
    );

    let source: Arc<dyn EntrySource> = Arc::new(FileSource::new(config.entries_path.clone()));
    let (tx, rx) = mpsc::channel();

    spawn_fetch(Arc::clone(&source), tx.clone());

    let mut app = ui::App::new();
    ui::run_ui(&mut app, &rx, || spawn_fetch(Arc::clone(&source), tx.clone()))?;

    info!("dex-board closed");
    Ok(())
}

/// Run the fetch off the UI thread; its completion goes back over `tx`
fn spawn_fetch(source: Arc<dyn EntrySource>, tx: Sender<FetchOutcome>) {
    thread::spawn(move || {
        let outcome = source.fetch();
        // The UI may already be gone
        let _ = tx.send(outcome);
    });
}
