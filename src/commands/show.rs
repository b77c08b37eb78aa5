//! `davreplay show` command.

use crate::cassette::config::{RecorderConfig, StorageStrategy};
use crate::cassette::format::InteractionEntry;
use crate::cassette::store::open_store;

/// Execute the `show` command.
///
/// Prints one line per recorded interaction, in replay order.
///
/// # Errors
///
/// Returns an error string if the cassette cannot be loaded.
pub fn run(config: &RecorderConfig, context: &str, numbered: bool) -> Result<(), String> {
    let strategy = if numbered { StorageStrategy::Numbered } else { config.strategy };
    let mut store = open_store(strategy, &config.base_directory, false);
    store.set_context(context).map_err(|e| e.to_string())?;
    let entries = store.entries().map_err(|e| e.to_string())?;

    if entries.is_empty() {
        println!("No interactions recorded for {context}.");
        return Ok(());
    }

    println!("Cassette: {} ({} interactions)", store.context().unwrap_or(context), entries.len());
    for (i, entry) in entries.iter().enumerate() {
        println!("{}", format_line(i + 1, entry));
    }
    Ok(())
}

fn format_line(index: usize, entry: &InteractionEntry) -> String {
    format!(
        "{index:>4}. {} {} -> {} ({})",
        entry.request.method, entry.request.url, entry.response.status, entry.request.description
    )
}
