//! Cache command - maintain the on-disk fragment store

use crate::cache::{FileEntry, FileStore};
use crate::cli::args::{CacheAction, CacheArgs, OutputFormat};
use crate::config::Config;
use crate::error::TrellisResult;
use console::style;
use std::io::{self, Write};
use tracing::debug;

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config) -> TrellisResult<()> {
    let dir = args.dir.unwrap_or_else(|| config.cache.fragments_dir());
    debug!("Fragment directory: {}", dir.display());
    let store = FileStore::new(dir);

    match args.action {
        CacheAction::List { format } => list_fragments(&store, format).await,
        CacheAction::Stats => show_stats(&store).await,
        CacheAction::Prune => prune_fragments(&store).await,
        CacheAction::Clear { yes } => clear_fragments(&store, yes).await,
    }
}

/// Format bytes as human-readable size (e.g., "1.5 MB")
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

async fn list_fragments(store: &FileStore, format: OutputFormat) -> TrellisResult<()> {
    let entries = store.entries().await?;

    if entries.is_empty() {
        println!("No cached fragments found.");
        return Ok(());
    }

    match format {
        OutputFormat::Table => print_fragment_table(&entries),
        OutputFormat::Json => print_fragment_json(&entries)?,
        OutputFormat::Plain => print_fragment_plain(&entries),
    }

    Ok(())
}

fn print_fragment_table(entries: &[FileEntry]) {
    println!(
        "{:<48} {:<10} {:<18} {:<18}",
        "KEY", "SIZE", "CREATED", "EXPIRES"
    );
    println!("{}", "-".repeat(96));

    for entry in entries {
        let expires = match entry.expires_at {
            Some(_) if entry.is_expired() => style("expired").red().to_string(),
            Some(at) => at.format("%Y-%m-%d %H:%M").to_string(),
            None => style("never").dim().to_string(),
        };

        println!(
            "{:<48} {:<10} {:<18} {:<18}",
            entry.key,
            format_bytes(entry.content.len() as u64),
            entry.created_at.format("%Y-%m-%d %H:%M"),
            expires
        );
    }

    println!();
    println!("Total: {} fragment(s)", entries.len());
}

fn print_fragment_json(entries: &[FileEntry]) -> TrellisResult<()> {
    #[derive(serde::Serialize)]
    struct FragmentJson<'a> {
        key: &'a str,
        bytes: usize,
        created_at: String,
        expires_at: Option<String>,
        expired: bool,
    }

    let json: Vec<FragmentJson<'_>> = entries
        .iter()
        .map(|e| FragmentJson {
            key: &e.key,
            bytes: e.content.len(),
            created_at: e.created_at.to_rfc3339(),
            expires_at: e.expires_at.map(|at| at.to_rfc3339()),
            expired: e.is_expired(),
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn print_fragment_plain(entries: &[FileEntry]) {
    for entry in entries {
        println!("{}", entry.key);
    }
}

async fn show_stats(store: &FileStore) -> TrellisResult<()> {
    let usage = store.usage().await?;

    println!("Directory: {}", store.dir().display());
    println!("Fragments: {}", usage.entries);
    println!("Expired:   {}", usage.expired);
    println!("Size:      {}", format_bytes(usage.bytes));
    Ok(())
}

async fn prune_fragments(store: &FileStore) -> TrellisResult<()> {
    let removed = store.prune_expired().await?;

    if removed == 0 {
        println!("No expired fragments.");
    } else {
        println!("{} pruned {} fragment(s)", style("✓").green(), removed);
    }
    Ok(())
}

async fn clear_fragments(store: &FileStore, skip_confirm: bool) -> TrellisResult<()> {
    let usage = store.usage().await?;

    if usage.entries == 0 {
        println!("No cached fragments to clear.");
        return Ok(());
    }

    println!(
        "This will remove {} fragment(s) from {}",
        usage.entries,
        store.dir().display()
    );

    if !skip_confirm {
        print!("Are you sure? [y/N] ");
        let _ = io::stdout().flush();

        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_err() {
            println!("Failed to read input, aborting.");
            return Ok(());
        }

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    let removed = store.clear().await?;
    println!("{} cleared {} fragment(s)", style("✓").green(), removed);

    Ok(())
}
