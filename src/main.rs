//! citydex: line-oriented terminal front end for the city directory.
//!
//! Loads the catalog, then reads one command per line from stdin and prints
//! the head of the current view after each one.
//!
//! Commands
//! --------
//!
//! - `/text`  search by name prefix (`/` alone clears it)
//! - `*`      toggle the favorite-only filter
//! - `f <id>` toggle an entry's favorite flag
//! - `s <id>` select an entry of the view
//! - `r`      reload the catalog
//! - `q`      quit
//!
//! Logs go to `citydex.log` in the data directory, never to the terminal.

use citydex::engine::DirectorySnapshot;
use citydex::{initialize, observability, Config, DirectoryEngine, EntryId, StoreEvent};
use clap::Parser;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[command(name = "citydex", version, about = "Search and bookmark cities from a remote catalog")]
struct CliArgs {
    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override a config value (repeatable), e.g. --set trace_level=debug
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_pair)]
    overrides: Vec<(String, String)>,

    /// Read the catalog from a local JSON file instead of the network
    #[arg(long)]
    catalog_file: Option<PathBuf>,

    /// Number of rows to print after each command
    #[arg(long, default_value_t = 10)]
    rows: usize,
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))
}

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Search(String),
    FavoriteOnly,
    Toggle(EntryId),
    Select(EntryId),
    Reload,
    Quit,
}

fn parse_input(line: &str) -> Result<Input, String> {
    let line = line.trim_end_matches(['\r', '\n']);
    if let Some(prefix) = line.strip_prefix('/') {
        return Ok(Input::Search(prefix.to_string()));
    }

    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or_default();
    let mut id = || {
        parts
            .next()
            .ok_or_else(|| format!("`{command}` needs an id"))?
            .parse::<EntryId>()
            .map_err(|e| format!("invalid id: {e}"))
    };

    match command {
        "*" => Ok(Input::FavoriteOnly),
        "f" => id().map(Input::Toggle),
        "s" => id().map(Input::Select),
        "r" => Ok(Input::Reload),
        "q" => Ok(Input::Quit),
        other => Err(format!("unknown command `{other}`")),
    }
}

fn build_config(args: &CliArgs) -> citydex::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let pairs: BTreeMap<String, String> = args.overrides.iter().cloned().collect();
    config.merge_pairs(&pairs);

    if let Some(path) = &args.catalog_file {
        config.catalog_file = Some(path.clone());
    }
    Ok(config)
}

fn render(snapshot: &DirectorySnapshot, rows: usize) {
    let filter = if snapshot.favorite_only { " ★ only" } else { "" };
    println!(
        "[{:?}] {} of {} | prefix \"{}\"{filter} | {} favorites",
        snapshot.status(),
        snapshot.results.len(),
        snapshot.total,
        snapshot.search_prefix,
        snapshot.favorite_count,
    );

    let selected = snapshot.selected.as_ref().map(|e| e.id);
    for entry in snapshot.results.iter().take(rows) {
        let cursor = if Some(entry.id) == selected { '>' } else { ' ' };
        let star = if entry.is_favorite { '★' } else { ' ' };
        println!(
            "{cursor}{star} {:>9}  {}, {}  ({:.4}, {:.4})",
            entry.id.0, entry.name, entry.country, entry.coordinates.latitude, entry.coordinates.longitude
        );
    }
    if snapshot.results.len() > rows {
        println!("   … {} more", snapshot.results.len() - rows);
    }
}

fn report_store_events(engine: &DirectoryEngine) {
    for event in engine.take_store_events() {
        match event {
            StoreEvent::WriteFailed { id, reason, .. } => {
                eprintln!("favorite {id} not saved: {reason} (retrying)");
                if let Err(e) = engine.retry_favorite(id) {
                    eprintln!("retry failed: {e}");
                }
            }
            StoreEvent::Unavailable { reason } => eprintln!("favorites unavailable: {reason}"),
            StoreEvent::Saved { .. } | StoreEvent::Removed { .. } => {}
        }
    }
}

async fn load(engine: &DirectoryEngine) {
    if let Err(e) = engine.load().await {
        eprintln!("{e}");
    }
}

#[tokio::main]
async fn main() -> citydex::Result<()> {
    let args = CliArgs::parse();
    let config = build_config(&args)?;

    observability::init_tracing(&config);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "citydex starting");

    let engine = initialize(&config)?;
    load(&engine).await;
    report_store_events(&engine);
    render(&engine.snapshot(), args.rows);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let outcome = match parse_input(&line) {
            Ok(Input::Search(prefix)) => engine.set_search_prefix(&prefix),
            Ok(Input::FavoriteOnly) => engine.set_favorite_only(!engine.snapshot().favorite_only),
            Ok(Input::Toggle(id)) => engine.toggle_favorite(id).map(|_| ()),
            Ok(Input::Select(id)) => engine.select(id),
            Ok(Input::Reload) => {
                load(&engine).await;
                Ok(())
            }
            Ok(Input::Quit) => break,
            Err(message) => {
                eprintln!("{message}");
                continue;
            }
        };

        if let Err(e) = outcome {
            eprintln!("{e}");
        }
        report_store_events(&engine);
        render(&engine.snapshot(), args.rows);
    }

    engine.flush().await?;
    report_store_events(&engine);
    tracing::info!(pending = engine.pending_writes(), "citydex exiting");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(parse_input("/new yo"), Ok(Input::Search("new yo".to_string())));
        assert_eq!(parse_input("/"), Ok(Input::Search(String::new())));
        assert_eq!(parse_input("*"), Ok(Input::FavoriteOnly));
        assert_eq!(parse_input("f 2988507"), Ok(Input::Toggle(EntryId(2988507))));
        assert_eq!(parse_input("s 7"), Ok(Input::Select(EntryId(7))));
        assert_eq!(parse_input("q"), Ok(Input::Quit));
        assert!(parse_input("f").is_err());
        assert!(parse_input("f paris").is_err());
        assert!(parse_input("x").is_err());
    }

    #[test]
    fn overrides_need_an_equals_sign() {
        assert_eq!(parse_pair("a=b=c"), Ok(("a".to_string(), "b=c".to_string())));
        assert!(parse_pair("trace_level").is_err());
    }
}
