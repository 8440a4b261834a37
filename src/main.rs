//! # Beacon
//!
//! Highlights every occurrence of the selected word in a file and can fold
//! away the lines that hold none.
//!
//! ## Quick Start
//!
//! ```bash
//! # Highlight the word at line 3, columns 5-9
//! cargo run -- src/main.rs --select 3:5-3:9
//!
//! # Fold everything else, as JSON
//! cargo run -- src/main.rs --select 3:5-3:9 --fold --json
//! ```

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use beacon_core::{
    Command, Config, ConfigStore, DocumentId, EventBus, EventHandler, HighlightEvent, Input,
    OccurrenceSearch, SelectionManager, Workspace,
};
use beacon_text::{Position, Range};

/// Beacon - highlight the selected word everywhere
#[derive(Parser, Debug)]
#[command(name = "beacon")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// File to search
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Selection as LINE:COL-LINE:COL (1-indexed); may be repeated
    #[arg(short, long, value_name = "RANGE", value_parser = parse_range)]
    select: Vec<Range>,

    /// Select every highlighted occurrence
    #[arg(long)]
    select_all: bool,

    /// Fold the lines without highlights
    #[arg(short, long)]
    fold: bool,

    /// Match case-insensitively
    #[arg(short, long)]
    ignore_case: bool,

    /// Also match inside longer words
    #[arg(long)]
    partial_words: bool,

    /// Config file (defaults to the user config directory)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Parses `LINE:COL-LINE:COL`, or a bare `LINE:COL` cursor, from 1-indexed
/// coordinates.
fn parse_range(s: &str) -> Result<Range, String> {
    let position = |part: &str| -> Result<Position, String> {
        let (line, column) = part
            .split_once(':')
            .ok_or_else(|| format!("expected LINE:COL, got `{part}`"))?;
        let index = |n: &str| match n.trim().parse::<usize>() {
            Ok(n) if n > 0 => Ok(n - 1),
            _ => Err(format!("`{n}` is not a positive number")),
        };
        Ok(Position::new(index(line)?, index(column)?))
    };

    match s.split_once('-') {
        Some((start, end)) => Ok(Range::new(position(start)?, position(end)?)),
        None => Ok(Range::empty(position(s)?)),
    }
}

/// One highlighted occurrence.
#[derive(Debug, Serialize)]
struct Match {
    range: Range,
    /// Marked on the selected layer rather than the visible one
    selected: bool,
}

/// What a run produced.
#[derive(Debug, Serialize)]
struct Report {
    file: String,
    needle: Option<String>,
    matches: Vec<Match>,
    folds: Vec<Range>,
    selections: Vec<Range>,
}

/// Collects the matches of the last recomputation from the event stream.
fn collect_matches(events: Vec<HighlightEvent>, document: DocumentId) -> Vec<Match> {
    let mut matches = Vec::new();
    for event in events {
        match event {
            HighlightEvent::MarkerLayerRemoved { document: d } if d == document => matches.clear(),
            HighlightEvent::MarkersAdded {
                document: d,
                visible,
                selected,
            } if d == document => {
                let visible = visible.into_iter().map(|range| Match { range, selected: false });
                let selected = selected.into_iter().map(|range| Match { range, selected: true });
                matches.extend(visible.chain(selected));
            }
            _ => {}
        }
    }
    matches.sort_by_key(|m| m.range);
    matches
}

fn print_report(report: &Report, workspace: &Workspace, document: DocumentId) {
    let needle = report.needle.as_deref().unwrap_or("");
    println!(
        "{}: {} match{} for {:?}",
        report.file,
        report.matches.len(),
        if report.matches.len() == 1 { "" } else { "es" },
        needle
    );

    let Some(doc) = workspace.document(document) else {
        return;
    };
    let buffer = doc.buffer();

    if report.folds.is_empty() {
        for m in &report.matches {
            let line = buffer.line(m.range.start.line).unwrap_or_default();
            let marker = if m.selected { '*' } else { ' ' };
            println!("{marker} {:<14} {}", m.range.to_string(), line.trim_end());
        }
        return;
    }

    // Folded view: hidden spans collapse to a single marker line.
    let mut line = 0;
    while line < buffer.len_lines() {
        if let Some(fold) = report.folds.iter().find(|f| f.start.line == line) {
            println!("      ⋯ {} line(s) folded", fold.line_count());
            line = fold.end.line + 1;
            continue;
        }
        let text = buffer.line(line).unwrap_or_default();
        println!("{:>5} {}", line + 1, text.trim_end());
        line += 1;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    let log_level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    tracing::info!("Starting Beacon v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration, then apply flags on top
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::load(),
    };
    config.highlight.ignore_case |= args.ignore_case;
    if args.partial_words {
        config.highlight.only_whole_words = false;
    }

    let mut workspace = Workspace::new();
    let document = workspace
        .open_file(&args.file)
        .with_context(|| format!("failed to open {}", args.file.display()))?;
    if !args.select.is_empty() {
        workspace.set_selections(document, args.select.clone())?;
    }

    // Subscribe before construction: the first highlights are computed then.
    let bus = EventBus::new();
    let mut events = EventHandler::new(bus.subscribe());
    let manager = SelectionManager::with_event_bus(
        workspace,
        OccurrenceSearch::new(),
        ConfigStore::new(config),
        bus,
    );

    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(manager.run(rx));
    if args.select_all {
        tx.send(Input::Command(Command::SelectAll))?;
    }
    if args.fold {
        tx.send(Input::Command(Command::FoldNonSelected))?;
    }
    // Closing the channel tears the manager down once the queue is drained.
    drop(tx);
    let manager = task.await.context("selection manager task failed")?;

    let workspace = manager.host();
    let doc = workspace
        .document(document)
        .context("document vanished during the run")?;
    let report = Report {
        file: doc.name().to_string(),
        needle: doc.selected_text(),
        matches: collect_matches(events.drain(), document),
        folds: doc.folds().to_vec(),
        selections: doc.selections().to_vec(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, workspace, document);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["beacon", "notes.txt"]);
        assert_eq!(args.file, PathBuf::from("notes.txt"));
        assert!(args.select.is_empty());
        assert!(!args.fold);
    }

    #[test]
    fn test_args_with_selections() {
        let args = Args::parse_from([
            "beacon", "test.rs", "-s", "3:5-3:9", "--select", "1:1", "--fold", "-vv",
        ]);
        assert_eq!(
            args.select,
            vec![
                Range::from_coords((2, 4), (2, 8)),
                Range::empty(Position::ZERO),
            ]
        );
        assert!(args.fold);
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_parse_range_rejects_garbage() {
        assert!(parse_range("0:1-1:1").is_err());
        assert!(parse_range("abc").is_err());
        assert!(parse_range("1:x").is_err());
    }

    proptest::proptest! {
        #[test]
        fn test_parse_range_reads_display_output(
            a in (0usize..500, 0usize..200),
            b in (0usize..500, 0usize..200),
        ) {
            let range = Range::from_coords(a, b);
            proptest::prop_assert_eq!(parse_range(&range.to_string()), Ok(range));
        }
    }

    #[test]
    fn test_collect_matches_keeps_last_cycle() {
        let doc = DocumentId::new();
        let other = DocumentId::new();
        let first = Range::from_coords((0, 0), (0, 3));
        let second = Range::from_coords((2, 0), (2, 3));
        let events = vec![
            HighlightEvent::MarkersAdded {
                document: doc,
                visible: vec![first],
                selected: Vec::new(),
            },
            HighlightEvent::MarkerLayerRemoved { document: doc },
            HighlightEvent::MarkersAdded {
                document: doc,
                visible: vec![second],
                selected: vec![first],
            },
            HighlightEvent::MarkersAdded {
                document: other,
                visible: vec![first],
                selected: Vec::new(),
            },
            HighlightEvent::FinishedAddingMarkers,
        ];

        let matches = collect_matches(events, doc);
        let ranges: Vec<(Range, bool)> = matches.iter().map(|m| (m.range, m.selected)).collect();
        assert_eq!(ranges, vec![(first, true), (second, false)]);
    }

    #[tokio::test]
    async fn test_fold_run_on_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "foo\nbar\nfoo\nbaz\n").unwrap();

        let mut workspace = Workspace::new();
        let doc = workspace.open_file(&path).unwrap();
        workspace
            .set_selections(doc, vec![Range::from_coords((0, 0), (0, 3))])
            .unwrap();
        let mut manager =
            SelectionManager::new(workspace, OccurrenceSearch::new(), ConfigStore::default());
        manager.execute(Command::FoldNonSelected);

        let folds = manager.host().document(doc).unwrap().folds().to_vec();
        assert_eq!(
            folds,
            vec![
                Range::from_coords((1, 0), (1, 3)),
                Range::from_coords((3, 0), (4, 0)),
            ]
        );
    }
}
