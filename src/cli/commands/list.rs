//! `list` command
//!
//! Prints the slides of a deck in order.

use std::path::PathBuf;

use serde::Serialize;

use crate::cli::args::{ListArgs, OutputFormat};
use crate::config::loader::ConfigLoader;
use crate::config::schema::{DeckConfig, SlideKind};
use crate::error::DeckError;

/// One row of the listing.
#[derive(Debug, Serialize)]
pub struct SlideEntry<'a> {
    /// 1-based position
    pub number: usize,
    /// Slide id
    pub id: &'a str,
    /// Slide kind
    pub kind: SlideKind,
    /// Most descriptive line of text
    pub headline: &'a str,
}

/// List the slides of a deck.
///
/// # Errors
///
/// Returns a config error if the deck does not load.
pub fn run(args: &ListArgs) -> Result<(), DeckError> {
    let loaded = ConfigLoader::with_defaults().load_or_default(args.deck.as_deref())?;
    let entries = entries(&loaded.config);

    match args.format {
        OutputFormat::Human => {
            let source = args
                .deck
                .as_ref()
                .map_or_else(|| "<built-in deck>".to_string(), |p: &PathBuf| p.display().to_string());
            println!("{} ({source})", loaded.config.deck.title);
            let id_width = entries.iter().map(|e| e.id.len()).max().unwrap_or(0);
            for entry in &entries {
                println!(
                    "{:>3}  {:<id_width$}  {:<8}  {}",
                    entry.number, entry.id, entry.kind, entry.headline
                );
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
    }
    Ok(())
}

/// Builds the listing rows for a deck.
#[must_use]
pub fn entries(config: &DeckConfig) -> Vec<SlideEntry<'_>> {
    config
        .slides
        .iter()
        .enumerate()
        .map(|(i, slide)| SlideEntry {
            number: i + 1,
            id: &slide.id,
            kind: slide.kind,
            headline: slide.headline(),
        })
        .collect()
}
