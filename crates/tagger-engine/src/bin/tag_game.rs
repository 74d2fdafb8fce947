//! CLI entry point: tag one game's moves.
//!
//! Reads a JSON array of per-move feature snapshots on stdin (or from a
//! file given as the first positional argument) and writes one JSON
//! `TagResult` array on stdout. `--config <path>` loads a threshold file;
//! without it the documented defaults apply.

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use tracing::info;

use tagger_core::config::TagConfig;
use tagger_core::features::FeatureContext;
use tagger_engine::GameTagger;

struct Args {
    config: Option<PathBuf>,
    input: Option<PathBuf>,
}

fn parse_args() -> Args {
    let mut args = Args { config: None, input: None };
    let raw: Vec<String> = std::env::args().skip(1).collect();
    let mut i = 0;
    while i < raw.len() {
        match raw[i].as_str() {
            "--config" => {
                if let Some(path) = raw.get(i + 1) {
                    args.config = Some(PathBuf::from(path));
                    i += 1;
                }
            }
            other => {
                if args.input.is_none() {
                    args.input = Some(PathBuf::from(other));
                }
            }
        }
        i += 1;
    }
    args
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args();

    let cfg = match &args.config {
        Some(path) => TagConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => TagConfig::default(),
    };

    let raw = match &args.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read stdin")?;
            buffer
        }
    };

    let moves: Vec<FeatureContext> =
        serde_json::from_str(&raw).context("Input must be a JSON array of move snapshots")?;
    info!(moves = moves.len(), "Tagging game");

    let mut tagger = GameTagger::new(cfg);
    let results = tagger.tag_game(&moves);

    serde_json::to_writer_pretty(std::io::stdout(), &results)?;
    println!();
    Ok(())
}
