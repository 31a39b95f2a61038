//! Renders the overlay for host messages read from stdin, one JSON document per line:
//!
//! ```text
//! {"action": "progress", "duration": 1500, "label": "Loading"}
//! {"action": "cancel"}
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use futures::io::BufReader;
use progress_overlay::prelude::*;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(about = "Render a host-driven progress overlay from JSON lines on stdin")]
struct Args {
    /// A JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the base URL completion callbacks are posted under.
    #[arg(long)]
    endpoint: Option<String>,

    /// The track width in cells. Defaults to the terminal width.
    #[arg(long)]
    width: Option<usize>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref()).context("failed to load config")?;
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
        config.validate().context("invalid --endpoint")?;
    }
    tracing::debug!(?config, "starting overlay");

    let mut overlay = TerminalOverlay::new().context("failed to set up the terminal")?;
    let width = match args.width {
        Some(width) => width,
        None => overlay.width()?.saturating_sub(2),
    };
    let doc = Document::new(width);
    let bar = ProgressBar::with_config(
        doc.elements(),
        HttpNotifier::new(&config.endpoint),
        config,
    );

    let messages = json_lines(BufReader::new(smol::Unblock::new(std::io::stdin())));

    let mut drawn = Ok(());
    smol::block_on(run(bar, messages, |_| {
        if drawn.is_ok() {
            drawn = overlay.draw(&render(&doc.snapshot()));
        }
    }));
    drawn.context("failed to draw the overlay")
}
