//! Plays a fixed sequence of host messages through the overlay: a run that completes, a run that
//! gets cancelled, and a zero-duration run.

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use progress_overlay::prelude::*;
use serde_json::{json, Value};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn script() -> Vec<(Duration, Value)> {
    vec![
        (
            Duration::ZERO,
            json!({"action": "progress", "duration": 2000, "label": "Loading assets"}),
        ),
        (
            Duration::from_millis(3500),
            json!({"action": "progress", "duration": "3000", "label": "Crafting"}),
        ),
        (Duration::from_millis(1500), json!({"action": "cancel"})),
        (
            Duration::from_millis(1500),
            json!({"action": "progress", "duration": 0, "label": "Instant"}),
        ),
    ]
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(None).context("failed to load config")?;
    let mut overlay = TerminalOverlay::new().context("failed to set up the terminal")?;
    let doc = Document::new(overlay.width()?.saturating_sub(2).min(60));
    let bar = ProgressBar::with_config(
        doc.elements(),
        HttpNotifier::new(&config.endpoint),
        config,
    );

    let messages = stream::iter(script()).then(|(delay, message)| async move {
        smol::Timer::after(delay).await;
        message
    });

    let mut drawn = Ok(());
    smol::block_on(run(bar, messages, |_| {
        if drawn.is_ok() {
            drawn = overlay.draw(&render(&doc.snapshot()));
        }
    }));
    drawn.context("failed to draw the overlay")?;

    println!("done!");
    Ok(())
}
