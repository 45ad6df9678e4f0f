//! Run command

use anyhow::Context;
use std::path::Path;
use tracing::info;

use cast_events::GameSeconds;
use director::{LiveSession, LoggingActuator, ScriptDocument, SystemClock, TimerFileSource};

use super::load_config;

pub async fn run(
    script: &Path,
    duration: Option<GameSeconds>,
    timer_file: &Path,
    config: Option<&Path>,
    speed: Option<f64>,
) -> anyhow::Result<()> {
    let mut config = load_config(config)?;
    if let Some(speed) = speed {
        config.clock.speed_multiplier = speed;
    }
    config.validate()?;

    let mut document = ScriptDocument::load(script)
        .with_context(|| format!("loading script {}", script.display()))?;
    if let Some(duration) = duration {
        document.duration = duration;
    }

    let mut session = LiveSession::new(
        document,
        TimerFileSource::new(timer_file),
        SystemClock::new(),
        LoggingActuator::default(),
        &config,
    );
    let stop = session.stop_signal();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, stopping session");
            stop.stop();
        }
    });

    println!("Press Ctrl+C to stop");
    let report = tokio::task::spawn_blocking(move || session.run()).await?;

    println!();
    println!("Session {}", report);
    if !report.started && !report.cancelled {
        anyhow::bail!("replay start was not detected on {}", timer_file.display());
    }

    Ok(())
}
