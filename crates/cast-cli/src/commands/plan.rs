//! Plan command

use anyhow::Context;
use std::path::Path;
use tracing::{info, warn};

use cast_events::{format_game_time, EventOrigin, GameSeconds, JsonlEventSource};
use director::Director;

use super::load_config;

pub fn run(
    events: &Path,
    duration: GameSeconds,
    players: &[String],
    config: Option<&Path>,
    out: &Path,
) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let mut director = Director::new(config)?;

    let (plan, origin) = director
        .plan_replay(&JsonlEventSource::new(), events, duration, players)
        .with_context(|| format!("planning {}", events.display()))?;
    if origin == EventOrigin::Synthetic {
        warn!("Script planned from synthetic events, not the replay itself");
    }

    let files = Director::write_plan(&plan, out)?;
    info!("Wrote {}", files.timeline.display());
    info!("Wrote {}", files.script.display());

    let summary = &plan.timeline.summary;
    println!("Camera plan for {} ({:?} events)", format_game_time(duration), origin);
    println!("=================================");
    println!(
        "Moments: {} ({} high, {} medium, {} low)",
        summary.total_events,
        summary.by_priority.high,
        summary.by_priority.medium,
        summary.by_priority.low
    );
    println!(
        "Battles: {}  Expansions: {}  Tech: {}",
        summary.battles, summary.expansions, summary.tech
    );
    if summary.dropped_clusters > 0 {
        println!(
            "Skipped {} small skirmishes ({} deaths)",
            summary.dropped_clusters, summary.dropped_deaths
        );
    }
    for bucket in &summary.timeline {
        println!(
            "  {:>11}  {} moments, {} battles",
            bucket.label, bucket.count, bucket.battles
        );
    }
    println!("Shots: {}", plan.script.total_shots);

    Ok(())
}
