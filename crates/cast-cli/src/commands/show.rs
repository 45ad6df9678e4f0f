//! Show command

use anyhow::Context;
use std::path::Path;

use cast_events::format_game_time;
use director::ScriptDocument;

pub fn run(script: &Path) -> anyhow::Result<()> {
    let document = ScriptDocument::load(script)
        .with_context(|| format!("loading script {}", script.display()))?;

    println!(
        "{} shots over {}",
        document.total_shots,
        format_game_time(document.duration)
    );
    for shot in &document.shots {
        let marker = if shot.executed { " (done)" } else { "" };
        println!("  {}{}", shot, marker);
    }

    Ok(())
}
