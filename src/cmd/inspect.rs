//! `draftsmith list` and `draftsmith show`.

use anyhow::{Context, Result};
use console::style;

use draftsmith::config::Config;
use draftsmith::models::Platform;
use draftsmith::registry::RunFilter;
use draftsmith::state::RunStatus;

pub fn cmd_list(
    config: &Config,
    status: Option<&str>,
    platform: Option<&str>,
    limit: Option<usize>,
) -> Result<()> {
    let status = status
        .map(|raw| raw.parse::<RunStatus>().map_err(anyhow::Error::msg))
        .transpose()?;
    let platform = platform
        .map(|raw| raw.parse::<Platform>().map_err(anyhow::Error::msg))
        .transpose()?;

    let orchestrator = super::orchestrator(config);
    let runs = orchestrator.list_runs(&RunFilter {
        status,
        platform,
        limit,
    })?;

    if runs.is_empty() {
        println!("No runs found in {}", config.runs_dir.display());
        return Ok(());
    }

    println!(
        "{:<28} {:<24} {:<20} {}",
        style("RUN").bold(),
        style("STATUS").bold(),
        style("UPDATED").bold(),
        style("TOPIC").bold()
    );
    for meta in &runs {
        println!(
            "{:<28} {:<24} {:<20} {}",
            meta.run_id,
            meta.status,
            meta.updated_at.format("%Y-%m-%d %H:%M:%S"),
            truncate(&meta.topic, 48)
        );
    }
    Ok(())
}

pub fn cmd_show(config: &Config, run: &str, artifact: &str) -> Result<()> {
    let orchestrator = super::orchestrator(config);
    let (resolved, content) = orchestrator.show_artifact(run, artifact)?;

    // Pretty-print JSON artifacts; everything else is passed through as-is.
    if resolved.ends_with(".json") {
        let value: serde_json::Value =
            serde_json::from_str(&content).with_context(|| format!("{resolved} is not valid JSON"))?;
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!("{content}");
        if !content.ends_with('\n') {
            println!();
        }
    }
    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}
