//! `draftsmith create` - allocate a run from a brief file.

use anyhow::{Context, Result};
use console::style;
use std::path::Path;

use draftsmith::brief::RawBrief;
use draftsmith::config::Config;

pub fn cmd_create(config: &Config, brief_path: &Path) -> Result<()> {
    let raw_text = std::fs::read_to_string(brief_path)
        .with_context(|| format!("failed to read brief file {}", brief_path.display()))?;
    let raw = RawBrief::from_yaml(&raw_text)
        .with_context(|| format!("failed to parse {}", brief_path.display()))?;

    let orchestrator = super::orchestrator(config);
    let meta = orchestrator.create_run(raw)?;

    println!("{} {}", style("Created run").green().bold(), meta.run_id);
    println!("  topic:     {}", meta.topic);
    println!(
        "  platforms: {}",
        meta.platform_targets
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("  status:    {}", meta.status);
    println!();
    println!("Next: draftsmith core {}", meta.run_id);
    Ok(())
}
