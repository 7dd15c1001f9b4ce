//! `draftsmith patch`.

use anyhow::Result;
use console::style;

use draftsmith::config::Config;
use draftsmith::models::Platform;

pub async fn cmd_patch(config: &Config, run: &str, platform: &str, directive: &str) -> Result<()> {
    let platform: Platform = platform.parse().map_err(anyhow::Error::msg)?;
    let orchestrator = super::orchestrator(config);
    orchestrator.check_operation(run, draftsmith::state::Operation::Patch)?;
    let provider = super::provider(config)?;

    let spinner = super::model_spinner(&format!("Patching {platform} draft with {}", config.model));
    let report = orchestrator
        .apply_patch(run, &provider, platform, directive)
        .await;
    spinner.finish_and_clear();
    let report = report?;

    println!(
        "{} {platform} v{} -> v{}",
        style("Patched").green().bold(),
        report.record.from_version,
        report.record.to_version
    );
    if !report.record.changelog.is_empty() {
        println!("  changelog: {}", report.record.changelog);
    }
    for warning in &report.warnings {
        println!("  {} {warning}", style("warning:").yellow());
    }
    println!();
    println!("View: draftsmith show {} {platform}", report.meta.run_id);
    Ok(())
}
