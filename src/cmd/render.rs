//! `draftsmith render`.

use anyhow::Result;
use console::style;

use draftsmith::config::Config;
use draftsmith::models::Platform;

pub async fn cmd_render(config: &Config, run: &str, platform: &str) -> Result<()> {
    let platform: Platform = platform.parse().map_err(anyhow::Error::msg)?;
    let orchestrator = super::orchestrator(config);
    orchestrator.check_operation(run, draftsmith::state::Operation::Render)?;
    let provider = super::provider(config)?;

    let spinner = super::model_spinner(&format!("Rendering {platform} draft with {}", config.model));
    let report = orchestrator.render_platform(run, &provider, platform).await;
    spinner.finish_and_clear();
    let report = report?;

    println!(
        "{} {} v{} ({} chars)",
        style("Rendered").green().bold(),
        platform,
        report.draft.version,
        report.draft.body.chars().count()
    );
    for warning in &report.warnings {
        println!("  {} {warning}", style("warning:").yellow());
    }
    println!();
    println!("View:  draftsmith show {} {platform}", report.meta.run_id);
    println!(
        "Patch: draftsmith patch {} {platform} \"<directive>\"",
        report.meta.run_id
    );
    Ok(())
}
