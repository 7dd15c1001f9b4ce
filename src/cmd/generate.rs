//! `draftsmith core` and `draftsmith clarify`.

use anyhow::Result;
use console::style;
use dialoguer::Input;

use draftsmith::config::Config;
use draftsmith::pipeline::CoreOutcome;

pub async fn cmd_core(config: &Config, run: &str, skip_clarify: bool) -> Result<()> {
    let orchestrator = super::orchestrator(config);
    orchestrator.check_operation(run, draftsmith::state::Operation::GenerateCore)?;
    let provider = super::provider(config)?;

    let spinner = super::model_spinner(&format!("Synthesizing content core with {}", config.model));
    let outcome = orchestrator.generate_core(run, &provider, skip_clarify).await;
    spinner.finish_and_clear();

    match outcome? {
        CoreOutcome::Generated { core, meta } => {
            println!("{} {}", style("Core generated for").green().bold(), meta.run_id);
            println!("  thesis: {}", core.thesis);
            println!("  angle:  {}", core.angle);
            println!("  points: {}", core.points.len());
            println!();
            println!("Next: draftsmith render {} <platform>", meta.run_id);
        }
        CoreOutcome::NeedsClarification { questions, meta } => {
            println!(
                "{} {}",
                style("Clarification needed before synthesis:").yellow().bold(),
                meta.run_id
            );
            for (i, question) in questions.iter().enumerate() {
                println!("  {}. {question}", i + 1);
            }
            println!();
            if meta.status == draftsmith::state::RunStatus::AwaitingClarification {
                println!("Answer with: draftsmith clarify {} -m \"...\"", meta.run_id);
            }
            println!("Or bypass:    draftsmith core {} --skip-clarify", meta.run_id);
        }
    }
    Ok(())
}

pub fn cmd_clarify(config: &Config, run: &str, message: Option<&str>) -> Result<()> {
    let orchestrator = super::orchestrator(config);

    let answer = match message {
        Some(text) => text.to_string(),
        None => {
            let run_id = orchestrator.registry().resolve(run)?;
            if let Some(pending) = orchestrator.pending_questions(&run_id) {
                println!("{}", style("Pending questions:").bold());
                for (i, question) in pending.questions.iter().enumerate() {
                    println!("  {}. {question}", i + 1);
                }
            }
            Input::new().with_prompt("Your answer").interact_text()?
        }
    };

    let meta = orchestrator.apply_clarification(run, &answer)?;
    println!("{} {}", style("Answer recorded for").green().bold(), meta.run_id);
    println!("Re-run: draftsmith core {}", meta.run_id);
    Ok(())
}
