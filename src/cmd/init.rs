//! Starter file scaffolding for `draftsmith init`.

use anyhow::{Context, Result, bail};
use std::path::Path;

const STARTER_BRIEF: &str = "\
# Describe the piece you want drafted.
topic: \"Why most A/B tests fail\"
goal: inform            # inform | persuade | announce | educate | entertain
audience: \"growth and product teams\"
platform_targets: [blog, linkedin, x]
language: en
context_notes: |
  Add your raw material here: numbers, anecdotes, links, product details.
  The synthesis step refuses to invent facts you did not provide.
constraints:
  tone: direct
";

const STARTER_STYLE_PROFILE: &str = "\
# Optional override for the bundled style profile. To activate it, point
# DRAFTSMITH_RESOURCE_DIR at a directory containing profiles/style_profile.yaml.
forbidden_ai_smell:
  description: phrases that read as machine-written
  avoid_phrases:
    - \"game-changer\"
    - \"let's dive in\"
voice:
  tone: direct, concrete, lightly opinionated
  perspective: first person plural
  avoid: hedging and filler
";

pub fn cmd_init(force: bool) -> Result<()> {
    let files = [
        ("brief.yaml", STARTER_BRIEF),
        ("style_profile.yaml", STARTER_STYLE_PROFILE),
    ];

    for (name, _) in &files {
        if !force && Path::new(name).exists() {
            bail!("{name} already exists. Pass --force to overwrite.");
        }
    }
    for (name, content) in &files {
        std::fs::write(name, content).with_context(|| format!("failed to write {name}"))?;
        println!("Wrote {name}");
    }
    println!();
    println!("Edit brief.yaml, then: draftsmith create brief.yaml");
    Ok(())
}
