//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module     | Commands handled       |
//! |------------|------------------------|
//! | `init`     | `Init`                 |
//! | `create`   | `Create`               |
//! | `inspect`  | `List`, `Show`         |
//! | `generate` | `Core`, `Clarify`      |
//! | `render`   | `Render`               |
//! | `patch`    | `Patch`                |
//! | `serve`    | `Serve`                |

pub mod create;
pub mod generate;
pub mod init;
pub mod inspect;
pub mod patch;
pub mod render;
pub mod serve;

pub use create::cmd_create;
pub use generate::{cmd_clarify, cmd_core};
pub use init::cmd_init;
pub use inspect::{cmd_list, cmd_show};
pub use patch::cmd_patch;
pub use render::cmd_render;
pub use serve::cmd_serve;

use anyhow::Result;
use draftsmith::config::Config;
use draftsmith::llm::openai::OpenAiProvider;
use draftsmith::pipeline::Orchestrator;
use draftsmith::resources::ResourceResolver;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub(crate) fn orchestrator(config: &Config) -> Orchestrator {
    Orchestrator::new(config.runs_dir.clone(), ResourceResolver::from_env())
}

pub(crate) fn provider(config: &Config) -> Result<OpenAiProvider> {
    OpenAiProvider::from_env(config.model.clone(), config.request_timeout)
}

/// Spinner shown while a model call is in flight.
pub(crate) fn model_spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg}")
            .expect("progress bar template is a valid static string"),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}
