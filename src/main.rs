use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "draftsmith")]
#[command(version, about = "Brief-to-draft content pipeline with resumable runs")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding run workspaces (env: DRAFTSMITH_RUNS_DIR)
    #[arg(long, global = true)]
    pub runs_dir: Option<PathBuf>,

    /// Model name for generation commands (env: DRAFTSMITH_MODEL)
    #[arg(long, global = true)]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a starter brief and style profile into the current directory
    Init {
        /// Overwrite existing starter files
        #[arg(long)]
        force: bool,
    },
    /// Create a run from a brief file
    Create {
        /// Path to the brief (YAML)
        brief: PathBuf,
    },
    /// List runs, newest first
    List {
        /// Only runs with this status
        #[arg(long)]
        status: Option<String>,
        /// Only runs targeting this platform
        #[arg(long)]
        platform: Option<String>,
        /// Maximum number of runs to show
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Print a run artifact (meta, brief, core, clarification, or a draft name)
    Show {
        /// Run id or unique prefix
        run: String,
        /// Artifact name
        #[arg(default_value = "meta")]
        artifact: String,
    },
    /// Synthesize the content core for a run
    Core {
        /// Run id or unique prefix
        run: String,
        /// Skip the clarification pass
        #[arg(long)]
        skip_clarify: bool,
    },
    /// Answer pending clarification questions for a run
    Clarify {
        /// Run id or unique prefix
        run: String,
        /// Answer text; prompts interactively when omitted
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Render a platform draft from the content core
    Render {
        /// Run id or unique prefix
        run: String,
        /// Target platform (blog, linkedin, x)
        platform: String,
    },
    /// Apply an edit directive to the current draft of a platform
    Patch {
        /// Run id or unique prefix
        run: String,
        /// Target platform (blog, linkedin, x)
        platform: String,
        /// Edit directive, e.g. "shorten the intro"
        directive: String,
    },
    /// Serve the read-only query API
    Serve {
        /// Port to bind on localhost
        #[arg(short, long, default_value = "8321")]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;
    let config = draftsmith::config::Config::load(cli.runs_dir.clone(), cli.model.clone());

    match &cli.command {
        Commands::Init { force } => {
            cmd::cmd_init(*force)?;
        }
        Commands::Create { brief } => {
            cmd::cmd_create(&config, brief)?;
        }
        Commands::List {
            status,
            platform,
            limit,
        } => {
            cmd::cmd_list(&config, status.as_deref(), platform.as_deref(), *limit)?;
        }
        Commands::Show { run, artifact } => {
            cmd::cmd_show(&config, run, artifact)?;
        }
        Commands::Core { run, skip_clarify } => {
            cmd::cmd_core(&config, run, *skip_clarify).await?;
        }
        Commands::Clarify { run, message } => {
            cmd::cmd_clarify(&config, run, message.as_deref())?;
        }
        Commands::Render { run, platform } => {
            cmd::cmd_render(&config, run, platform).await?;
        }
        Commands::Patch {
            run,
            platform,
            directive,
        } => {
            cmd::cmd_patch(&config, run, platform, directive).await?;
        }
        Commands::Serve { port } => {
            cmd::cmd_serve(config, *port).await?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;
    Ok(())
}
