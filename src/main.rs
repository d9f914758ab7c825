use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cmd;

#[derive(Parser)]
#[command(name = "flowsync")]
#[command(version, about = "Sync task board state from GitHub webhooks")]
pub struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Path to the config file (defaults to .flowsync/flowsync.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the webhook server
    Serve {
        /// Listen address, e.g. 0.0.0.0:8080 or :8080
        #[arg(long)]
        addr: Option<String>,

        /// Database path
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
    /// Create the database and its tables, then exit
    InitDb {
        /// Database path
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
    /// Inspect or seed tasks
    Task {
        #[command(subcommand)]
        command: TaskCommands,

        /// Database path
        #[arg(long, global = true)]
        db_path: Option<PathBuf>,
    },
}

#[derive(Subcommand, Clone)]
pub enum TaskCommands {
    /// Create a task linked to a repository branch
    Add {
        #[arg(long)]
        title: String,

        /// Repository full name, e.g. octo/app
        #[arg(long)]
        repo: String,

        /// Branch prefix this task tracks, e.g. feature/login
        #[arg(long)]
        branch_hint: String,

        /// todo, in_progress or done
        #[arg(long, default_value = "todo")]
        status: String,

        #[arg(long, default_value = "1")]
        creator: i64,

        #[arg(long)]
        project: Option<i64>,
    },
    /// List tasks, optionally for one repository
    List {
        #[arg(long)]
        repo: Option<String>,
    },
}

fn init_tracing(verbose: bool, json: bool) {
    let default = if verbose {
        "flowsync=debug,tower_http=debug"
    } else {
        "flowsync=info,tower_http=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default.into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Serve { addr, db_path } => cmd::cmd_serve(config_path, addr, db_path).await?,
        Commands::InitDb { db_path } => cmd::cmd_init_db(config_path, db_path)?,
        Commands::Task { command, db_path } => match command {
            TaskCommands::Add {
                title,
                repo,
                branch_hint,
                status,
                creator,
                project,
            } => cmd::cmd_task_add(
                config_path,
                db_path,
                cmd::TaskArgs {
                    title,
                    repo,
                    branch_hint,
                    status,
                    creator,
                    project,
                },
            )?,
            TaskCommands::List { repo } => cmd::cmd_task_list(config_path, db_path, repo)?,
        },
    }

    Ok(())
}
