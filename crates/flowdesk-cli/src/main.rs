mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    config::ConfigSubcommand, notify::NotifySubcommand, project::ProjectSubcommand,
    user::UserSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "flowdesk",
    about = "Agency project workflow: intake, hand-offs, QC, client approval",
    version,
    propagate_version = true
)]
struct Cli {
    /// Workspace root (default: auto-detect from .flowdesk/)
    #[arg(long, global = true, env = "FLOWDESK_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a flowdesk workspace in the current directory
    Init {
        /// Agency name written to config.yaml
        #[arg(long)]
        agency: Option<String>,
    },

    /// Manage the user directory
    User {
        #[command(subcommand)]
        subcommand: UserSubcommand,
    },

    /// Sign in as a user
    Login { user_id: String },

    /// Sign out
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Open, list, and inspect projects
    Project {
        #[command(subcommand)]
        subcommand: ProjectSubcommand,
    },

    /// Hand a project to the next assignee
    Assign {
        code: String,
        user_id: String,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Set a project's status directly
    Status {
        code: String,
        /// Target status, e.g. design-complete
        status: String,
        #[arg(long)]
        notes: Option<String>,
    },

    /// List who may receive a project at a status
    Pool { status: String },

    /// List every workflow status with its label and tone
    Statuses,

    /// Show a project's transition history
    Timeline { code: String },

    /// Read your notifications
    Notify {
        #[command(subcommand)]
        subcommand: NotifySubcommand,
    },

    /// Validate the workspace configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init { agency } => cmd::init::run(&root, agency.as_deref(), cli.json),
        Commands::User { subcommand } => cmd::user::run(&root, subcommand, cli.json),
        Commands::Login { user_id } => cmd::session::login(&root, &user_id, cli.json),
        Commands::Logout => cmd::session::logout(&root, cli.json),
        Commands::Whoami => cmd::session::whoami(&root, cli.json),
        Commands::Project { subcommand } => cmd::project::run(&root, subcommand, cli.json),
        Commands::Assign {
            code,
            user_id,
            notes,
        } => cmd::transition::assign(&root, &code, &user_id, notes, cli.json),
        Commands::Status {
            code,
            status,
            notes,
        } => cmd::transition::status(&root, &code, &status, notes, cli.json),
        Commands::Pool { status } => cmd::pool::pool(&root, &status, cli.json),
        Commands::Statuses => cmd::pool::statuses(cli.json),
        Commands::Timeline { code } => cmd::timeline::run(&root, &code, cli.json),
        Commands::Notify { subcommand } => cmd::notify::run(&root, subcommand, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
