use crate::commands::{run_render, run_validate, RenderArgs, ValidateArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use grants_ui::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Grants UI tasklists",
    about = "Serve, render and validate grant application tasklists",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Render a tasklist's statuses for a set of saved answers
    Render(RenderArgs),
    /// Check a tasklist document for structural errors
    Validate(ValidateArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the directory tasklist documents are read from
    #[arg(long)]
    pub(crate) config_dir: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Render(args) => run_render(args),
        Command::Validate(args) => run_validate(args),
    }
}
