use crate::demo::{run_board, run_demo, BoardArgs, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use talentflow::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "TalentFlow Pipeline",
    about = "Serve and explore the candidate hiring pipeline from the command line",
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
    /// Render the kanban board for a candidate CSV export
    Board(BoardArgs),
    /// Run an end-to-end CLI demo covering moves, reorders, and the audit trail
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Candidate CSV export to seed an empty store with
    #[arg(long)]
    pub(crate) seed_csv: Option<PathBuf>,
    /// JSON snapshot file giving the store restart durability
    #[arg(long)]
    pub(crate) snapshot: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Board(args) => run_board(args),
        Command::Demo(args) => run_demo(args),
    }
}
