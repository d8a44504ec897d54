use crate::commands::{run_plan, run_predict, run_strategy, PlanArgs, PredictArgs, StrategyArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use outreach_ai::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Outreach Decision Engine",
    about = "Serve and exercise the admissions outreach decisioning core from the command line",
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
    /// Build a campaign strategy from a JSON fixture and print it
    Strategy(StrategyArgs),
    /// Score ad-hoc prospects read from a JSON file
    Predict(PredictArgs),
    /// Print a communication plan with drafted messages for one candidate
    Plan(PlanArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Seed the in-memory store from a campaign fixture (JSON)
    #[arg(long)]
    pub(crate) fixture: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Strategy(args) => run_strategy(args),
        Command::Predict(args) => run_predict(args),
        Command::Plan(args) => run_plan(args),
    }
}
