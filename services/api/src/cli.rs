use crate::form::{
    run_history_export, run_history_list, run_predict, run_train, HistoryExportArgs,
    HistoryListArgs, PredictArgs, TrainArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use sleep_smart::config::AppConfig;
use sleep_smart::error::AppError;
use sleep_smart::telemetry;

#[derive(Parser, Debug)]
#[command(
    name = "sleep-smart",
    about = "Estimate sleep quality from daily habits and keep a sleep history",
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
    /// Score one day of habits and print suggestions
    Predict(PredictArgs),
    /// Fit the scoring model on synthetic data and report its error
    Train(TrainArgs),
    /// Inspect a user's stored sleep history
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryCommand {
    /// Print every stored entry and the dashboard averages
    List(HistoryListArgs),
    /// Export stored entries as CSV
    Export(HistoryExportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    dispatch(Cli::parse()).await
}

/// Installs logging once for every subcommand, then runs it.
async fn dispatch(cli: Cli) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args, config).await,
        Command::Predict(args) => run_predict(args, config).await,
        Command::Train(args) => run_train(args),
        Command::History {
            command: HistoryCommand::List(args),
        } => run_history_list(args, config).await,
        Command::History {
            command: HistoryCommand::Export(args),
        } => run_history_export(args, config).await,
    }
}
