mod cli;
mod form;
mod infra;
mod routes;
mod server;

use sleep_smart::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
