mod cli;
mod commands;
mod infra;
mod routes;
mod server;

use grants_ui::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
