mod cli;
mod infra;
mod routes;
mod server;

use ticket_audit::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
