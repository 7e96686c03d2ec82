mod cli;
mod infra;
mod recompute;
mod routes;
mod server;

use internship_match::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
