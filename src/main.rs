mod shutdown;
mod startup;

use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    info!("Starting rental calendar service");

    // Load configuration
    let config = startup::load_config()?;

    // Start the HTTP service
    startup::start_server(config).await
}
