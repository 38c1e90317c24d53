//! REST API server example
//!
//! Runs the tardis-dl job service with its REST API, configured from
//! environment variables (a `.env` file is honored).
//!
//! After starting, you can:
//! - View Swagger UI at http://localhost:8000/swagger-ui
//! - Submit jobs via POST http://localhost:8000/download
//! - Monitor jobs via GET http://localhost:8000/jobs

use std::sync::Arc;
use tardis_dl::api::start_api_server;
use tardis_dl::{Config, DownloadService};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env if present; real environment variables take precedence
    dotenv::dotenv().ok();

    // Initialize tracing (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    let bind_address = config.api.bind_address;

    let service = Arc::new(DownloadService::new(config).await?);
    let config = service.config.clone();

    println!("🚀 Starting tardis-dl REST API server");
    println!("📖 Swagger UI: http://{}/swagger-ui", bind_address);
    println!();
    println!("Example commands:");
    println!("  # Submit a download job");
    println!("  curl -X POST http://{}/download \\", bind_address);
    println!("    -H 'Content-Type: application/json' \\");
    println!("    -H 'X-Username: alice' \\");
    println!(
        "    -d '{{\"exchange\": \"binance\", \"symbols\": [\"BTC-USDT\"], \"start_date\": \"2024-01-01\", \"end_date\": \"2024-01-02\"}}'"
    );
    println!();
    println!("  # List jobs");
    println!("  curl -H 'X-Username: alice' http://{}/jobs", bind_address);

    // Start the API server (runs indefinitely)
    start_api_server(service, config).await?;

    Ok(())
}
