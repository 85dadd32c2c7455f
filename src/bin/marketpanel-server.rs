//! Dashboard Analytics API Server Binary
//!
//! Run with: `cargo run --bin marketpanel-server`

use marketpanel::{run_server, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Note: Tracing is initialized in run_server()
    // Set RUST_LOG environment variable to control log level:
    //   RUST_LOG=debug cargo run --bin marketpanel-server

    // Create configuration from environment variables or defaults
    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()
        .unwrap_or(3000);
    let database_path =
        std::env::var("DATABASE_PATH").unwrap_or_else(|_| "marketpanel.db".to_string());

    let config = ServerConfig::new(host, port, database_path);

    println!("Starting Market Panel API Server...");
    println!("   Host: {}", config.host);
    println!("   Port: {}", config.port);
    println!("   Database: {}", config.database_path);
    println!();
    println!("Available endpoints:");
    println!("  GET  /health                            - Health check");
    println!("  GET  /assets                            - List stored assets");
    println!("  GET  /assets/:asset/data                - Get raw close data");
    println!("  GET  /analytics/rolling/:base/:target   - Rolling correlation and beta");
    println!("  POST /analytics/matrix                  - Correlation/beta matrices");
    println!("  POST /events/aggregate                  - Event-impact aggregation");
    println!();

    // Run server
    run_server(config).await?;

    Ok(())
}
