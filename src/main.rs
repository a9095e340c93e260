use gateway_discovery::cli::run_cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before any configuration is read from the environment
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    run_cli().await
}
