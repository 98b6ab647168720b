use print_bridge::{Config, Server, ServerState, print_banner, setup_environment};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Environment (.env, logging)
    setup_environment()?;

    print_banner();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Print bridge starting...");

    // 2. Configuration
    let config = Config::from_env();

    // 3. State over the native spooler
    let state = ServerState::initialize(&config);

    // 4. Serve until Ctrl-C
    let server = Server::with_state(config, state);

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
