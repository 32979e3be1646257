use filevault_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (database, storage, services, routes)
    let app = filevault_api::setup::initialize_app(config.clone()).await?;

    // Start the server
    filevault_api::setup::server::start_server(&config, app.router).await?;

    if let Some(reaper) = app.reaper {
        reaper.abort();
    }
    Ok(())
}
