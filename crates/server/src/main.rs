use hatbundle_server::config::ServerConfig;
use hatbundle_server::{app, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "server=info,hatbundle_server=info".into()),
        )
        .init();

    let config = ServerConfig::load()?;
    tracing::info!(
        project = %config.build.project_dir.display(),
        tool = %config.build.tool.program.display(),
        "build tool configured"
    );

    let state = AppState::new(&config);
    let router = app(state, &config);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server running on http://{}", config.bind_addr);
    axum::serve(listener, router).await?;
    Ok(())
}
