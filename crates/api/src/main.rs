use qynnovel_api::{Settings, bootstrap, cors_layer, router};
use tower_http::trace::TraceLayer;
use tracing_error::ErrorLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .with(ErrorLayer::default())
        .init();

    let settings = Settings::load()?;
    let state = bootstrap(&settings).await?;

    let app = router(state)
        .layer(cors_layer(&settings.server.cors_origin)?)
        .layer(TraceLayer::new_for_http());

    let addr = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
