use anyhow::Result;
use rpchttp_prototype::echo::new_echo_router;
use rpchttp_prototype::{DEFAULT_ADDR, EchoService};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "echo_server=info,rpchttp_lite=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("ECHO_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let prefix = std::env::var("ROUTE_PREFIX").unwrap_or_default();

    let app = new_echo_router(EchoService::new(), &prefix)?.layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(addr = %listener.local_addr()?, prefix = %prefix, "echo server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("echo server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
