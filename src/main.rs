use keepsake::config::ServerConfig;
use keepsake::routes;
use keepsake::state::AppState;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = ServerConfig::from_env();
    let state = AppState::new(config.data_file.clone());

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .expect("failed to bind");

    tracing::info!(port = config.port, data_file = %config.data_file.display(), "keepsake store listening");
    axum::serve(listener, app).await.expect("server failed");
}
