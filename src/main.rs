use axum::{
    routing::{get, head, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use planpoker::jira::client::HttpJiraClient;
use planpoker::jira::options::JiraOptions;
use planpoker::room::moniker::PetnameRoomCodeGenerator;
use planpoker::room::registry::RoomRegistry;
use planpoker::room::sweep_task::{start_sweep_task, SweepConfig};
use planpoker::{jira, room};
use planpoker::shared::AppState;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "planpoker=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting planning poker server");

    let jira_options = Arc::new(JiraOptions::from_env());
    let registry = Arc::new(RoomRegistry::new(Arc::new(PetnameRoomCodeGenerator::new())));
    let ticket_provider = Arc::new(HttpJiraClient::new((*jira_options).clone()));

    let app_state = AppState::new(Arc::clone(&registry), ticket_provider, jira_options);

    // Background maintenance: stale-player eviction and empty-room disposal
    tokio::spawn(start_sweep_task(registry, SweepConfig::default()));

    let app = Router::new()
        .route("/api/ping", get(room::handlers::ping))
        .route("/api/rooms/create", post(room::handlers::create_room))
        .route("/api/rooms/:code", get(room::handlers::stream_room))
        .route("/api/rooms/:code/join", post(room::handlers::join_room))
        .route("/api/rooms/:code/reveal", get(room::handlers::reveal))
        .route("/api/rooms/:code/nextRound", get(room::handlers::next_round))
        .route("/api/rooms/:code/reset", get(room::handlers::reset))
        .route("/api/rooms/:code/set-host", post(room::handlers::set_host))
        .route("/api/rooms/:code/queue", post(room::handlers::queue_ticket))
        .route(
            "/api/rooms/:code/modifyQueue",
            post(room::handlers::modify_queue),
        )
        .route(
            "/api/rooms/:code/players/:player/vote",
            post(room::handlers::vote),
        )
        .route(
            "/api/rooms/:code/players/:player/spectate",
            get(room::handlers::spectate),
        )
        .route(
            "/api/rooms/:code/players/:player/participate",
            get(room::handlers::participate),
        )
        .route(
            "/api/rooms/:code/players/:player/leave",
            post(room::handlers::leave_room),
        )
        .route("/api/jira/login", get(jira::handlers::login))
        .route("/api/jira/callback", get(jira::handlers::callback))
        .route("/api/jira/user", head(jira::handlers::logged_in))
        .route("/api/jira/resources", get(jira::handlers::resources))
        .route("/api/jira/issues", get(jira::handlers::search_issues))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .unwrap();
    info!("Server running on http://localhost:{port}");
    axum::serve(listener, app).await.unwrap();
}
