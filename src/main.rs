use axum::{Extension, Router};
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;

mod catalog;
mod db;
mod google_calendar;
mod handlers;
mod interpreter;
mod middleware;
mod models;
mod openai_client;

use models::forum::ForumMessage;

// AppState holds the database pool, the optional external API clients and
// the forum broadcast channel. Everything else is per-request.
pub struct AppState {
    pub db_pool: sqlx::PgPool,
    pub openai_client: Option<openai_client::OpenAiClient>,
    pub google_calendar: google_calendar::GoogleCalendarClient,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub google_redirect_uri: Option<String>,
    pub google_calendar_scope: String,
    pub forum_tx: broadcast::Sender<ForumMessage>,
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_logging().expect("Failed to initialize logging");

    // Create the database connection pool (runs migrations)
    let db_pool = db::create_pool()
        .await
        .expect("Failed to create database pool.");

    // Seed the read-only course catalog
    if let Err(e) = db::seed_courses(&db_pool).await {
        tracing::error!("Failed to seed course catalog: {}", e);
    }

    // Initialize OpenAI client if API key is provided
    let openai_client = match std::env::var("OPENAI_API_KEY").ok() {
        Some(api_key) if !api_key.is_empty() => {
            tracing::info!("Initializing OpenAI chat client...");
            Some(openai_client::OpenAiClient::new(api_key))
        }
        _ => {
            tracing::warn!("OPENAI_API_KEY not found. The AI assistant will be disabled.");
            None
        }
    };

    // Load Google OAuth credentials
    let google_client_id = std::env::var("GOOGLE_CLIENT_ID").ok();
    let google_client_secret = std::env::var("GOOGLE_CLIENT_SECRET").ok();
    let google_redirect_uri = std::env::var("GOOGLE_REDIRECT_URI").ok();
    let google_calendar_scope = std::env::var("GOOGLE_CALENDAR_SCOPE")
        .unwrap_or_else(|_| google_calendar::DEFAULT_CALENDAR_SCOPE.to_string());

    if google_client_id.is_some() && google_client_secret.is_some() && google_redirect_uri.is_some()
    {
        tracing::info!("Google Calendar integration enabled");
    } else {
        tracing::warn!(
            "Google OAuth credentials not complete. Google Calendar export disabled."
        );
    }

    // Forum live feed
    let (forum_tx, _) = broadcast::channel(64);

    let shared_state = Arc::new(AppState {
        db_pool,
        openai_client,
        google_calendar: google_calendar::GoogleCalendarClient::new(),
        google_client_id,
        google_client_secret,
        google_redirect_uri,
        google_calendar_scope,
        forum_tx,
    });

    // Build our application with all routes and shared state
    let app = Router::new()
        .merge(handlers::auth::auth_routes())
        .merge(handlers::events::event_routes())
        .merge(handlers::assignments::assignment_routes())
        .merge(handlers::courses::course_routes())
        .merge(handlers::evaluations::evaluation_routes())
        .merge(handlers::chat::chat_routes())
        .merge(handlers::interpreter::interpreter_routes())
        .merge(handlers::google::google_routes())
        .merge(handlers::forum::forum_routes())
        .route("/api/status", axum::routing::get(api_status))
        .layer(axum::middleware::from_fn(
            middleware::logging::request_logging_middleware,
        ))
        .layer(CorsLayer::permissive())
        .layer(Extension(shared_state));

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(3000);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .expect("Failed to bind listener");
    tracing::info!("listening on {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.expect("Server error");
}

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "debug,studysync=trace,sqlx=info,reqwest=info,hyper=info,tower=info".to_string()
        } else {
            "info,studysync=info,sqlx=warn,reqwest=warn,hyper=warn,tower=warn".to_string()
        }
    });

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log_level))?;

    let fmt_layer = if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        // JSON logging for production log aggregation
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("StudySync starting up...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Build mode: {}",
        if cfg!(debug_assertions) {
            "development"
        } else {
            "production"
        }
    );

    Ok(())
}

// Health check and configuration overview
async fn api_status(
    Extension(state): Extension<Arc<AppState>>,
) -> axum::response::Json<serde_json::Value> {
    use serde_json::json;

    let db_status = match sqlx::query("SELECT 1").fetch_one(&state.db_pool).await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let openai_status = if state.openai_client.is_some() {
        "configured"
    } else {
        "not_configured"
    };
    let google_status = if state.google_client_id.is_some() && state.google_client_secret.is_some()
    {
        "configured"
    } else {
        "not_configured"
    };

    axum::response::Json(json!({
        "status": "operational",
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "database": db_status,
            "openai": openai_status,
            "google_calendar": google_status
        }
    }))
}
