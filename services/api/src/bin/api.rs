//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        interviewer_llm::OpenAiInterviewerAdapter, sst::OpenAiSstAdapter, store::JsonFileStore,
        transport::{HttpPollTransport, SimulatedPollTransport},
    },
    config::{Config, TransportMode},
    error::ApiError,
    web::{api_router, state::AppState, ApiDoc},
};
use async_openai::{config::OpenAIConfig, Client};
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::Router;
use interview_core::ports::RealtimeTransport;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize the Conversation Store ---
    let store = Arc::new(JsonFileStore::new(config.storage_dir.clone()));
    info!("Conversation store rooted at {}", config.storage_dir.display());

    // --- 3. Initialize Service Adapters ---
    let openai_config = OpenAIConfig::new().with_api_key(
        config
            .openai_api_key
            .as_ref()
            .ok_or_else(|| ApiError::Internal("OPENAI_API_KEY is required".to_string()))?,
    );
    let openai_client = Client::with_config(openai_config);

    let sst_adapter = Arc::new(OpenAiSstAdapter::new(
        openai_client.clone(),
        config.sst_model.clone(),
    ));
    let interviewer = Arc::new(OpenAiInterviewerAdapter::new(
        openai_client.clone(),
        config.interviewer_model.clone(),
    ));

    // The transport variant is decided here, once; nothing downstream
    // branches on which one is live.
    let transport: Arc<dyn RealtimeTransport> = match config.transport_mode {
        TransportMode::Simulated => Arc::new(SimulatedPollTransport::new()),
        TransportMode::Http => {
            let upstream = config
                .realtime_upstream
                .clone()
                .ok_or_else(|| ApiError::Internal("REALTIME_UPSTREAM is required".to_string()))?;
            Arc::new(HttpPollTransport::new(
                upstream,
                config.realtime_token.clone(),
            ))
        }
    };
    transport.connect().await?;
    info!(
        "Realtime transport connected ({} mode)",
        config.transport_mode.as_str()
    );

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        store,
        config: config.clone(),
        sst_adapter,
        interviewer,
        transport,
        sessions: Mutex::new(HashMap::new()),
    });

    // --- 5. Configure CORS for the Browser Client ---
    let cors_origin = config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid CORS origin: {e}")))?;
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 6. Create the Web Router ---
    let app = Router::new()
        .merge(api_router(app_state).layer(cors))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 7. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
