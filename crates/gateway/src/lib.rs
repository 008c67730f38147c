//! HTTP webhook gateway for taskmate.
//!
//! Exposes the assistant to messaging providers:
//! - `POST /whatsapp` — form-encoded `Body`/`From`, TwiML reply
//! - `POST /webhook` — JSON `{sender, message}`, JSON `{response}` reply
//! - `GET /` and `GET /health` — liveness probes
//!
//! Every sender identity gets its own session from the shared
//! [`SessionRegistry`]. The exit token is just another message here; only
//! the terminal loop ends a conversation on it.

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Request};
use axum::{
    Form, Router,
    extract::State,
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use taskmate_assistant::SessionRegistry;
use taskmate_channels::twiml;
use taskmate_channels::{WebhookConfig, WebhookGuard};

/// Request body cap for both webhooks.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Header carrying the hex HMAC-SHA256 of the raw body.
pub const SIGNATURE_HEADER: &str = "X-Signature";

const APOLOGY: &str = "Sorry, something went wrong on my side. Please try again.";

/// Shared application state for the gateway.
pub struct GatewayState {
    pub registry: Arc<SessionRegistry>,
    pub guard: WebhookGuard,
}

type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    let webhooks = Router::new()
        .route("/whatsapp", post(whatsapp_handler))
        .route("/webhook", post(webhook_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), signature_middleware));

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .merge(webhooks)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server.
pub async fn start(config: taskmate_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let provider = taskmate_providers::resolve(&config)?;

    let registry = Arc::new(SessionRegistry::from_config(provider, &config));
    let state = Arc::new(GatewayState {
        registry: registry.clone(),
        guard: WebhookGuard::new(WebhookConfig::from(&config.gateway)),
    });

    if state.guard.requires_signature() {
        info!(header = SIGNATURE_HEADER, "Webhook signatures required");
    }

    let app = build_router(state);

    info!(addr = %addr, data_dir = %config.storage.data_dir.display(), "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    registry.save_all().await?;
    info!("Gateway stopped, sessions saved");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

/// Reject webhook calls whose signature does not match the raw body.
async fn signature_middleware(
    State(state): State<SharedState>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if !state.guard.requires_signature() {
        return Ok(next.run(req).await);
    }

    let (parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| StatusCode::PAYLOAD_TOO_LARGE)?;
    let signature = parts
        .headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    if !state.guard.validate_signature(&bytes, signature) {
        warn!(path = %parts.uri.path(), "Webhook signature rejected");
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

/// Run one turn, turning failures into an apology.
async fn run_turn(state: &GatewayState, channel: &str, sender: &str, text: &str) -> String {
    info!(channel, sender, message_len = text.len(), "Message received");
    match state.registry.process(sender, text).await {
        Ok(reply) => reply.text,
        Err(e) => {
            error!(channel, sender, error = %e, "Turn failed");
            APOLOGY.into()
        }
    }
}

// --- Handlers ---

async fn root_handler() -> &'static str {
    "OK"
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    sessions: usize,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        sessions: state.registry.len().await,
    })
}

#[derive(Deserialize)]
struct WhatsAppForm {
    #[serde(rename = "Body", default)]
    body: String,
    #[serde(rename = "From")]
    from: String,
}

async fn whatsapp_handler(
    State(state): State<SharedState>,
    Form(form): Form<WhatsAppForm>,
) -> Response {
    if !state.guard.is_allowed(&form.from) {
        warn!(sender = %form.from, "Sender not allowed");
        return StatusCode::FORBIDDEN.into_response();
    }

    let text = form.body.trim();
    let xml = if text.is_empty() {
        twiml::empty_response()
    } else {
        twiml::message_response(&run_turn(&state, "whatsapp", &form.from, text).await)
    };

    ([(header::CONTENT_TYPE, "application/xml")], xml).into_response()
}

#[derive(Deserialize)]
struct WebhookRequest {
    sender: String,
    message: String,
}

#[derive(Serialize)]
struct WebhookResponse {
    response: String,
}

async fn webhook_handler(
    State(state): State<SharedState>,
    Json(payload): Json<WebhookRequest>,
) -> Result<Json<WebhookResponse>, StatusCode> {
    if let Err(e) = state.guard.authorize("webhook", &payload.sender) {
        warn!(error = %e, "Sender not allowed");
        return Err(StatusCode::FORBIDDEN);
    }

    let text = payload.message.trim();
    if text.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let response = run_turn(&state, "webhook", &payload.sender, text).await;
    Ok(Json(WebhookResponse { response }))
}
