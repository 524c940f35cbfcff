use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use clap::Parser;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use vidrec::services::ingest::ImportSummary;
use vidrec::utils::validation::{validate_k, validate_user_id};
use vidrec::{
    init_tracing, AppState, CatalogItem, Channel, ChannelUpsert, Config, InteractionCreate,
    InteractionEvent, InteractionImport, RecError, VideoUpsert,
};

const DEFAULT_VIDEO_LIMIT: usize = 200;
const MAX_VIDEO_LIMIT: usize = 1000;

#[derive(Parser, Debug)]
#[command(author, version, about = "Content-based video recommendation server", long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[derive(Debug, Deserialize)]
struct RecommendationQuery {
    user_id: String,
    k: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct CacheClearQuery {
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct VideoListQuery {
    limit: Option<usize>,
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn get_recommendations(
    State(state): State<AppState>,
    Query(params): Query<RecommendationQuery>,
) -> Result<Response, RecError> {
    validate_user_id(&params.user_id)?;
    let settings = &state.config.recommendation;
    let k = validate_k(params.k, settings.default_k, settings.max_k)?;

    let payload = state
        .recommendation_service
        .recommend_payload(&params.user_id, k)
        .await
        .map_err(|e| {
            error!("Failed to get recommendations for {}: {}", params.user_id, e);
            e
        })?;

    Ok(([(header::CONTENT_TYPE, "application/json")], payload).into_response())
}

async fn clear_cache(
    State(state): State<AppState>,
    Query(params): Query<CacheClearQuery>,
) -> Result<Json<Value>, RecError> {
    validate_user_id(&params.user_id)?;
    let cleared = state
        .recommendation_service
        .invalidate_user_cache(&params.user_id)
        .await?;

    Ok(Json(json!({
        "status": "ok",
        "message": format!(
            "Cleared {} recommendation cache keys for {}",
            cleared, params.user_id
        ),
        "cleared": cleared,
    })))
}

async fn create_interaction(
    State(state): State<AppState>,
    Json(payload): Json<InteractionCreate>,
) -> Result<Json<InteractionEvent>, RecError> {
    let event = state.ingest_service.record_interaction(payload).await?;
    Ok(Json(event))
}

async fn import_interactions(
    State(state): State<AppState>,
    Json(payload): Json<InteractionImport>,
) -> Result<Json<ImportSummary>, RecError> {
    let summary = state.ingest_service.import_interactions(payload).await?;
    Ok(Json(summary))
}

async fn upsert_video(
    State(state): State<AppState>,
    Json(payload): Json<VideoUpsert>,
) -> Result<Json<CatalogItem>, RecError> {
    let video = state.ingest_service.upsert_video(payload).await?;
    Ok(Json(video))
}

async fn upsert_channel(
    State(state): State<AppState>,
    Json(payload): Json<ChannelUpsert>,
) -> Result<Json<Channel>, RecError> {
    let channel = state.ingest_service.upsert_channel(payload).await?;
    Ok(Json(channel))
}

async fn list_videos(
    State(state): State<AppState>,
    Query(params): Query<VideoListQuery>,
) -> Result<Json<Vec<CatalogItem>>, RecError> {
    let limit = params.limit.unwrap_or(DEFAULT_VIDEO_LIMIT);
    if limit == 0 || limit > MAX_VIDEO_LIMIT {
        return Err(RecError::InvalidInput(format!(
            "limit must be between 1 and {}",
            MAX_VIDEO_LIMIT
        )));
    }

    let videos = state.ingest_service.list_videos(limit).await?;
    Ok(Json(videos))
}

async fn get_stats(State(state): State<AppState>) -> Json<HashMap<String, u64>> {
    Json(state.recommendation_service.get_serving_stats())
}

fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/recommendations", get(get_recommendations))
        .route("/cache/clear", post(clear_cache))
        .route("/interactions", post(create_interaction))
        .route("/interactions/import", post(import_interactions))
        .route("/videos/upsert", post(upsert_video))
        .route("/channels/upsert", post(upsert_channel))
        .route("/videos", get(list_videos))
        .route("/stats", get(get_stats))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    std::env::set_var("RUST_LOG", &args.log_level);
    init_tracing();

    let config = Config::load_or_default(&args.config)?;
    info!("Starting vidrec server with config: {:?}", config.server);

    let addr = config.server.socket_addr()?;
    let state = AppState::new(config).await?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
