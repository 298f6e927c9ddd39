//! HTTP turn API: one POST endpoint carrying the prompt and the
//! caller-echoed dialogue context.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};

use gezgin::external::{ChromaVectorSearch, OsrmRouting, WeatherApiService};
use gezgin::{DialogueEngine, Gazetteer, PlannerConfig, TurnReply, TurnRequest};

#[derive(Parser)]
#[command(name = "gezgin-server")]
#[command(about = "Slot-filling travel itinerary API for Izmir")]
struct Args {
    #[arg(long, default_value = "0.0.0.0:8000")]
    bind_addr: String,

    #[arg(long, env = "GEZGIN_CORPUS", default_value = "data/place_category_suggestions.json")]
    corpus: PathBuf,

    #[arg(long, env = "CHROMA_URL", default_value = "http://127.0.0.1:8001")]
    vector_url: String,

    #[arg(long, env = "CHROMA_COLLECTION", default_value = "izmir_locations")]
    vector_collection: String,

    #[arg(long, env = "WEATHER_API_KEY")]
    weather_api_key: Option<String>,

    #[arg(long, default_value = "http://api.weatherapi.com/v1")]
    weather_url: String,

    #[arg(long, env = "OSRM_URL", default_value = "http://router.project-osrm.org")]
    osrm_url: String,

    /// Upper bound for any single external call, in seconds.
    #[arg(long, default_value = "10")]
    external_timeout: u64,
}

#[derive(Clone)]
struct AppState {
    engine: Arc<DialogueEngine>,
}

async fn health_check() -> &'static str {
    "Gezgin itinerary API is running"
}

async fn generate_itinerary(
    State(state): State<AppState>,
    Json(request): Json<TurnRequest>,
) -> Json<TurnReply> {
    match state
        .engine
        .process_turn(&request.prompt, request.context)
        .await
    {
        Ok(reply) => Json(reply),
        Err(e) => {
            // Domain issues never end up here; this is the last line of
            // defense, and it still answers in the normal reply shape.
            tracing::error!("Unhandled fault while processing turn: {:#}", e);
            Json(TurnReply::internal_error())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    let config = PlannerConfig {
        corpus_path: args.corpus,
        vector: gezgin::config::VectorConfig {
            endpoint: args.vector_url,
            collection: args.vector_collection,
            top_k: 5,
        },
        weather: gezgin::config::WeatherConfig {
            endpoint: args.weather_url,
            api_key: args.weather_api_key,
        },
        routing: gezgin::config::RoutingConfig {
            endpoint: args.osrm_url,
        },
        external_timeout_secs: args.external_timeout,
    };
    if let Err(e) = config.validate() {
        anyhow::bail!("invalid configuration: {}", e);
    }
    if config.weather.api_key.is_none() {
        tracing::warn!("WEATHER_API_KEY not set, weather lines will be unavailable");
    }

    let gazetteer = Arc::new(Gazetteer::load(&config.corpus_path));
    let vector = Arc::new(ChromaVectorSearch::new(
        &config.vector.endpoint,
        &config.vector.collection,
        config.external_timeout_secs,
    )?);
    let weather = Arc::new(WeatherApiService::new(
        &config.weather.endpoint,
        config.weather.api_key.clone(),
        config.external_timeout_secs,
    )?);
    let routing = Arc::new(OsrmRouting::new(
        &config.routing.endpoint,
        config.external_timeout_secs,
    )?);

    let engine = DialogueEngine::new(gazetteer, vector, weather, routing, &config);
    let state = AppState {
        engine: Arc::new(engine),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(health_check))
        .route("/generate-itinerary", post(generate_itinerary))
        .layer(cors)
        .with_state(state);

    tracing::info!("Itinerary API listening on http://{}/generate-itinerary", args.bind_addr);

    let listener = tokio::net::TcpListener::bind(&args.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
