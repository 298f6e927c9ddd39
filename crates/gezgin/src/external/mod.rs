//! External collaborators: vector search, weather, routing.
//!
//! Each service sits behind an object-safe trait so the engine can be tested
//! with synthetic implementations. Providers return `ExternalError`; callers
//! absorb those errors into placeholder values instead of failing the turn.

pub mod routing;
pub mod vector;
pub mod weather;

pub use routing::{OsrmRouting, RoutingService};
pub use vector::{ChromaVectorSearch, VectorSearch};
pub use weather::{WeatherApiService, WeatherReport, WeatherService};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExternalError {
    #[error("request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },
    #[error("unexpected payload from {endpoint}: {detail}")]
    Payload { endpoint: String, detail: String },
    #[error("weather API key is not configured")]
    MissingCredential,
}

/// Shared HTTP client settings for every provider.
pub(crate) fn http_client(timeout_secs: u64) -> anyhow::Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .connect_timeout(std::time::Duration::from_secs(10))
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()?;
    Ok(client)
}
