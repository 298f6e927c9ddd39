//! Driving-route lookup against an OSRM instance.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::ExternalError;

#[async_trait]
pub trait RoutingService: Send + Sync {
    /// Route through the given (latitude, longitude) waypoints, in order.
    /// `Ok(None)` means the service answered but had no route to offer.
    async fn route(&self, waypoints: &[(f64, f64)]) -> Result<Option<Value>, ExternalError>;
}

pub struct OsrmRouting {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    #[serde(default)]
    routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
struct Route {
    geometry: Value,
}

impl OsrmRouting {
    pub fn new(endpoint: &str, timeout_secs: u64) -> anyhow::Result<Self> {
        Ok(Self {
            client: super::http_client(timeout_secs)?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl RoutingService for OsrmRouting {
    async fn route(&self, waypoints: &[(f64, f64)]) -> Result<Option<Value>, ExternalError> {
        // OSRM takes lng,lat pairs.
        let coord_string = waypoints
            .iter()
            .map(|(lat, lng)| format!("{},{}", lng, lat))
            .collect::<Vec<_>>()
            .join(";");
        let url = format!(
            "{}/route/v1/driving/{}?overview=full&geometries=geojson",
            self.endpoint, coord_string
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| ExternalError::Request {
                endpoint: url.clone(),
                source,
            })?;

        if !response.status().is_success() {
            return Ok(None);
        }

        let parsed: RouteResponse =
            response
                .json()
                .await
                .map_err(|e| ExternalError::Payload {
                    endpoint: url.clone(),
                    detail: e.to_string(),
                })?;

        Ok(parsed.routes.into_iter().next().map(|route| route.geometry))
    }
}
