//! Forecast lookup against weatherapi.com.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

use super::ExternalError;

#[async_trait]
pub trait WeatherService: Send + Sync {
    /// Forecast for one place on one canonical travel date ("15 April 2025").
    async fn forecast(
        &self,
        place: &str,
        coordinates: (f64, f64),
        travel_date: &str,
    ) -> Result<WeatherReport, ExternalError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub condition: String,
    pub avg_temp_c: f64,
}

pub struct WeatherApiService {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    forecast: Forecast,
}

#[derive(Debug, Deserialize)]
struct Forecast {
    forecastday: Vec<ForecastDay>,
}

#[derive(Debug, Deserialize)]
struct ForecastDay {
    day: Day,
}

#[derive(Debug, Deserialize)]
struct Day {
    avgtemp_c: f64,
    condition: Condition,
}

#[derive(Debug, Deserialize)]
struct Condition {
    text: String,
}

impl WeatherApiService {
    pub fn new(endpoint: &str, api_key: Option<String>, timeout_secs: u64) -> anyhow::Result<Self> {
        Ok(Self {
            client: super::http_client(timeout_secs)?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

/// Convert "15 April 2025" to the "2025-04-15" form the forecast API wants.
fn to_api_date(travel_date: &str) -> Option<String> {
    NaiveDate::parse_from_str(travel_date, "%d %B %Y")
        .ok()
        .map(|date| date.format("%Y-%m-%d").to_string())
}

#[async_trait]
impl WeatherService for WeatherApiService {
    async fn forecast(
        &self,
        place: &str,
        coordinates: (f64, f64),
        travel_date: &str,
    ) -> Result<WeatherReport, ExternalError> {
        let api_key = self.api_key.as_deref().ok_or(ExternalError::MissingCredential)?;
        let url = format!("{}/forecast.json", self.endpoint);

        let date = to_api_date(travel_date).ok_or_else(|| ExternalError::Payload {
            endpoint: url.clone(),
            detail: format!("unparseable travel date {:?}", travel_date),
        })?;
        let (lat, lng) = coordinates;
        let query_point = format!("{},{}", lat, lng);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("key", api_key),
                ("q", query_point.as_str()),
                ("dt", date.as_str()),
            ])
            .send()
            .await
            .map_err(|source| ExternalError::Request {
                endpoint: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExternalError::Status {
                endpoint: url,
                status: status.as_u16(),
            });
        }

        let parsed: ForecastResponse =
            response
                .json()
                .await
                .map_err(|e| ExternalError::Payload {
                    endpoint: url.clone(),
                    detail: e.to_string(),
                })?;

        let day = parsed
            .forecast
            .forecastday
            .into_iter()
            .next()
            .ok_or_else(|| ExternalError::Payload {
                endpoint: format!("{}/forecast.json", self.endpoint),
                detail: format!("no forecast day for {} on {}", place, date),
            })?;

        Ok(WeatherReport {
            condition: day.day.condition.text,
            avg_temp_c: day.day.avgtemp_c,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_api_date_roundtrip() {
        assert_eq!(to_api_date("15 April 2025").as_deref(), Some("2025-04-15"));
        assert_eq!(to_api_date("3 July 2025").as_deref(), Some("2025-07-03"));
        assert_eq!(to_api_date("someday soon"), None);
    }
}
