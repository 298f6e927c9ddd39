//! Assembles the final itinerary once every slot is filled: sub-place
//! suggestions per category, transport notes, weather lines, optional route.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::extract::split_category_tokens;
use crate::external::{RoutingService, WeatherService};
use crate::gazetteer::{Gazetteer, SubPlace};

pub struct ItineraryAssembler {
    gazetteer: Arc<Gazetteer>,
    weather: Arc<dyn WeatherService>,
    routing: Arc<dyn RoutingService>,
    call_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ItineraryResult {
    /// Human-readable summary covering locations, suggestions, transport,
    /// weather, and route availability.
    pub summary: String,
    pub route_geojson: Option<Value>,
    /// Suggested sub-places with coordinates, for map rendering.
    pub locations: Vec<SubPlace>,
}

impl ItineraryAssembler {
    pub fn new(
        gazetteer: Arc<Gazetteer>,
        weather: Arc<dyn WeatherService>,
        routing: Arc<dyn RoutingService>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            gazetteer,
            weather,
            routing,
            call_timeout,
        }
    }

    /// Build the itinerary for the collected slots. Every external call is
    /// bounded and fail-open: a dead weather or routing service costs only
    /// its own line of the summary.
    pub async fn assemble(
        &self,
        locations: &[String],
        category: &str,
        travel_date: &str,
    ) -> ItineraryResult {
        let categories = split_category_tokens(category);

        let coordinates: Vec<(f64, f64)> = locations
            .iter()
            .filter_map(|name| self.gazetteer.coordinates_of(name))
            .collect();

        let route_geojson = if coordinates.len() > 1 {
            self.fetch_route(&coordinates).await
        } else {
            // A single stop has no route; that is an answer, not an error.
            None
        };

        let transport = self.transport_summary(locations);
        let weather = self.weather_summary(locations, travel_date).await;

        let mut suggested_lines = Vec::new();
        let mut detailed = Vec::new();
        for name in locations {
            let Some(entry) = self.gazetteer.get(name) else {
                continue;
            };
            for token in &categories {
                if let Some((actual_key, places)) = entry.subplaces_for(token) {
                    let names: Vec<&str> = places.iter().map(|p| p.name.as_str()).collect();
                    suggested_lines.push(format!("{} ({}): {}", name, actual_key, names.join(", ")));
                    detailed.extend(places.iter().cloned());
                }
            }
        }

        let route_sentence = if route_geojson.is_some() {
            "Route is included."
        } else {
            "No route available for a single location."
        };

        let summary = format!(
            "Here is your itinerary:\n\n\
             Itinerary Locations: {} (type: {})\n\n\
             Suggested Places:\n{}\n\n\
             Transport Info:\n{}\n\n\
             Weather Forecast:\n{}\n\n\
             {}",
            locations.join(", "),
            category,
            suggested_lines.join("\n"),
            transport,
            weather,
            route_sentence
        );

        ItineraryResult {
            summary,
            route_geojson,
            locations: detailed,
        }
    }

    async fn fetch_route(&self, coordinates: &[(f64, f64)]) -> Option<Value> {
        match tokio::time::timeout(self.call_timeout, self.routing.route(coordinates)).await {
            Ok(Ok(route)) => route,
            Ok(Err(e)) => {
                tracing::warn!("Routing lookup failed ({}), continuing without a route", e);
                None
            }
            Err(_) => {
                tracing::warn!("Routing lookup timed out, continuing without a route");
                None
            }
        }
    }

    fn transport_summary(&self, locations: &[String]) -> String {
        let lines: Vec<String> = locations
            .iter()
            .filter_map(|name| {
                let entry = self.gazetteer.get(name)?;
                let advisory = entry.transport.as_deref()?;
                Some(format!("{}: {}", name, advisory))
            })
            .collect();
        if lines.is_empty() {
            "Transport info not available.".to_string()
        } else {
            lines.join("\n")
        }
    }

    async fn weather_summary(&self, locations: &[String], travel_date: &str) -> String {
        let lookups = locations.iter().filter_map(|name| {
            let coordinates = self.gazetteer.coordinates_of(name)?;
            Some(async move {
                match tokio::time::timeout(
                    self.call_timeout,
                    self.weather.forecast(name, coordinates, travel_date),
                )
                .await
                {
                    Ok(Ok(report)) => format!(
                        "{} on {}: {}, {}°C",
                        name, travel_date, report.condition, report.avg_temp_c
                    ),
                    Ok(Err(e)) => {
                        tracing::warn!("Weather lookup for {} failed: {}", name, e);
                        format!("{}: weather data unavailable", name)
                    }
                    Err(_) => {
                        tracing::warn!("Weather lookup for {} timed out", name);
                        format!("{}: weather data unavailable", name)
                    }
                }
            })
        });
        futures::future::join_all(lookups).await.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::{ExternalError, WeatherReport};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FairWeather;

    #[async_trait]
    impl WeatherService for FairWeather {
        async fn forecast(
            &self,
            _place: &str,
            _coordinates: (f64, f64),
            _travel_date: &str,
        ) -> Result<WeatherReport, ExternalError> {
            Ok(WeatherReport {
                condition: "Sunny".to_string(),
                avg_temp_c: 21.0,
            })
        }
    }

    /// Fails for one specific place, succeeds elsewhere.
    struct PartialWeather(&'static str);

    #[async_trait]
    impl WeatherService for PartialWeather {
        async fn forecast(
            &self,
            place: &str,
            _coordinates: (f64, f64),
            _travel_date: &str,
        ) -> Result<WeatherReport, ExternalError> {
            if place == self.0 {
                Err(ExternalError::MissingCredential)
            } else {
                Ok(WeatherReport {
                    condition: "Cloudy".to_string(),
                    avg_temp_c: 17.5,
                })
            }
        }
    }

    struct CountingRouter {
        calls: AtomicUsize,
    }

    impl CountingRouter {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl RoutingService for CountingRouter {
        async fn route(&self, waypoints: &[(f64, f64)]) -> Result<Option<Value>, ExternalError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(waypoints.len() >= 2);
            Ok(Some(json!({"type": "LineString", "coordinates": []})))
        }
    }

    fn gazetteer() -> Arc<Gazetteer> {
        let raw = r#"{
            "Konak": {
                "coordinates": [38.4189, 27.1287],
                "transport": "Metro and ferry lines meet at Konak Square.",
                "Historical Sites": [
                    {"name": "Konak Pier", "lat": 38.4295, "lng": 27.1270},
                    {"name": "Clock Tower", "lat": 38.4192, "lng": 27.1287}
                ]
            },
            "Çeşme": {
                "coordinates": [38.3236, 26.3034],
                "transport": "Intercity buses leave from Üçkuyular terminal.",
                "Historical Sites": [
                    {"name": "Çeşme Castle", "lat": 38.3228, "lng": 26.3027}
                ],
                "Beaches": [
                    {"name": "Ilica Beach", "lat": 38.3164, "lng": 26.3711}
                ]
            }
        }"#;
        Arc::new(Gazetteer::parse(raw).unwrap())
    }

    fn assembler(
        weather: impl WeatherService + 'static,
        routing: Arc<dyn RoutingService>,
    ) -> ItineraryAssembler {
        ItineraryAssembler::new(
            gazetteer(),
            Arc::new(weather),
            routing,
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_single_location_never_requests_a_route() {
        let router = CountingRouter::new();
        let assembler = assembler(FairWeather, router.clone());

        let result = assembler
            .assemble(&["Konak".to_string()], "historical sites", "15 April 2025")
            .await;

        assert_eq!(router.calls.load(Ordering::SeqCst), 0);
        assert!(result.route_geojson.is_none());
        assert!(result.summary.contains("No route available"));
    }

    #[tokio::test]
    async fn test_two_locations_include_a_route() {
        let router = CountingRouter::new();
        let assembler = assembler(FairWeather, router.clone());

        let result = assembler
            .assemble(
                &["Konak".to_string(), "Çeşme".to_string()],
                "historical sites",
                "15 April 2025",
            )
            .await;

        assert_eq!(router.calls.load(Ordering::SeqCst), 1);
        assert!(result.route_geojson.is_some());
        assert!(result.summary.contains("Route is included."));
    }

    #[tokio::test]
    async fn test_suggestions_follow_location_order_with_corpus_keys() {
        let assembler = assembler(FairWeather, CountingRouter::new());

        let result = assembler
            .assemble(
                &["Konak".to_string(), "Çeşme".to_string()],
                "historical sites and beaches",
                "15 April 2025",
            )
            .await;

        assert!(result
            .summary
            .contains("Konak (Historical Sites): Konak Pier, Clock Tower"));
        assert!(result
            .summary
            .contains("Çeşme (Historical Sites): Çeşme Castle"));
        assert!(result.summary.contains("Çeşme (Beaches): Ilica Beach"));

        let names: Vec<&str> = result.locations.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Konak Pier", "Clock Tower", "Çeşme Castle", "Ilica Beach"]
        );
        assert_eq!(result.locations[0].lat, 38.4295);
    }

    #[tokio::test]
    async fn test_one_weather_failure_does_not_suppress_the_rest() {
        let assembler = assembler(PartialWeather("Konak"), CountingRouter::new());

        let result = assembler
            .assemble(
                &["Konak".to_string(), "Çeşme".to_string()],
                "historical sites",
                "15 April 2025",
            )
            .await;

        assert!(result.summary.contains("Konak: weather data unavailable"));
        assert!(result
            .summary
            .contains("Çeşme on 15 April 2025: Cloudy, 17.5°C"));
    }

    #[tokio::test]
    async fn test_transport_lines_per_location() {
        let assembler = assembler(FairWeather, CountingRouter::new());

        let result = assembler
            .assemble(
                &["Konak".to_string(), "Çeşme".to_string()],
                "beaches",
                "15 April 2025",
            )
            .await;

        assert!(result
            .summary
            .contains("Konak: Metro and ferry lines meet at Konak Square."));
        assert!(result
            .summary
            .contains("Çeşme: Intercity buses leave from Üçkuyular terminal."));
    }
}
