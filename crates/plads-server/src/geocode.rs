use anyhow::Context;
use plads_common::models::place::Coordinates;
use serde::Deserialize;

/// Failure modes of an address lookup. `NotFound` maps to a 422 at the
/// boundary; transport or provider faults propagate as 500.
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("No results for the provided address")]
    NotFound,
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: Option<String>,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Coordinates,
}

/// Client for the external geocoding provider (Google geocode JSON API
/// shape). Place creation blocks on a successful lookup.
#[derive(Clone)]
pub struct Geocoder {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl Geocoder {
    pub fn new(endpoint: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Resolve a free-text address into coordinates
    #[tracing::instrument(skip(self))]
    pub async fn resolve(&self, address: &str) -> Result<Coordinates, GeocodeError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("address", address), ("key", self.api_key.as_str())])
            .send()
            .await
            .context("Failed to reach geocoding provider")?;

        let response = response
            .error_for_status()
            .context("Geocoding provider returned an error status")?;

        let body: GeocodeResponse = response
            .json()
            .await
            .context("Failed to parse geocoding response")?;

        extract_coordinates(body)
    }
}

fn extract_coordinates(body: GeocodeResponse) -> Result<Coordinates, GeocodeError> {
    if body.status.as_deref() == Some("ZERO_RESULTS") {
        return Err(GeocodeError::NotFound);
    }
    body.results
        .into_iter()
        .next()
        .and_then(|r| r.geometry)
        .map(|g| g.location)
        .ok_or(GeocodeError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> GeocodeResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_extracts_first_result() {
        let body = parse(json!({
            "status": "OK",
            "results": [
                {"geometry": {"location": {"lat": 40.7484405, "lng": -73.9878584}}},
                {"geometry": {"location": {"lat": 1.0, "lng": 2.0}}}
            ]
        }));
        let coords = extract_coordinates(body).unwrap();
        assert_eq!(coords.lat, 40.7484405);
        assert_eq!(coords.lng, -73.9878584);
    }

    #[test]
    fn test_zero_results_is_not_found() {
        let body = parse(json!({"status": "ZERO_RESULTS", "results": []}));
        assert!(matches!(
            extract_coordinates(body),
            Err(GeocodeError::NotFound)
        ));
    }

    #[test]
    fn test_empty_results_is_not_found() {
        let body = parse(json!({"status": "OK", "results": []}));
        assert!(matches!(
            extract_coordinates(body),
            Err(GeocodeError::NotFound)
        ));
    }

    #[test]
    fn test_missing_geometry_is_not_found() {
        let body = parse(json!({"status": "OK", "results": [{}]}));
        assert!(matches!(
            extract_coordinates(body),
            Err(GeocodeError::NotFound)
        ));
    }

    #[test]
    fn test_missing_status_with_results_is_ok() {
        let body = parse(json!({
            "results": [{"geometry": {"location": {"lat": 55.6760968, "lng": 12.5683371}}}]
        }));
        assert!(extract_coordinates(body).is_ok());
    }
}
