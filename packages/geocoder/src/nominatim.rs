//! Nominatim / OpenStreetMap reverse geocoder client.
//!
//! One `/reverse` call per cluster centroid. Nominatim has strict rate
//! limits: **1 request per second** maximum on the public instance, so
//! the geocode cache in front of this client matters.
//!
//! See <https://nominatim.org/release-docs/develop/api/Reverse/>

use std::time::Duration;

use crate::{GeocodeError, ReverseAddress, ReverseGeocode};

/// Public Nominatim reverse endpoint, overridable via `NOMINATIM_URL`.
pub const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org/reverse";

/// Upper bound on a single reverse lookup, so one slow provider call
/// can't stall a clustering request indefinitely.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Reverse geocoding client for a Nominatim instance.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimClient {
    /// Creates a client for the given `/reverse` endpoint URL with the
    /// default request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the HTTP client fails to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("incident-map/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait::async_trait]
impl ReverseGeocode for NominatimClient {
    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<ReverseAddress, GeocodeError> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("lat", latitude.to_string().as_str()),
                ("lon", longitude.to_string().as_str()),
                ("format", "jsonv2"),
                ("addressdetails", "1"),
            ])
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }

        let body: serde_json::Value = resp.json().await?;
        parse_response(&body)
    }
}

/// Parses a Nominatim reverse JSON response into a [`ReverseAddress`].
fn parse_response(body: &serde_json::Value) -> Result<ReverseAddress, GeocodeError> {
    // Nominatim reports "unable to geocode" as an error field with a
    // 200 status.
    if let Some(error) = body.get("error").and_then(serde_json::Value::as_str) {
        return Err(GeocodeError::Parse {
            message: format!("Nominatim error: {error}"),
        });
    }

    let address = body.get("address").ok_or_else(|| GeocodeError::Parse {
        message: "Missing address in Nominatim response".to_string(),
    })?;

    if !address.is_object() {
        return Err(GeocodeError::Parse {
            message: "Nominatim address is not an object".to_string(),
        });
    }

    Ok(ReverseAddress::new(address.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_reverse_result() {
        let body = serde_json::json!({
            "place_id": 129_874,
            "display_name": "Duluth, Gwinnett County, Georgia, United States",
            "address": {
                "city": "Duluth",
                "county": "Gwinnett County",
                "state": "Georgia",
                "country": "United States"
            }
        });
        let addr = parse_response(&body).unwrap();
        assert_eq!(addr.locality(), "Duluth");
        assert_eq!(addr.region(), "Georgia");
    }

    #[test]
    fn unable_to_geocode_is_a_parse_error() {
        let body = serde_json::json!({"error": "Unable to geocode"});
        let err = parse_response(&body).unwrap_err();
        assert!(matches!(err, GeocodeError::Parse { .. }));
    }

    #[test]
    fn missing_address_is_a_parse_error() {
        let body = serde_json::json!({"display_name": "somewhere"});
        let err = parse_response(&body).unwrap_err();
        assert!(matches!(err, GeocodeError::Parse { .. }));
    }
}
