#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Reverse geocoding for incident report clusters.
//!
//! Resolves a cluster centroid to a human-readable locality name and
//! administrative region using the Nominatim `/reverse` endpoint. The
//! provider's address field set is free-form, so [`ReverseAddress`]
//! exposes defensive accessors that tolerate absent keys.
//!
//! Results are memoized in [`cache::GeocodeCache`] keyed by the formatted
//! centroid string, so repeated clustering requests don't re-query the
//! provider for centroids it has already resolved.

pub mod cache;
pub mod nominatim;

use thiserror::Error;

/// Address field names tried, in priority order, when extracting the
/// locality component of a place name.
pub const LOCALITY_CANDIDATES: &[&str] = &["city", "town"];

/// Address field holding the administrative region (state/province).
pub const REGION_FIELD: &str = "state";

/// A reverse-geocoded address.
///
/// Wraps the provider's free-form `address` object. Field presence is
/// provider-defined; accessors return empty strings rather than failing
/// when an expected key is absent.
#[derive(Debug, Clone)]
pub struct ReverseAddress {
    address: serde_json::Value,
}

impl ReverseAddress {
    /// Wraps a provider `address` object.
    #[must_use]
    pub const fn new(address: serde_json::Value) -> Self {
        Self { address }
    }

    /// Returns the value of a single address field, if present.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&str> {
        self.address.get(key).and_then(serde_json::Value::as_str)
    }

    /// Returns the first matching field from `candidates`, or the empty
    /// string if none is present.
    #[must_use]
    pub fn first_of(&self, candidates: &[&str]) -> &str {
        candidates
            .iter()
            .find_map(|key| self.field(key))
            .unwrap_or("")
    }

    /// The locality (city or town) component, or `""` if the address has
    /// neither field.
    #[must_use]
    pub fn locality(&self) -> &str {
        self.first_of(LOCALITY_CANDIDATES)
    }

    /// The administrative region (state) component, or `""` if absent.
    #[must_use]
    pub fn region(&self) -> &str {
        self.field(REGION_FIELD).unwrap_or("")
    }

    /// Formats the address as `"Locality, Region"`.
    ///
    /// Either component may be empty when the provider omits the field;
    /// the separator is kept so callers get a stable shape.
    #[must_use]
    pub fn place_name(&self) -> String {
        format!("{}, {}", self.locality(), self.region())
    }
}

/// Errors from reverse geocoding operations.
///
/// All variants are treated as a "geocode unavailable" condition by the
/// aggregation layer: the affected cluster gets a placeholder location
/// and other clusters are unaffected.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed (including client-side timeouts).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,
}

/// A reverse geocoding provider.
///
/// One external call per lookup; no batching. Implemented by
/// [`nominatim::NominatimClient`] and by stubs in tests.
#[async_trait::async_trait]
pub trait ReverseGeocode: Send + Sync {
    /// Resolves a coordinate pair to an address.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the request fails, the response cannot
    /// be parsed, or the provider rate limit is hit.
    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<ReverseAddress, GeocodeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locality_prefers_city_over_town() {
        let addr = ReverseAddress::new(serde_json::json!({
            "city": "Philadelphia",
            "town": "Yeadon",
            "state": "Pennsylvania"
        }));
        assert_eq!(addr.locality(), "Philadelphia");
    }

    #[test]
    fn locality_falls_back_to_town() {
        let addr = ReverseAddress::new(serde_json::json!({
            "town": "Duluth",
            "state": "Georgia"
        }));
        assert_eq!(addr.locality(), "Duluth");
        assert_eq!(addr.place_name(), "Duluth, Georgia");
    }

    #[test]
    fn missing_locality_is_empty_not_a_crash() {
        let addr = ReverseAddress::new(serde_json::json!({
            "county": "Gwinnett County",
            "state": "Georgia"
        }));
        assert_eq!(addr.locality(), "");
        assert_eq!(addr.place_name(), ", Georgia");
    }

    #[test]
    fn missing_region_is_empty_not_a_crash() {
        let addr = ReverseAddress::new(serde_json::json!({
            "city": "Monaco"
        }));
        assert_eq!(addr.region(), "");
        assert_eq!(addr.place_name(), "Monaco, ");
    }
}
