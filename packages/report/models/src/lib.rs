#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Row types for geotagged incident reports.
//!
//! These types represent the shapes of data as stored in and retrieved from
//! the `SQLite` database. They are distinct from the API response types in
//! `incident_map_server_models`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A geotagged incident report as stored in the database.
///
/// Immutable once created; identity is the `id` column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Primary key.
    pub id: i64,
    /// File name of the uploaded photo (served from the image directory).
    pub file_name: String,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// When the report was submitted.
    pub timestamp: DateTime<Utc>,
}

impl Report {
    /// Projects the report down to its `(latitude, longitude)` point,
    /// the input unit for clustering.
    #[must_use]
    pub const fn point(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

/// A geographic bounding box in WGS84 coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western longitude boundary.
    pub west: f64,
    /// Southern latitude boundary.
    pub south: f64,
    /// Eastern longitude boundary.
    pub east: f64,
    /// Northern latitude boundary.
    pub north: f64,
}

impl BoundingBox {
    /// Creates a new bounding box from the given coordinates.
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Creates a bounding box from south-west and north-east corners
    /// given as `(latitude, longitude)` pairs.
    #[must_use]
    pub const fn from_corners(sw: (f64, f64), ne: (f64, f64)) -> Self {
        Self {
            west: sw.1,
            south: sw.0,
            east: ne.1,
            north: ne.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_projects_coordinates() {
        let report = Report {
            id: 1,
            file_name: "a.jpg".to_string(),
            latitude: 40.0,
            longitude: -75.0,
            timestamp: Utc::now(),
        };
        assert_eq!(report.point(), (40.0, -75.0));
    }

    #[test]
    fn bounding_box_from_corners() {
        let bbox = BoundingBox::from_corners((33.0, -118.5), (34.5, -117.0));
        assert_eq!(bbox.south, 33.0);
        assert_eq!(bbox.west, -118.5);
        assert_eq!(bbox.north, 34.5);
        assert_eq!(bbox.east, -117.0);
    }
}
