#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the incident map server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the database row types to allow independent evolution of the API
//! contract.

use chrono::{DateTime, Utc};
use incident_map_cluster::ClusterSummary;
use incident_map_report_models::Report;
use serde::{Deserialize, Serialize};

/// An incident report as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiReport {
    /// Unique report ID.
    pub id: i64,
    /// Photo file name, served under `/images`.
    pub file_name: String,
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
    /// When the report was submitted (ISO 8601).
    pub timestamp: DateTime<Utc>,
}

impl From<Report> for ApiReport {
    fn from(row: Report) -> Self {
        Self {
            id: row.id,
            file_name: row.file_name,
            latitude: row.latitude,
            longitude: row.longitude,
            timestamp: row.timestamp,
        }
    }
}

/// A single cluster entry in the clusters endpoint response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCluster {
    /// Resolved `"City, Region"` name, or a placeholder when the
    /// geocoder was unavailable.
    pub location: String,
    /// Centroid as `[latitude, longitude]`.
    pub center: [f64; 2],
    /// Number of reports in the cluster.
    pub entries: usize,
    /// Most recent report timestamp in the cluster (ISO 8601).
    pub latest: DateTime<Utc>,
}

impl From<ClusterSummary> for ApiCluster {
    fn from(summary: ClusterSummary) -> Self {
        Self {
            location: summary.place_name,
            center: [summary.centroid.0, summary.centroid.1],
            entries: summary.member_count,
            latest: summary.latest_timestamp,
        }
    }
}

/// Query parameters for the reports endpoint: bounding box corners as
/// space-separated `"lat lng"` pairs.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQueryParams {
    /// South-west corner, `"lat lng"`.
    pub sw: String,
    /// North-east corner, `"lat lng"`.
    pub ne: String,
}

/// Query parameters for the upload endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadParams {
    /// Latitude where the photo was taken.
    pub latitude: f64,
    /// Longitude where the photo was taken.
    pub longitude: f64,
}

/// Response from the upload endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiUploadResult {
    /// Assigned report ID.
    pub id: i64,
    /// Stored photo file name.
    pub file_name: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}
