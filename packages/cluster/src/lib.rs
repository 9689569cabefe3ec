#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Clustering and aggregation of geotagged incident reports.
//!
//! The pipeline turns a flat batch of reports into a per-cluster summary:
//!
//! 1. [`affinity::AffinityPropagation`] partitions the report coordinates
//!    into an automatically-discovered number of clusters.
//! 2. [`aggregate::aggregate`] joins the labels back to the reports,
//!    computes per-cluster centroid, member count, and latest timestamp,
//!    and resolves each centroid to a place name through the geocode
//!    cache.
//!
//! Cluster labels are ephemeral per-request identifiers: nothing is
//! persisted between invocations and the numbering carries no meaning.

pub mod affinity;
pub mod aggregate;

pub use affinity::AffinityPropagation;
pub use aggregate::{ClusterSummary, aggregate, centroid_key};
