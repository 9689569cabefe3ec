//! Per-cluster aggregation of incident reports.
//!
//! Joins cluster labels back to the original reports, computes summary
//! statistics for each group, and resolves every centroid to a place
//! name through the geocode cache. A geocode failure degrades the
//! affected cluster to a placeholder location; it never aborts the
//! aggregation of other clusters.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use incident_map_geocoder::{GeocodeError, ReverseGeocode, cache::GeocodeCache};
use incident_map_report_models::Report;

/// Summary statistics for a single cluster of reports.
///
/// Derived and transient: recomputed on every request, never persisted.
/// Labels are only stable within one clustering invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSummary {
    /// Cluster label this summary belongs to.
    pub label: usize,
    /// Arithmetic mean of member coordinates, `(latitude, longitude)`.
    pub centroid: (f64, f64),
    /// Number of reports in the cluster (at least 1).
    pub member_count: usize,
    /// Most recent report timestamp in the cluster.
    pub latest_timestamp: DateTime<Utc>,
    /// Resolved `"Locality, Region"` name for the centroid, or `""` when
    /// the geocoder was unavailable.
    pub place_name: String,
}

/// Canonical cache key for a centroid.
///
/// Full-precision `Display` formatting, matching the coordinate string
/// sent to the reverse geocoder.
#[must_use]
pub fn centroid_key(latitude: f64, longitude: f64) -> String {
    format!("{latitude}, {longitude}")
}

/// Aggregates `reports` into per-cluster summaries.
///
/// `labels` must be aligned with `reports` (one label per report, same
/// order), as produced by
/// [`AffinityPropagation::cluster`](crate::AffinityPropagation::cluster).
/// Every report lands in exactly one group. For each group the centroid
/// is the mean latitude/longitude, the member count is the group size,
/// and the latest timestamp is the group maximum.
///
/// Place names are resolved cache-first; on a miss the reverse geocoder
/// is called once for the centroid and the result is cached. The cache
/// insert is the only mutation this function performs. If the geocoder
/// fails for a centroid the summary keeps an empty place name and the
/// failure is logged; the lookup is not cached, so a later request
/// retries it.
pub async fn aggregate(
    reports: &[Report],
    labels: &[usize],
    geocoder: &dyn ReverseGeocode,
    cache: &GeocodeCache,
) -> BTreeMap<usize, ClusterSummary> {
    let mut groups: BTreeMap<usize, Vec<&Report>> = BTreeMap::new();
    for (report, &label) in reports.iter().zip(labels) {
        groups.entry(label).or_default().push(report);
    }

    let mut summaries = BTreeMap::new();

    for (label, members) in groups {
        #[allow(clippy::cast_precision_loss)]
        let count = members.len() as f64;
        let avg_lat = members.iter().map(|r| r.latitude).sum::<f64>() / count;
        let avg_lng = members.iter().map(|r| r.longitude).sum::<f64>() / count;

        let latest = members
            .iter()
            .map(|r| r.timestamp)
            .max()
            .unwrap_or_default();

        let key = centroid_key(avg_lat, avg_lng);
        let place_name = cache
            .get_or_compute(&key, || async {
                geocoder
                    .reverse(avg_lat, avg_lng)
                    .await
                    .map(|addr| addr.place_name())
            })
            .await
            .unwrap_or_else(|e: GeocodeError| {
                log::warn!("Failed to reverse geocode centroid {key}: {e}");
                String::new()
            });

        summaries.insert(
            label,
            ClusterSummary {
                label,
                centroid: (avg_lat, avg_lng),
                member_count: members.len(),
                latest_timestamp: latest,
                place_name,
            },
        );
    }

    summaries
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::TimeZone as _;
    use incident_map_geocoder::ReverseAddress;

    use super::*;

    /// Geocoder stub returning a fixed locality, counting calls.
    struct StubGeocoder {
        calls: AtomicUsize,
        fail: bool,
    }

    impl StubGeocoder {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl ReverseGeocode for StubGeocoder {
        async fn reverse(
            &self,
            _latitude: f64,
            _longitude: f64,
        ) -> Result<ReverseAddress, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(GeocodeError::Parse {
                    message: "stub failure".to_string(),
                });
            }
            Ok(ReverseAddress::new(serde_json::json!({
                "city": "Testville",
                "state": "Georgia"
            })))
        }
    }

    fn report(id: i64, lat: f64, lng: f64, ts: DateTime<Utc>) -> Report {
        Report {
            id,
            file_name: format!("{id}.jpg"),
            latitude: lat,
            longitude: lng,
            timestamp: ts,
        }
    }

    fn ts(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, day, hour, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn computes_centroid_count_and_latest_per_cluster() {
        let reports = vec![
            report(1, 40.0, -75.0, ts(1, 10)),
            report(2, 40.001, -75.001, ts(2, 9)),
            report(3, 34.0, -118.0, ts(1, 12)),
        ];
        let labels = vec![0, 0, 1];
        let geocoder = StubGeocoder::new();
        let cache = GeocodeCache::new();

        let summaries = aggregate(&reports, &labels, &geocoder, &cache).await;

        assert_eq!(summaries.len(), 2);

        let first = &summaries[&0];
        assert_eq!(first.member_count, 2);
        assert!((first.centroid.0 - 40.0005).abs() < 1e-9);
        assert!((first.centroid.1 - -75.0005).abs() < 1e-9);
        assert_eq!(first.latest_timestamp, ts(2, 9));
        assert_eq!(first.place_name, "Testville, Georgia");

        let second = &summaries[&1];
        assert_eq!(second.member_count, 1);
        assert_eq!(second.centroid, (34.0, -118.0));
        assert_eq!(second.latest_timestamp, ts(1, 12));

        // Two distinct centroids, one geocode call each.
        assert_eq!(geocoder.call_count(), 2);
    }

    #[tokio::test]
    async fn every_label_appears_in_the_output() {
        let reports = vec![
            report(1, 0.0, 0.0, ts(1, 0)),
            report(2, 1.0, 1.0, ts(1, 1)),
            report(3, 2.0, 2.0, ts(1, 2)),
        ];
        let labels = vec![2, 0, 1];
        let geocoder = StubGeocoder::new();
        let cache = GeocodeCache::new();

        let summaries = aggregate(&reports, &labels, &geocoder, &cache).await;

        for label in &labels {
            assert!(summaries.contains_key(label));
        }
        let total: usize = summaries.values().map(|s| s.member_count).sum();
        assert_eq!(total, reports.len());
    }

    #[tokio::test]
    async fn empty_input_produces_empty_mapping() {
        let geocoder = StubGeocoder::new();
        let cache = GeocodeCache::new();

        let summaries = aggregate(&[], &[], &geocoder, &cache).await;

        assert!(summaries.is_empty());
        assert_eq!(geocoder.call_count(), 0);
    }

    #[tokio::test]
    async fn geocode_failure_degrades_to_placeholder() {
        let reports = vec![
            report(1, 40.0, -75.0, ts(3, 0)),
            report(2, 34.0, -118.0, ts(4, 0)),
        ];
        let labels = vec![0, 1];
        let geocoder = StubGeocoder::failing();
        let cache = GeocodeCache::new();

        let summaries = aggregate(&reports, &labels, &geocoder, &cache).await;

        // Both clusters survive with all fields intact except the name.
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[&0].place_name, "");
        assert_eq!(summaries[&0].member_count, 1);
        assert_eq!(summaries[&1].latest_timestamp, ts(4, 0));

        // Failures are not cached.
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn repeated_aggregation_reuses_the_cache() {
        let reports = vec![report(1, 40.0, -75.0, ts(5, 0))];
        let labels = vec![0];
        let geocoder = StubGeocoder::new();
        let cache = GeocodeCache::new();

        aggregate(&reports, &labels, &geocoder, &cache).await;
        let summaries = aggregate(&reports, &labels, &geocoder, &cache).await;

        assert_eq!(summaries[&0].place_name, "Testville, Georgia");
        assert_eq!(geocoder.call_count(), 1);
    }
}
