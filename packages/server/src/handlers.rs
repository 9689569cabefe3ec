//! HTTP handler functions for the incident map API.

use std::collections::BTreeMap;

use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, web};
use incident_map_cluster::aggregate;
use incident_map_database::queries;
use incident_map_report_models::{BoundingBox, Report};
use incident_map_server_models::{
    ApiCluster, ApiHealth, ApiReport, ApiUploadResult, ReportQueryParams, UploadParams,
};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/clusters`
///
/// Clusters all stored reports into named locations with summary
/// statistics. Returns a mapping from cluster label to cluster entry;
/// labels are ephemeral per-request identifiers. An empty store yields
/// an empty mapping.
pub async fn clusters(state: web::Data<AppState>) -> HttpResponse {
    let reports = match queries::get_all_reports(state.db.as_ref()).await {
        Ok(reports) => reports,
        Err(e) => {
            log::error!("Failed to fetch reports for clustering: {e}");
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to fetch reports"
            }));
        }
    };

    let points: Vec<(f64, f64)> = reports.iter().map(Report::point).collect();
    let labels = state.clusterer.cluster(&points);

    let summaries = aggregate(
        &reports,
        &labels,
        state.geocoder.as_ref(),
        &state.geocode_cache,
    )
    .await;

    let response: BTreeMap<usize, ApiCluster> = summaries
        .into_values()
        .map(|summary| (summary.label, ApiCluster::from(summary)))
        .collect();

    HttpResponse::Ok().json(response)
}

/// `GET /api/reports?sw=<lat lng>&ne=<lat lng>`
///
/// Returns the reports inside the given bounding box.
pub async fn reports(
    state: web::Data<AppState>,
    params: web::Query<ReportQueryParams>,
) -> HttpResponse {
    let (Some(sw), Some(ne)) = (parse_corner(&params.sw), parse_corner(&params.ne)) else {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Corners must be 'lat lng' pairs"
        }));
    };

    let bbox = BoundingBox::from_corners(sw, ne);

    match queries::query_reports_in_bbox(state.db.as_ref(), &bbox).await {
        Ok(rows) => {
            let api_reports: Vec<ApiReport> = rows.into_iter().map(ApiReport::from).collect();
            HttpResponse::Ok().json(api_reports)
        }
        Err(e) => {
            log::error!("Failed to query reports: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to query reports"
            }))
        }
    }
}

/// `POST /api/upload?latitude=..&longitude=..`
///
/// Stores the raw image body under a fresh UUID file name in the image
/// directory and inserts a report row stamped with the current time.
pub async fn upload(
    state: web::Data<AppState>,
    params: web::Query<UploadParams>,
    body: web::Bytes,
    req: HttpRequest,
) -> HttpResponse {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let extension = extension_for(content_type);

    let file_name = format!("{}.{extension}", uuid::Uuid::new_v4());
    let path = state.image_dir.join(&file_name);

    if let Err(e) = std::fs::write(&path, &body) {
        log::error!("Failed to store uploaded image {}: {e}", path.display());
        return HttpResponse::InternalServerError().json(serde_json::json!({
            "error": "Failed to store image"
        }));
    }

    match queries::insert_report(
        state.db.as_ref(),
        &file_name,
        params.latitude,
        params.longitude,
        chrono::Utc::now(),
    )
    .await
    {
        Ok(id) => HttpResponse::Ok().json(ApiUploadResult { id, file_name }),
        Err(e) => {
            log::error!("Failed to insert report: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to insert report"
            }))
        }
    }
}

/// Parses a `"lat lng"` corner string into a coordinate pair.
fn parse_corner(s: &str) -> Option<(f64, f64)> {
    let parts: Vec<f64> = s
        .split_whitespace()
        .filter_map(|p| p.parse().ok())
        .collect();
    if parts.len() == 2 {
        Some((parts[0], parts[1]))
    } else {
        None
    }
}

/// Picks a file extension for an image content type.
fn extension_for(content_type: Option<&str>) -> &'static str {
    match content_type {
        Some("image/jpeg") => "jpg",
        Some("image/png") => "png",
        Some("image/gif") => "gif",
        Some("image/webp") => "webp",
        Some("image/heic") => "heic",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_corner_pair() {
        assert_eq!(parse_corner("40.0 -75.0"), Some((40.0, -75.0)));
        assert_eq!(parse_corner("  33.5   -118.25 "), Some((33.5, -118.25)));
    }

    #[test]
    fn rejects_malformed_corners() {
        assert_eq!(parse_corner(""), None);
        assert_eq!(parse_corner("40.0"), None);
        assert_eq!(parse_corner("40.0 -75.0 1.0"), None);
        assert_eq!(parse_corner("north west"), None);
    }

    #[test]
    fn maps_image_content_types_to_extensions() {
        assert_eq!(extension_for(Some("image/jpeg")), "jpg");
        assert_eq!(extension_for(Some("image/png")), "png");
        assert_eq!(extension_for(Some("application/octet-stream")), "bin");
        assert_eq!(extension_for(None), "bin");
    }
}
