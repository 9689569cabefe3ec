//! Query functions for the reports table.

use chrono::{DateTime, Utc};
use incident_map_report_models::{BoundingBox, Report};
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue};

use crate::DbError;

/// Inserts a new report and returns its assigned ID.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn insert_report(
    db: &dyn Database,
    file_name: &str,
    latitude: f64,
    longitude: f64,
    timestamp: DateTime<Utc>,
) -> Result<i64, DbError> {
    let rows = db
        .query_raw_params(
            "INSERT INTO reports (file_name, latitude, longitude, timestamp)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
            &[
                DatabaseValue::String(file_name.to_string()),
                DatabaseValue::Real64(latitude),
                DatabaseValue::Real64(longitude),
                DatabaseValue::String(timestamp.to_rfc3339()),
            ],
        )
        .await
        .map_err(|e| DbError::Database(e.to_string()))?;

    let row = rows.first().ok_or_else(|| DbError::Conversion {
        message: "Failed to get report id from insert".to_string(),
    })?;

    let id: i64 = row.to_value("id").map_err(|e| DbError::Conversion {
        message: format!("Failed to parse report id: {e}"),
    })?;

    Ok(id)
}

/// Fetches every stored report, the input to the clustering pipeline.
///
/// No pagination or filtering: clustering always runs over the whole
/// report set.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn get_all_reports(db: &dyn Database) -> Result<Vec<Report>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT id, file_name, latitude, longitude, timestamp
             FROM reports
             ORDER BY id",
            &[],
        )
        .await
        .map_err(|e| DbError::Database(e.to_string()))?;

    rows.iter().map(row_to_report).collect()
}

/// Fetches reports inside a bounding box.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn query_reports_in_bbox(
    db: &dyn Database,
    bbox: &BoundingBox,
) -> Result<Vec<Report>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT id, file_name, latitude, longitude, timestamp
             FROM reports
             WHERE (latitude BETWEEN $1 AND $2)
               AND (longitude BETWEEN $3 AND $4)
             ORDER BY id",
            &[
                DatabaseValue::Real64(bbox.south),
                DatabaseValue::Real64(bbox.north),
                DatabaseValue::Real64(bbox.west),
                DatabaseValue::Real64(bbox.east),
            ],
        )
        .await
        .map_err(|e| DbError::Database(e.to_string()))?;

    rows.iter().map(row_to_report).collect()
}

fn row_to_report(row: &switchy_database::Row) -> Result<Report, DbError> {
    let timestamp_text: String = row.to_value("timestamp").map_err(|e| DbError::Conversion {
        message: format!("Failed to read report timestamp: {e}"),
    })?;

    let timestamp = DateTime::parse_from_rfc3339(&timestamp_text)
        .map_err(|e| DbError::Conversion {
            message: format!("Invalid report timestamp {timestamp_text:?}: {e}"),
        })?
        .with_timezone(&Utc);

    Ok(Report {
        id: row.to_value("id").map_err(|e| DbError::Conversion {
            message: format!("Failed to read report id: {e}"),
        })?,
        file_name: row.to_value("file_name").unwrap_or_default(),
        latitude: row.to_value("latitude").unwrap_or(0.0),
        longitude: row.to_value("longitude").unwrap_or(0.0),
        timestamp,
    })
}
