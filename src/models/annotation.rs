use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Injection-point annotation attached to a treatment. The point data is an
/// opaque JSON payload as captured by the drawing canvas; the report parses
/// it best-effort and degrades to a fallback line when unreadable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Annotation {
    pub id: Uuid,
    pub treatment_id: Uuid,
    pub points_json: String,
}

/// Parsed shape of `points_json`: a list of named views, each with its
/// injection points.
#[derive(Debug, Clone, Deserialize)]
pub struct AnnotationView {
    pub view: String,
    #[serde(default)]
    pub points: Vec<AnnotationPoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnnotationPoint {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub units: Option<f64>,
}

/// Parse the stored point payload. Errors stay local to the caller; a corrupt
/// record must never abort a report.
pub fn parse_annotation_views(points_json: &str) -> Result<Vec<AnnotationView>, serde_json::Error> {
    serde_json::from_str(points_json)
}
