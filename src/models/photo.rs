use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Photo {
    pub id: Uuid,
    pub visit_id: Uuid,
    /// Anatomical position / view name (e.g. "front", "left profile").
    pub position: Option<String>,
    /// Muscle state captured (e.g. "relaxed", "active", "smiling").
    pub state: Option<String>,
    pub original_path: String,
    pub thumbnail_path: Option<String>,
    pub sort_order: i64,
}

impl Photo {
    /// Caption rendered under a grid cell: "position - state", state omitted
    /// when absent.
    pub fn caption(&self) -> String {
        let position = self.position.as_deref().unwrap_or_default();
        match self.state.as_deref() {
            Some(state) if !state.is_empty() => format!("{position} - {state}"),
            _ => position.to_string(),
        }
    }
}
