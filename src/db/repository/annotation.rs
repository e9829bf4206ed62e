use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::Annotation;

pub fn insert_annotation(conn: &Connection, annotation: &Annotation) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO annotations (id, treatment_id, points_json) VALUES (?1, ?2, ?3)",
        params![
            annotation.id.to_string(),
            annotation.treatment_id.to_string(),
            annotation.points_json,
        ],
    )?;
    Ok(())
}

/// Non-deleted annotations of a treatment, in entry order.
pub fn list_annotations_for_treatment(
    conn: &Connection,
    treatment_id: &Uuid,
) -> Result<Vec<Annotation>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, treatment_id, points_json
         FROM annotations WHERE treatment_id = ?1 AND deleted_at IS NULL
         ORDER BY created_at ASC, rowid ASC",
    )?;

    let rows = stmt.query_map(params![treatment_id.to_string()], |row| {
        Ok(Annotation {
            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
            treatment_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default(),
            points_json: row.get(2)?,
        })
    })?;

    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn soft_delete_annotation(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE annotations SET deleted_at = datetime('now') WHERE id = ?1 AND deleted_at IS NULL",
        params![id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Annotation", id));
    }
    Ok(())
}
