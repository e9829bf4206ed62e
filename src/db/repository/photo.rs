use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::Photo;

pub fn insert_photo(conn: &Connection, photo: &Photo) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO photos (id, visit_id, position, state, original_path,
         thumbnail_path, sort_order)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            photo.id.to_string(),
            photo.visit_id.to_string(),
            photo.position,
            photo.state,
            photo.original_path,
            photo.thumbnail_path,
            photo.sort_order,
        ],
    )?;
    Ok(())
}

pub fn get_photo(conn: &Connection, id: &Uuid) -> Result<Option<Photo>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, visit_id, position, state, original_path, thumbnail_path, sort_order
         FROM photos WHERE id = ?1 AND deleted_at IS NULL",
    )?;

    let result = stmt.query_row(params![id.to_string()], photo_from_row);

    match result {
        Ok(photo) => Ok(Some(photo)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Non-deleted photos of a visit in the order pairing and layout consume
/// them: (sort_order, creation time).
pub fn list_photos_for_visit(
    conn: &Connection,
    visit_id: &Uuid,
) -> Result<Vec<Photo>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, visit_id, position, state, original_path, thumbnail_path, sort_order
         FROM photos WHERE visit_id = ?1 AND deleted_at IS NULL
         ORDER BY sort_order ASC, created_at ASC, rowid ASC",
    )?;

    let rows = stmt.query_map(params![visit_id.to_string()], photo_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn soft_delete_photo(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE photos SET deleted_at = datetime('now') WHERE id = ?1 AND deleted_at IS NULL",
        params![id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Photo", id));
    }
    Ok(())
}

fn photo_from_row(row: &rusqlite::Row) -> Result<Photo, rusqlite::Error> {
    Ok(Photo {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        visit_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default(),
        position: row.get(2)?,
        state: row.get(3)?,
        original_path: row.get(4)?,
        thumbnail_path: row.get(5)?,
        sort_order: row.get(6)?,
    })
}
