//! Before/after photo pairing: reconciles two independently ordered photo
//! sets into comparison pairs keyed by (position, state).
//!
//! A photo with no state keys as state = "" and is indistinguishable from a
//! photo with an explicit empty state. Photos with no position label never
//! produce a key.

use std::collections::BTreeMap;

use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository::{get_visit, list_photos_for_visit};
use crate::db::DatabaseError;
use crate::models::{ComparisonPair, Photo, PhotoRef};

/// Pair the photos of two visits. Both visits must exist; the photo sets are
/// read in (sort_order, creation time) order, which decides the winner when
/// one set has duplicate keys.
pub fn pair_photos(
    conn: &Connection,
    before_visit_id: &Uuid,
    after_visit_id: &Uuid,
) -> Result<Vec<ComparisonPair>, DatabaseError> {
    if get_visit(conn, before_visit_id)?.is_none() {
        return Err(DatabaseError::not_found("Visit", before_visit_id));
    }
    if get_visit(conn, after_visit_id)?.is_none() {
        return Err(DatabaseError::not_found("Visit", after_visit_id));
    }

    let before = list_photos_for_visit(conn, before_visit_id)?;
    let after = list_photos_for_visit(conn, after_visit_id)?;
    Ok(match_pairs(&before, &after))
}

/// Compute the pairing for two already-ordered photo sets. One pair per
/// distinct key in the union of both sets; per key and side, the first record
/// in that set's order wins and later duplicates are ignored. Output is
/// sorted by (position, state) so repeated runs compare equal.
pub fn match_pairs(before: &[Photo], after: &[Photo]) -> Vec<ComparisonPair> {
    let mut slots: BTreeMap<(String, String), (Option<PhotoRef>, Option<PhotoRef>)> =
        BTreeMap::new();

    for photo in before {
        if let Some(key) = pair_key(photo) {
            let slot = slots.entry(key).or_default();
            if slot.0.is_none() {
                slot.0 = Some(photo_ref(photo));
            }
        }
    }
    for photo in after {
        if let Some(key) = pair_key(photo) {
            let slot = slots.entry(key).or_default();
            if slot.1.is_none() {
                slot.1 = Some(photo_ref(photo));
            }
        }
    }

    slots
        .into_iter()
        .map(|((position, state), (before, after))| ComparisonPair {
            position,
            state: (!state.is_empty()).then_some(state),
            before,
            after,
        })
        .collect()
}

/// Composite key of a photo, or None when the photo carries no position
/// label. Absent state collapses to "".
fn pair_key(photo: &Photo) -> Option<(String, String)> {
    let position = photo.position.as_deref().filter(|p| !p.is_empty())?;
    let state = photo.state.clone().unwrap_or_default();
    Some((position.to_string(), state))
}

fn photo_ref(photo: &Photo) -> PhotoRef {
    PhotoRef {
        id: photo.id,
        original_path: photo.original_path.clone(),
        thumbnail_path: photo.thumbnail_path.clone(),
        state: photo.state.clone(),
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
