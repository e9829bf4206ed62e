use chrono::NaiveDate;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{Treatment, TreatmentArea};

pub fn insert_treatment(conn: &Connection, treatment: &Treatment) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO treatments (id, visit_id, product_id, product_name, brand,
         category_slug, treatment_type, lot_number, expiry_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            treatment.id.to_string(),
            treatment.visit_id.to_string(),
            treatment.product_id,
            treatment.product_name,
            treatment.brand,
            treatment.category_slug,
            treatment.treatment_type,
            treatment.lot_number,
            treatment.expiry_date.map(|d| d.to_string()),
        ],
    )?;
    Ok(())
}

pub fn insert_treatment_area(conn: &Connection, area: &TreatmentArea) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO treatment_areas (id, treatment_id, area_id, area_name, units, cost)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            area.id.to_string(),
            area.treatment_id.to_string(),
            area.area_id,
            area.area_name,
            area.units,
            area.cost,
        ],
    )?;
    Ok(())
}

/// Non-deleted treatments of a visit, in entry order.
pub fn list_treatments_for_visit(
    conn: &Connection,
    visit_id: &Uuid,
) -> Result<Vec<Treatment>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, visit_id, product_id, product_name, brand, category_slug,
         treatment_type, lot_number, expiry_date
         FROM treatments WHERE visit_id = ?1 AND deleted_at IS NULL
         ORDER BY created_at ASC, rowid ASC",
    )?;

    let rows = stmt.query_map(params![visit_id.to_string()], |row| {
        Ok(TreatmentRow {
            id: row.get(0)?,
            visit_id: row.get(1)?,
            product_id: row.get(2)?,
            product_name: row.get(3)?,
            brand: row.get(4)?,
            category_slug: row.get(5)?,
            treatment_type: row.get(6)?,
            lot_number: row.get(7)?,
            expiry_date: row.get(8)?,
        })
    })?;

    let mut treatments = Vec::new();
    for row in rows {
        treatments.push(treatment_from_row(row?)?);
    }
    Ok(treatments)
}

/// Areas of one treatment, in entry order.
pub fn list_areas_for_treatment(
    conn: &Connection,
    treatment_id: &Uuid,
) -> Result<Vec<TreatmentArea>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, treatment_id, area_id, area_name, units, cost
         FROM treatment_areas WHERE treatment_id = ?1
         ORDER BY rowid ASC",
    )?;

    let rows = stmt.query_map(params![treatment_id.to_string()], |row| {
        Ok(TreatmentArea {
            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
            treatment_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default(),
            area_id: row.get(2)?,
            area_name: row.get(3)?,
            units: row.get(4)?,
            cost: row.get(5)?,
        })
    })?;

    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn soft_delete_treatment(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE treatments SET deleted_at = datetime('now') WHERE id = ?1 AND deleted_at IS NULL",
        params![id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Treatment", id));
    }
    Ok(())
}

struct TreatmentRow {
    id: String,
    visit_id: String,
    product_id: Option<String>,
    product_name: Option<String>,
    brand: Option<String>,
    category_slug: Option<String>,
    treatment_type: Option<String>,
    lot_number: Option<String>,
    expiry_date: Option<String>,
}

fn treatment_from_row(row: TreatmentRow) -> Result<Treatment, DatabaseError> {
    Ok(Treatment {
        id: Uuid::parse_str(&row.id).unwrap_or_default(),
        visit_id: Uuid::parse_str(&row.visit_id).unwrap_or_default(),
        product_id: row.product_id,
        product_name: row.product_name,
        brand: row.brand,
        category_slug: row.category_slug,
        treatment_type: row.treatment_type,
        lot_number: row.lot_number,
        expiry_date: row
            .expiry_date
            .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::patient::insert_patient;
    use crate::db::repository::visit::insert_visit;
    use crate::db::sqlite::open_memory_database;
    use crate::models::{Patient, Visit};

    fn seed_visit(conn: &Connection) -> Uuid {
        let patient = Patient {
            id: Uuid::new_v4(),
            first_name: "Eva".into(),
            last_name: "Roy".into(),
            birthday: None,
            sex: None,
            ethnicity: None,
            email: None,
            phone: None,
            city: None,
            province: None,
        };
        insert_patient(conn, &patient).unwrap();
        let visit = Visit {
            id: Uuid::new_v4(),
            patient_id: patient.id,
            visit_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            visit_time: None,
            practitioner: None,
            notes: None,
        };
        insert_visit(conn, &visit).unwrap();
        visit.id
    }

    #[test]
    fn treatment_with_areas_round_trips() {
        let conn = open_memory_database().unwrap();
        let visit_id = seed_visit(&conn);

        let treatment = Treatment {
            id: Uuid::new_v4(),
            visit_id,
            product_id: Some("prod-botulinum-a".into()),
            product_name: Some("Botulinum A".into()),
            brand: Some("Brandex".into()),
            category_slug: Some("neuromodulator".into()),
            treatment_type: Some("Injection".into()),
            lot_number: Some("LOT-4417".into()),
            expiry_date: NaiveDate::from_ymd_opt(2027, 6, 30),
        };
        insert_treatment(&conn, &treatment).unwrap();

        let area = TreatmentArea {
            id: Uuid::new_v4(),
            treatment_id: treatment.id,
            area_id: "glabella".into(),
            area_name: "Glabella".into(),
            units: Some(20.0),
            cost: 240.0,
        };
        insert_treatment_area(&conn, &area).unwrap();

        let treatments = list_treatments_for_visit(&conn, &visit_id).unwrap();
        assert_eq!(treatments.len(), 1);
        assert_eq!(treatments[0].lot_number.as_deref(), Some("LOT-4417"));

        let areas = list_areas_for_treatment(&conn, &treatment.id).unwrap();
        assert_eq!(areas.len(), 1);
        assert_eq!(areas[0].cost, 240.0);
    }

    #[test]
    fn soft_deleted_treatment_excluded() {
        let conn = open_memory_database().unwrap();
        let visit_id = seed_visit(&conn);
        let treatment = Treatment {
            id: Uuid::new_v4(),
            visit_id,
            product_id: None,
            product_name: None,
            brand: None,
            category_slug: None,
            treatment_type: Some("Peel".into()),
            lot_number: None,
            expiry_date: None,
        };
        insert_treatment(&conn, &treatment).unwrap();
        soft_delete_treatment(&conn, &treatment.id).unwrap();

        assert!(list_treatments_for_visit(&conn, &visit_id)
            .unwrap()
            .is_empty());
    }
}
