use chrono::NaiveDate;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::Visit;

pub fn insert_visit(conn: &Connection, visit: &Visit) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO visits (id, patient_id, visit_date, visit_time, practitioner, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            visit.id.to_string(),
            visit.patient_id.to_string(),
            visit.visit_date.to_string(),
            visit.visit_time,
            visit.practitioner,
            visit.notes,
        ],
    )?;
    Ok(())
}

pub fn get_visit(conn: &Connection, id: &Uuid) -> Result<Option<Visit>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, visit_date, visit_time, practitioner, notes
         FROM visits WHERE id = ?1 AND deleted_at IS NULL",
    )?;

    let result = stmt.query_row(params![id.to_string()], |row| {
        Ok(VisitRow {
            id: row.get(0)?,
            patient_id: row.get(1)?,
            visit_date: row.get(2)?,
            visit_time: row.get(3)?,
            practitioner: row.get(4)?,
            notes: row.get(5)?,
        })
    });

    match result {
        Ok(row) => Ok(Some(visit_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Non-deleted visits of a patient, most recent first.
pub fn list_visits_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<Visit>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, visit_date, visit_time, practitioner, notes
         FROM visits WHERE patient_id = ?1 AND deleted_at IS NULL
         ORDER BY visit_date DESC",
    )?;

    let rows = stmt.query_map(params![patient_id.to_string()], |row| {
        Ok(VisitRow {
            id: row.get(0)?,
            patient_id: row.get(1)?,
            visit_date: row.get(2)?,
            visit_time: row.get(3)?,
            practitioner: row.get(4)?,
            notes: row.get(5)?,
        })
    })?;

    let mut visits = Vec::new();
    for row in rows {
        visits.push(visit_from_row(row?)?);
    }
    Ok(visits)
}

pub fn soft_delete_visit(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE visits SET deleted_at = datetime('now') WHERE id = ?1 AND deleted_at IS NULL",
        params![id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Visit", id));
    }
    Ok(())
}

struct VisitRow {
    id: String,
    patient_id: String,
    visit_date: String,
    visit_time: Option<String>,
    practitioner: Option<String>,
    notes: Option<String>,
}

fn visit_from_row(row: VisitRow) -> Result<Visit, DatabaseError> {
    Ok(Visit {
        id: Uuid::parse_str(&row.id).unwrap_or_default(),
        patient_id: Uuid::parse_str(&row.patient_id).unwrap_or_default(),
        visit_date: NaiveDate::parse_from_str(&row.visit_date, "%Y-%m-%d").unwrap_or_default(),
        visit_time: row.visit_time,
        practitioner: row.practitioner,
        notes: row.notes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::patient::insert_patient;
    use crate::db::sqlite::open_memory_database;
    use crate::models::Patient;

    fn seed_patient(conn: &Connection) -> Uuid {
        let patient = Patient {
            id: Uuid::new_v4(),
            first_name: "Anna".into(),
            last_name: "Beck".into(),
            birthday: None,
            sex: None,
            ethnicity: None,
            email: None,
            phone: None,
            city: None,
            province: None,
        };
        insert_patient(conn, &patient).unwrap();
        patient.id
    }

    fn visit_on(patient_id: Uuid, date: &str) -> Visit {
        Visit {
            id: Uuid::new_v4(),
            patient_id,
            visit_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            visit_time: Some("14:30".into()),
            practitioner: Some("Dr. Leduc".into()),
            notes: None,
        }
    }

    #[test]
    fn list_orders_most_recent_first() {
        let conn = open_memory_database().unwrap();
        let patient_id = seed_patient(&conn);
        insert_visit(&conn, &visit_on(patient_id, "2026-01-10")).unwrap();
        insert_visit(&conn, &visit_on(patient_id, "2026-03-02")).unwrap();

        let visits = list_visits_for_patient(&conn, &patient_id).unwrap();
        assert_eq!(visits.len(), 2);
        assert_eq!(visits[0].visit_date.to_string(), "2026-03-02");
    }

    #[test]
    fn soft_deleted_visit_excluded() {
        let conn = open_memory_database().unwrap();
        let patient_id = seed_patient(&conn);
        let visit = visit_on(patient_id, "2026-01-10");
        insert_visit(&conn, &visit).unwrap();
        soft_delete_visit(&conn, &visit.id).unwrap();

        assert!(get_visit(&conn, &visit.id).unwrap().is_none());
        assert!(list_visits_for_patient(&conn, &patient_id)
            .unwrap()
            .is_empty());
    }
}
