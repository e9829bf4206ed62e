use chrono::NaiveDate;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::Consent;

pub fn insert_consent(conn: &Connection, consent: &Consent) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO consents (id, patient_id, consent_type, signed_at, signature_data)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            consent.id.to_string(),
            consent.patient_id.to_string(),
            consent.consent_type.as_str(),
            consent.signed_at.map(|d| d.to_string()),
            consent.signature_data,
        ],
    )?;
    Ok(())
}

/// Non-deleted consents of a patient, in signing order.
pub fn list_consents_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<Consent>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, consent_type, signed_at, signature_data
         FROM consents WHERE patient_id = ?1 AND deleted_at IS NULL
         ORDER BY signed_at ASC, rowid ASC",
    )?;

    let rows = stmt.query_map(params![patient_id.to_string()], |row| {
        Ok(ConsentRow {
            id: row.get(0)?,
            patient_id: row.get(1)?,
            consent_type: row.get(2)?,
            signed_at: row.get(3)?,
            signature_data: row.get(4)?,
        })
    })?;

    let mut consents = Vec::new();
    for row in rows {
        consents.push(consent_from_row(row?)?);
    }
    Ok(consents)
}

pub fn soft_delete_consent(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE consents SET deleted_at = datetime('now') WHERE id = ?1 AND deleted_at IS NULL",
        params![id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Consent", id));
    }
    Ok(())
}

struct ConsentRow {
    id: String,
    patient_id: String,
    consent_type: String,
    signed_at: Option<String>,
    signature_data: Option<String>,
}

fn consent_from_row(row: ConsentRow) -> Result<Consent, DatabaseError> {
    Ok(Consent {
        id: Uuid::parse_str(&row.id).unwrap_or_default(),
        patient_id: Uuid::parse_str(&row.patient_id).unwrap_or_default(),
        consent_type: row.consent_type.parse()?,
        signed_at: row
            .signed_at
            .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
        signature_data: row.signature_data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::patient::insert_patient;
    use crate::db::sqlite::open_memory_database;
    use crate::models::{ConsentType, Patient};

    fn seed_patient(conn: &Connection) -> Uuid {
        let patient = Patient {
            id: Uuid::new_v4(),
            first_name: "Lena".into(),
            last_name: "Brandt".into(),
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

    #[test]
    fn consent_round_trips() {
        let conn = open_memory_database().unwrap();
        let patient_id = seed_patient(&conn);
        let consent = Consent {
            id: Uuid::new_v4(),
            patient_id,
            consent_type: ConsentType::Botulinum,
            signed_at: NaiveDate::from_ymd_opt(2026, 1, 5),
            signature_data: None,
        };
        insert_consent(&conn, &consent).unwrap();

        let consents = list_consents_for_patient(&conn, &patient_id).unwrap();
        assert_eq!(consents.len(), 1);
        assert_eq!(consents[0].consent_type, ConsentType::Botulinum);
    }

    #[test]
    fn soft_deleted_consent_excluded() {
        let conn = open_memory_database().unwrap();
        let patient_id = seed_patient(&conn);
        let consent = Consent {
            id: Uuid::new_v4(),
            patient_id,
            consent_type: ConsentType::Photo,
            signed_at: None,
            signature_data: None,
        };
        insert_consent(&conn, &consent).unwrap();
        soft_delete_consent(&conn, &consent.id).unwrap();

        assert!(list_consents_for_patient(&conn, &patient_id)
            .unwrap()
            .is_empty());
    }
}
