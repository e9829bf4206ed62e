use chrono::NaiveDate;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::Patient;

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (id, first_name, last_name, birthday, sex, ethnicity,
         email, phone, city, province)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            patient.id.to_string(),
            patient.first_name,
            patient.last_name,
            patient.birthday.map(|d| d.to_string()),
            patient.sex.map(|s| s.as_str()),
            patient.ethnicity,
            patient.email,
            patient.phone,
            patient.city,
            patient.province,
        ],
    )?;
    Ok(())
}

pub fn get_patient(conn: &Connection, id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, first_name, last_name, birthday, sex, ethnicity, email, phone, city, province
         FROM patients WHERE id = ?1 AND deleted_at IS NULL",
    )?;

    let result = stmt.query_row(params![id.to_string()], |row| {
        Ok(PatientRow {
            id: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            birthday: row.get(3)?,
            sex: row.get(4)?,
            ethnicity: row.get(5)?,
            email: row.get(6)?,
            phone: row.get(7)?,
            city: row.get(8)?,
            province: row.get(9)?,
        })
    });

    match result {
        Ok(row) => Ok(Some(patient_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn soft_delete_patient(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE patients SET deleted_at = datetime('now') WHERE id = ?1 AND deleted_at IS NULL",
        params![id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Patient", id));
    }
    Ok(())
}

struct PatientRow {
    id: String,
    first_name: String,
    last_name: String,
    birthday: Option<String>,
    sex: Option<String>,
    ethnicity: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    city: Option<String>,
    province: Option<String>,
}

fn patient_from_row(row: PatientRow) -> Result<Patient, DatabaseError> {
    Ok(Patient {
        id: Uuid::parse_str(&row.id).unwrap_or_default(),
        first_name: row.first_name,
        last_name: row.last_name,
        birthday: row
            .birthday
            .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
        sex: row.sex.and_then(|s| s.parse().ok()),
        ethnicity: row.ethnicity,
        email: row.email,
        phone: row.phone,
        city: row.city,
        province: row.province,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::Sex;

    fn sample_patient() -> Patient {
        Patient {
            id: Uuid::new_v4(),
            first_name: "Claire".into(),
            last_name: "Fontaine".into(),
            birthday: NaiveDate::from_ymd_opt(1986, 4, 12),
            sex: Some(Sex::Female),
            ethnicity: Some("caucasian".into()),
            email: Some("claire@example.com".into()),
            phone: None,
            city: Some("Montreal".into()),
            province: Some("QC".into()),
        }
    }

    #[test]
    fn insert_and_get_round_trip() {
        let conn = open_memory_database().unwrap();
        let patient = sample_patient();
        insert_patient(&conn, &patient).unwrap();

        let loaded = get_patient(&conn, &patient.id).unwrap().unwrap();
        assert_eq!(loaded.first_name, "Claire");
        assert_eq!(loaded.birthday, NaiveDate::from_ymd_opt(1986, 4, 12));
        assert_eq!(loaded.sex, Some(Sex::Female));
    }

    #[test]
    fn soft_deleted_patient_not_returned() {
        let conn = open_memory_database().unwrap();
        let patient = sample_patient();
        insert_patient(&conn, &patient).unwrap();
        soft_delete_patient(&conn, &patient.id).unwrap();

        assert!(get_patient(&conn, &patient.id).unwrap().is_none());
    }

    #[test]
    fn soft_delete_missing_patient_is_not_found() {
        let conn = open_memory_database().unwrap();
        let err = soft_delete_patient(&conn, &Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }
}
