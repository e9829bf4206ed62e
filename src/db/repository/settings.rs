use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::ClinicSettings;

/// Get the clinic settings (singleton row, id=1).
pub fn get_clinic_settings(conn: &Connection) -> Result<ClinicSettings, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT clinic_name, provincial_tax_rate, federal_tax_rate
         FROM clinic_settings WHERE id = 1",
    )?;
    stmt.query_row([], |row| {
        Ok(ClinicSettings {
            clinic_name: row.get(0)?,
            provincial_tax_rate: row.get(1)?,
            federal_tax_rate: row.get(2)?,
        })
    })
    .map_err(DatabaseError::from)
}

/// Update the clinic settings singleton.
pub fn update_clinic_settings(
    conn: &Connection,
    settings: &ClinicSettings,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE clinic_settings SET
         clinic_name = ?1,
         provincial_tax_rate = ?2,
         federal_tax_rate = ?3
         WHERE id = 1",
        params![
            settings.clinic_name,
            settings.provincial_tax_rate,
            settings.federal_tax_rate,
        ],
    )?;
    Ok(())
}
