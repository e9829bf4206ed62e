use chrono::NaiveDate;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{Portfolio, PortfolioEntry};

pub fn insert_portfolio(conn: &Connection, portfolio: &Portfolio) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO portfolios (id, name, patient_id) VALUES (?1, ?2, ?3)",
        params![
            portfolio.id.to_string(),
            portfolio.name,
            portfolio.patient_id.map(|id| id.to_string()),
        ],
    )?;
    Ok(())
}

pub fn get_portfolio(conn: &Connection, id: &Uuid) -> Result<Option<Portfolio>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, patient_id FROM portfolios WHERE id = ?1 AND deleted_at IS NULL",
    )?;

    let result = stmt.query_row(params![id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Option<String>>(2)?,
        ))
    });

    match result {
        Ok((id, name, patient_id)) => Ok(Some(Portfolio {
            id: Uuid::parse_str(&id).unwrap_or_default(),
            name,
            patient_id: patient_id.and_then(|p| Uuid::parse_str(&p).ok()),
        })),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn insert_portfolio_entry(
    conn: &Connection,
    entry: &PortfolioEntry,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO portfolio_entries (id, portfolio_id, before_photo_id, after_photo_id,
         before_date, after_date, sort_order)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            entry.id.to_string(),
            entry.portfolio_id.to_string(),
            entry.before_photo_id.map(|id| id.to_string()),
            entry.after_photo_id.map(|id| id.to_string()),
            entry.before_date.map(|d| d.to_string()),
            entry.after_date.map(|d| d.to_string()),
            entry.sort_order,
        ],
    )?;
    Ok(())
}

/// Entries of a portfolio in display order.
pub fn list_entries_for_portfolio(
    conn: &Connection,
    portfolio_id: &Uuid,
) -> Result<Vec<PortfolioEntry>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, portfolio_id, before_photo_id, after_photo_id, before_date, after_date, sort_order
         FROM portfolio_entries WHERE portfolio_id = ?1
         ORDER BY sort_order ASC, rowid ASC",
    )?;

    let rows = stmt.query_map(params![portfolio_id.to_string()], |row| {
        Ok(EntryRow {
            id: row.get(0)?,
            portfolio_id: row.get(1)?,
            before_photo_id: row.get(2)?,
            after_photo_id: row.get(3)?,
            before_date: row.get(4)?,
            after_date: row.get(5)?,
            sort_order: row.get(6)?,
        })
    })?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(entry_from_row(row?));
    }
    Ok(entries)
}

pub fn soft_delete_portfolio(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE portfolios SET deleted_at = datetime('now') WHERE id = ?1 AND deleted_at IS NULL",
        params![id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("Portfolio", id));
    }
    Ok(())
}

struct EntryRow {
    id: String,
    portfolio_id: String,
    before_photo_id: Option<String>,
    after_photo_id: Option<String>,
    before_date: Option<String>,
    after_date: Option<String>,
    sort_order: i64,
}

fn entry_from_row(row: EntryRow) -> PortfolioEntry {
    PortfolioEntry {
        id: Uuid::parse_str(&row.id).unwrap_or_default(),
        portfolio_id: Uuid::parse_str(&row.portfolio_id).unwrap_or_default(),
        before_photo_id: row.before_photo_id.and_then(|p| Uuid::parse_str(&p).ok()),
        after_photo_id: row.after_photo_id.and_then(|p| Uuid::parse_str(&p).ok()),
        before_date: row
            .before_date
            .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
        after_date: row
            .after_date
            .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
        sort_order: row.sort_order,
    }
}
