//! Case search: turns a sparse `SearchFilter` into an ordered predicate
//! list, compiles the list into one bounded query, and returns
//! aggregate-enriched `CaseResult` rows.
//!
//! Every predicate is independent and AND-combined; absence of a filter field
//! is the only way to relax a constraint. Consent, visit-date, lot-number and
//! ID-set predicates are patient-level existence checks: they do not need to
//! match the same visit or treatment as each other.

use chrono::{Datelike, NaiveDate};
use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::{params_from_iter, Connection, ToSql};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{CaseResult, ConsentType, SearchFilter};

/// Result-set cap. There is no further pagination; the UI asks the user to
/// narrow the filter instead.
pub const CASE_RESULT_CAP: usize = 200;

// ─── Parameters ───────────────────────────────────────────────────────────────

/// Owned bound parameter, kept alongside the SQL fragment that consumes it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Param {
    Text(String),
    Int(i64),
}

impl ToSql for Param {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Param::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Param::Int(i) => ToSqlOutput::Owned(Value::Integer(*i)),
        })
    }
}

// ─── Predicates ───────────────────────────────────────────────────────────────

/// One independent search condition over the `patients p` row. Each variant
/// renders its own SQL fragment plus the parameters the fragment binds, in
/// order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Predicate {
    /// Always present: soft-deleted patients never match.
    NotDeleted,
    /// Direct column equality (sex, ethnicity).
    Equality {
        column: &'static str,
        value: String,
    },
    /// Lower age bound: born on or before the cutoff.
    BirthdayOnOrBefore(NaiveDate),
    /// Upper age bound: born strictly after the cutoff. The cutoff is
    /// `today - (age_max + 1)` years, so a patient turning exactly `age_max`
    /// stays included until the day they turn `age_max + 1`.
    BirthdayAfter(NaiveDate),
    /// Correlated existence subquery against child rows.
    Exists {
        clause: String,
        params: Vec<Param>,
    },
}

impl Predicate {
    pub(crate) fn to_sql(&self) -> (String, Vec<Param>) {
        match self {
            Predicate::NotDeleted => ("p.deleted_at IS NULL".into(), Vec::new()),
            Predicate::Equality { column, value } => {
                (format!("p.{column} = ?"), vec![Param::Text(value.clone())])
            }
            Predicate::BirthdayOnOrBefore(date) => (
                "p.birthday <= ?".into(),
                vec![Param::Text(date.to_string())],
            ),
            Predicate::BirthdayAfter(date) => {
                ("p.birthday > ?".into(), vec![Param::Text(date.to_string())])
            }
            Predicate::Exists { clause, params } => (clause.clone(), params.clone()),
        }
    }
}

/// Patient-level consent existence, keyed by the literal consent-type tag.
/// Deliberately ignores visit association: any consent of that type, ever.
fn consent_exists(consent_type: ConsentType) -> Predicate {
    Predicate::Exists {
        clause: "EXISTS (SELECT 1 FROM consents c \
                 WHERE c.patient_id = p.id AND c.deleted_at IS NULL \
                 AND c.consent_type = ?)"
            .into(),
        params: vec![Param::Text(consent_type.as_str().into())],
    }
}

/// Existence of a non-deleted visit satisfying one date bound. The from and
/// to bounds build separate predicates and may match different visits.
fn visit_date_exists(op: &'static str, date: NaiveDate) -> Predicate {
    Predicate::Exists {
        clause: format!(
            "EXISTS (SELECT 1 FROM visits v \
             WHERE v.patient_id = p.id AND v.deleted_at IS NULL \
             AND v.visit_date {op} ?)"
        ),
        params: vec![Param::Text(date.to_string())],
    }
}

/// Existence of a non-deleted treatment (through a non-deleted visit) whose
/// lot number contains the fragment. Case behavior follows the store's
/// default collation.
fn lot_number_exists(fragment: &str) -> Predicate {
    Predicate::Exists {
        clause: "EXISTS (SELECT 1 FROM treatments t \
                 JOIN visits v ON t.visit_id = v.id \
                 WHERE v.patient_id = p.id AND v.deleted_at IS NULL \
                 AND t.deleted_at IS NULL AND t.lot_number LIKE ?)"
            .into(),
        params: vec![Param::Text(format!("%{fragment}%"))],
    }
}

/// Existence of a non-deleted treatment whose `column` matches any ID in the
/// set. "Exists one matching row", never "all IDs present".
fn treatment_set_exists(column: &'static str, ids: &[String]) -> Predicate {
    let marks = vec!["?"; ids.len()].join(", ");
    Predicate::Exists {
        clause: format!(
            "EXISTS (SELECT 1 FROM treatments t \
             JOIN visits v ON t.visit_id = v.id \
             WHERE v.patient_id = p.id AND v.deleted_at IS NULL \
             AND t.deleted_at IS NULL AND t.{column} IN ({marks}))"
        ),
        params: ids.iter().cloned().map(Param::Text).collect(),
    }
}

/// Existence of a treated area matching any ID in the set, anywhere in the
/// patient's treatment history.
fn treated_area_exists(ids: &[String]) -> Predicate {
    let marks = vec!["?"; ids.len()].join(", ");
    Predicate::Exists {
        clause: format!(
            "EXISTS (SELECT 1 FROM treatment_areas a \
             JOIN treatments t ON a.treatment_id = t.id \
             JOIN visits v ON t.visit_id = v.id \
             WHERE v.patient_id = p.id AND v.deleted_at IS NULL \
             AND t.deleted_at IS NULL AND a.area_id IN ({marks}))"
        ),
        params: ids.iter().cloned().map(Param::Text).collect(),
    }
}

/// `date` moved back by `years`. Feb 29 clamps to Feb 28 on non-leap years.
fn years_before(date: NaiveDate, years: i32) -> NaiveDate {
    let year = date.year() - years;
    NaiveDate::from_ymd_opt(year, date.month(), date.day())
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(year, date.month(), 28).expect("valid clamp"))
}

/// Build the predicate list for a filter. `today` anchors the age bounds.
pub(crate) fn build_predicates(filter: &SearchFilter, today: NaiveDate) -> Vec<Predicate> {
    let mut predicates = vec![Predicate::NotDeleted];

    if let Some(ethnicity) = &filter.ethnicity {
        predicates.push(Predicate::Equality {
            column: "ethnicity",
            value: ethnicity.clone(),
        });
    }
    if let Some(sex) = filter.sex {
        predicates.push(Predicate::Equality {
            column: "sex",
            value: sex.as_str().into(),
        });
    }
    if let Some(age_min) = filter.age_min {
        predicates.push(Predicate::BirthdayOnOrBefore(years_before(
            today,
            age_min as i32,
        )));
    }
    if let Some(age_max) = filter.age_max {
        predicates.push(Predicate::BirthdayAfter(years_before(
            today,
            age_max as i32 + 1,
        )));
    }
    if filter.consent_botulinum {
        predicates.push(consent_exists(ConsentType::Botulinum));
    }
    if filter.consent_filler {
        predicates.push(consent_exists(ConsentType::Filler));
    }
    if filter.consent_photo {
        predicates.push(consent_exists(ConsentType::Photo));
    }
    if let Some(from) = filter.visit_date_from {
        predicates.push(visit_date_exists(">=", from));
    }
    if let Some(to) = filter.visit_date_to {
        predicates.push(visit_date_exists("<=", to));
    }
    if let Some(lot) = filter.lot_number.as_deref().filter(|l| !l.is_empty()) {
        predicates.push(lot_number_exists(lot));
    }
    if !filter.product_ids.is_empty() {
        predicates.push(treatment_set_exists("product_id", &filter.product_ids));
    }
    if !filter.treatment_category_slugs.is_empty() {
        predicates.push(treatment_set_exists(
            "category_slug",
            &filter.treatment_category_slugs,
        ));
    }
    if !filter.treated_area_ids.is_empty() {
        predicates.push(treated_area_exists(&filter.treated_area_ids));
    }

    predicates
}

// ─── Query compilation ────────────────────────────────────────────────────────

/// Fold the predicate list into one bounded, ordered query. Parameters bind
/// positionally in fragment order.
pub(crate) fn compile_query(predicates: &[Predicate]) -> (String, Vec<Param>) {
    let mut clauses = Vec::with_capacity(predicates.len());
    let mut params = Vec::new();
    for predicate in predicates {
        let (clause, mut clause_params) = predicate.to_sql();
        clauses.push(clause);
        params.append(&mut clause_params);
    }

    let sql = format!(
        "SELECT p.id, p.first_name, p.last_name, p.birthday, p.sex, p.ethnicity, \
         (SELECT COUNT(*) FROM visits v \
          WHERE v.patient_id = p.id AND v.deleted_at IS NULL) AS visit_count, \
         (SELECT COUNT(*) FROM treatments t JOIN visits v ON t.visit_id = v.id \
          WHERE v.patient_id = p.id AND v.deleted_at IS NULL \
          AND t.deleted_at IS NULL) AS treatment_count \
         FROM patients p \
         WHERE {} \
         ORDER BY p.last_name ASC, p.first_name ASC \
         LIMIT {CASE_RESULT_CAP}",
        clauses.join(" AND ")
    );

    (sql, params)
}

// ─── Execution ────────────────────────────────────────────────────────────────

/// Run a case search. An empty filter is valid and returns all non-deleted
/// patients, ordered, capped at [`CASE_RESULT_CAP`].
pub fn search_cases(
    conn: &Connection,
    filter: &SearchFilter,
) -> Result<Vec<CaseResult>, DatabaseError> {
    search_cases_at(conn, filter, chrono::Local::now().date_naive())
}

/// Same as [`search_cases`] with an explicit reference date for the age
/// bounds.
pub(crate) fn search_cases_at(
    conn: &Connection,
    filter: &SearchFilter,
    today: NaiveDate,
) -> Result<Vec<CaseResult>, DatabaseError> {
    let predicates = build_predicates(filter, today);
    let (sql, params) = compile_query(&predicates);
    tracing::debug!(predicates = predicates.len(), "compiled case search");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
        Ok(CaseRow {
            id: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            birthday: row.get(3)?,
            sex: row.get(4)?,
            ethnicity: row.get(5)?,
            visit_count: row.get(6)?,
            treatment_count: row.get(7)?,
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(case_result_from_row(row?));
    }
    Ok(results)
}

struct CaseRow {
    id: String,
    first_name: String,
    last_name: String,
    birthday: Option<String>,
    sex: Option<String>,
    ethnicity: Option<String>,
    visit_count: i64,
    treatment_count: i64,
}

fn case_result_from_row(row: CaseRow) -> CaseResult {
    CaseResult {
        id: Uuid::parse_str(&row.id).unwrap_or_default(),
        first_name: row.first_name,
        last_name: row.last_name,
        birthday: row
            .birthday
            .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
        sex: row.sex.and_then(|s| s.parse().ok()),
        ethnicity: row.ethnicity,
        visit_count: row.visit_count,
        treatment_count: row.treatment_count,
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
