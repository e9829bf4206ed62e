//! Report compositor: builds an ordered section sequence from read models,
//! renders it through the cursor-driven layout engine into a paginated PDF,
//! and persists the bytes atomically under the exports directory.
//!
//! A missing visit/patient/portfolio fails the whole operation up front.
//! Everything that can go wrong per item during rendering (absent photo
//! file, corrupt annotation payload, failing signature embed) is absorbed at
//! item scope by the section renderers.

mod cursor;
mod sections;
mod text;

use std::io::BufWriter;
use std::path::{Path, PathBuf};

use printpdf::{BuiltinFont, Mm, PdfDocument};
use rusqlite::Connection;
use thiserror::Error;
use uuid::Uuid;

use crate::costs::format_amount;
use crate::db::repository::{
    get_patient, get_photo, get_portfolio, get_visit, get_clinic_settings,
    list_annotations_for_treatment, list_areas_for_treatment, list_consents_for_patient,
    list_entries_for_portfolio, list_photos_for_visit, list_treatments_for_visit,
};
use crate::db::DatabaseError;
use crate::models::{Photo, TreatmentArea};

use cursor::LayoutCursor;
use sections::Fonts;
use text::strip_markup;

pub use sections::PHOTO_COLUMNS;

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("output stream error: {0}")]
    Sink(#[from] std::io::Error),
}

fn pdf_error(e: impl std::fmt::Display) -> ReportError {
    ReportError::Pdf(e.to_string())
}

// ─── Document model ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Portrait visit report.
    Visit,
    /// Landscape before/after portfolio.
    Portfolio,
}

/// Ordered sequence of sections plus the derived output filename. Built by a
/// compose function, consumed once by [`render`], then discarded.
#[derive(Debug, Clone)]
pub struct ReportDocument {
    pub kind: ReportKind,
    pub title: String,
    pub filename: String,
    pub sections: Vec<ReportSection>,
}

#[derive(Debug, Clone)]
pub enum ReportSection {
    Title {
        clinic_name: String,
        label: String,
    },
    PatientInfo {
        lines: Vec<String>,
    },
    VisitDetail {
        lines: Vec<String>,
        /// Markup-stripped plain text, None when the stored notes are empty.
        notes: Option<String>,
    },
    PhotoGrid {
        cells: Vec<PhotoCell>,
    },
    TreatmentLedger {
        blocks: Vec<TreatmentBlock>,
        provincial_rate: f64,
        federal_rate: f64,
    },
    AnnotationSummary {
        blocks: Vec<AnnotationBlock>,
    },
    Consents {
        items: Vec<ConsentItem>,
    },
    PairPage {
        heading: String,
        before: Option<PairSlot>,
        after: Option<PairSlot>,
    },
}

#[derive(Debug, Clone)]
pub struct PhotoCell {
    pub path: String,
    pub caption: String,
}

#[derive(Debug, Clone)]
pub struct TreatmentBlock {
    pub heading: String,
    pub detail_lines: Vec<String>,
    pub areas: Vec<AreaLine>,
}

#[derive(Debug, Clone)]
pub struct AreaLine {
    pub label: String,
    pub cost: f64,
}

#[derive(Debug, Clone)]
pub struct AnnotationBlock {
    pub label: String,
    pub payloads: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ConsentItem {
    pub label: String,
    pub signed_line: Option<String>,
    pub signature_data: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PairSlot {
    pub path: String,
    pub caption: String,
}

// ─── Composition ──────────────────────────────────────────────────────────────

/// Assemble the visit report sections. Fails fast when the visit or its
/// patient does not exist; empty collections simply omit their section.
pub fn compose_visit_report(
    conn: &Connection,
    visit_id: &Uuid,
) -> Result<ReportDocument, ReportError> {
    let settings = get_clinic_settings(conn)?;
    let visit = get_visit(conn, visit_id)?
        .ok_or_else(|| DatabaseError::not_found("Visit", visit_id))?;
    let patient = get_patient(conn, &visit.patient_id)?
        .ok_or_else(|| DatabaseError::not_found("Patient", visit.patient_id))?;

    let mut sections = vec![ReportSection::Title {
        clinic_name: settings.clinic_name.clone(),
        label: "Visit Report".into(),
    }];

    // Patient block: name always, the rest only when present.
    let mut patient_lines = vec![format!("Name: {}", patient.display_name())];
    if let Some(birthday) = patient.birthday {
        patient_lines.push(format!("Date of birth: {birthday}"));
    }
    if let Some(sex) = patient.sex {
        patient_lines.push(format!("Sex: {}", sex.as_str()));
    }
    if let Some(ethnicity) = &patient.ethnicity {
        patient_lines.push(format!("Ethnicity: {ethnicity}"));
    }
    if let Some(email) = &patient.email {
        patient_lines.push(format!("Email: {email}"));
    }
    if let Some(phone) = &patient.phone {
        patient_lines.push(format!("Phone: {phone}"));
    }
    if let Some(city) = &patient.city {
        match &patient.province {
            Some(province) => patient_lines.push(format!("City: {city}, {province}")),
            None => patient_lines.push(format!("City: {city}")),
        }
    }
    sections.push(ReportSection::PatientInfo {
        lines: patient_lines,
    });

    let mut visit_lines = vec![format!("Date: {}", visit.visit_date)];
    if let Some(time) = &visit.visit_time {
        visit_lines.push(format!("Time: {time}"));
    }
    if let Some(practitioner) = &visit.practitioner {
        visit_lines.push(format!("Practitioner: {practitioner}"));
    }
    let notes = visit
        .notes
        .as_deref()
        .map(strip_markup)
        .filter(|n| !n.is_empty());
    sections.push(ReportSection::VisitDetail {
        lines: visit_lines,
        notes,
    });

    let photos = list_photos_for_visit(conn, visit_id)?;
    if !photos.is_empty() {
        sections.push(ReportSection::PhotoGrid {
            cells: photos.iter().map(photo_cell).collect(),
        });
    }

    let treatments = list_treatments_for_visit(conn, visit_id)?;
    if !treatments.is_empty() {
        let mut blocks = Vec::with_capacity(treatments.len());
        for treatment in &treatments {
            let mut detail_lines = Vec::new();
            if let Some(treatment_type) = &treatment.treatment_type {
                detail_lines.push(format!("Type: {treatment_type}"));
            }
            if let Some(lot) = &treatment.lot_number {
                detail_lines.push(format!("Lot: {lot}"));
            }
            if let Some(expiry) = treatment.expiry_date {
                detail_lines.push(format!("Expiry: {expiry}"));
            }
            let areas = list_areas_for_treatment(conn, &treatment.id)?
                .iter()
                .map(area_line)
                .collect();
            blocks.push(TreatmentBlock {
                heading: treatment.heading(),
                detail_lines,
                areas,
            });
        }
        sections.push(ReportSection::TreatmentLedger {
            blocks,
            provincial_rate: settings.provincial_tax_rate,
            federal_rate: settings.federal_tax_rate,
        });
    }

    // One annotation section for the whole visit, one block per annotated
    // treatment.
    let mut annotation_blocks = Vec::new();
    for treatment in &treatments {
        let annotations = list_annotations_for_treatment(conn, &treatment.id)?;
        if !annotations.is_empty() {
            annotation_blocks.push(AnnotationBlock {
                label: treatment.heading(),
                payloads: annotations.into_iter().map(|a| a.points_json).collect(),
            });
        }
    }
    if !annotation_blocks.is_empty() {
        sections.push(ReportSection::AnnotationSummary {
            blocks: annotation_blocks,
        });
    }

    let consents = list_consents_for_patient(conn, &patient.id)?;
    if !consents.is_empty() {
        let items = consents
            .into_iter()
            .map(|consent| ConsentItem {
                label: consent.consent_type.label().into(),
                signed_line: consent.signed_at.map(|d| format!("Signed: {d}")),
                signature_data: consent.signature_data,
            })
            .collect();
        sections.push(ReportSection::Consents { items });
    }

    let stem = sanitize_filename(&format!(
        "{} {} {}",
        patient.last_name, patient.first_name, visit.visit_date
    ));
    Ok(ReportDocument {
        kind: ReportKind::Visit,
        title: format!("Visit Report — {}", patient.display_name()),
        filename: format!("visit-report-{stem}.pdf"),
        sections,
    })
}

/// Assemble the portfolio report: a title page section followed by one pair
/// page per entry.
pub fn compose_portfolio_report(
    conn: &Connection,
    portfolio_id: &Uuid,
) -> Result<ReportDocument, ReportError> {
    let settings = get_clinic_settings(conn)?;
    let portfolio = get_portfolio(conn, portfolio_id)?
        .ok_or_else(|| DatabaseError::not_found("Portfolio", portfolio_id))?;

    let mut sections = vec![ReportSection::Title {
        clinic_name: settings.clinic_name,
        label: format!("Portfolio — {}", portfolio.name),
    }];

    for (index, entry) in list_entries_for_portfolio(conn, portfolio_id)?
        .iter()
        .enumerate()
    {
        let before_photo = lookup_photo(conn, entry.before_photo_id.as_ref())?;
        let after_photo = lookup_photo(conn, entry.after_photo_id.as_ref())?;

        let heading = before_photo
            .as_ref()
            .or(after_photo.as_ref())
            .map(Photo::caption)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| format!("Case {}", index + 1));

        let before = before_photo.map(|photo| PairSlot {
            path: photo.original_path,
            caption: match entry.before_date {
                Some(date) => format!("Before — {date}"),
                None => "Before".into(),
            },
        });
        let after = after_photo.map(|photo| PairSlot {
            path: photo.original_path,
            caption: match entry.after_date {
                Some(date) => format!("After — {date}"),
                None => "After".into(),
            },
        });

        sections.push(ReportSection::PairPage {
            heading,
            before,
            after,
        });
    }

    let stem = sanitize_filename(&portfolio.name);
    Ok(ReportDocument {
        kind: ReportKind::Portfolio,
        title: format!("Portfolio — {}", portfolio.name),
        filename: format!("portfolio-{stem}.pdf"),
        sections,
    })
}

/// A dangling or soft-deleted photo reference behaves like a missing asset:
/// the slot stays empty.
fn lookup_photo(conn: &Connection, id: Option<&Uuid>) -> Result<Option<Photo>, DatabaseError> {
    match id {
        Some(id) => get_photo(conn, id),
        None => Ok(None),
    }
}

fn photo_cell(photo: &Photo) -> PhotoCell {
    PhotoCell {
        path: photo.original_path.clone(),
        caption: photo.caption(),
    }
}

fn area_line(area: &TreatmentArea) -> AreaLine {
    let label = match area.units {
        Some(units) => format!(
            "{} — {units} u — ${}",
            area.area_name,
            format_amount(area.cost)
        ),
        None => format!("{} — ${}", area.area_name, format_amount(area.cost)),
    };
    AreaLine {
        label,
        cost: area.cost,
    }
}

// ─── Rendering ────────────────────────────────────────────────────────────────

/// Render the document to PDF bytes in one forward pass.
pub fn render(document: &ReportDocument) -> Result<Vec<u8>, ReportError> {
    let (page_width, page_height) = match document.kind {
        ReportKind::Visit => (Mm(210.0), Mm(297.0)),
        ReportKind::Portfolio => (Mm(297.0), Mm(210.0)),
    };

    let (doc, first_page, first_layer) =
        PdfDocument::new(&document.title, page_width, page_height, "Layer 1");
    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(pdf_error)?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_error)?,
        mono: doc
            .add_builtin_font(BuiltinFont::Courier)
            .map_err(pdf_error)?,
    };

    {
        let first_layer = doc.get_page(first_page).get_layer(first_layer);
        let mut layout = LayoutCursor::new(&doc, first_layer, page_width, page_height);
        let mut pair_seen = false;

        for section in &document.sections {
            match section {
                ReportSection::Title { clinic_name, label } => {
                    sections::render_title(&mut layout, &fonts, clinic_name, label);
                }
                ReportSection::PatientInfo { lines } => {
                    sections::render_patient_info(&mut layout, &fonts, lines);
                }
                ReportSection::VisitDetail { lines, notes } => {
                    sections::render_visit_detail(&mut layout, &fonts, lines, notes.as_deref());
                }
                ReportSection::PhotoGrid { cells } => {
                    layout.new_page();
                    sections::render_photo_grid(&mut layout, &fonts, cells);
                }
                ReportSection::TreatmentLedger {
                    blocks,
                    provincial_rate,
                    federal_rate,
                } => {
                    layout.new_page();
                    sections::render_treatment_ledger(
                        &mut layout,
                        &fonts,
                        blocks,
                        *provincial_rate,
                        *federal_rate,
                    );
                }
                ReportSection::AnnotationSummary { blocks } => {
                    layout.new_page();
                    sections::render_annotation_summary(&mut layout, &fonts, blocks);
                }
                ReportSection::Consents { items } => {
                    layout.new_page();
                    sections::render_consents(&mut layout, &fonts, items);
                }
                ReportSection::PairPage {
                    heading,
                    before,
                    after,
                } => {
                    // The first pair shares the title page.
                    if pair_seen {
                        layout.new_page();
                    }
                    pair_seen = true;
                    sections::render_pair_page(
                        &mut layout,
                        &fonts,
                        heading,
                        before.as_ref(),
                        after.as_ref(),
                    );
                }
            }
        }

        tracing::debug!(
            pages = layout.page_count(),
            sections = document.sections.len(),
            "report laid out"
        );
    }

    let mut buffer = BufWriter::new(Vec::new());
    doc.save(&mut buffer)
        .map_err(|e| ReportError::Pdf(format!("PDF save error: {e}")))?;
    buffer
        .into_inner()
        .map_err(|e| ReportError::Pdf(format!("PDF buffer error: {e}")))
}

// ─── Persistence ──────────────────────────────────────────────────────────────

/// Write report bytes under `dir` as `filename`. The bytes land in a temp
/// file first and are renamed into place; a failed write leaves no partial
/// file under the final name.
pub async fn save_report(
    bytes: Vec<u8>,
    dir: PathBuf,
    filename: String,
) -> Result<PathBuf, ReportError> {
    tokio::task::spawn_blocking(move || -> Result<PathBuf, ReportError> {
        use std::io::Write;

        std::fs::create_dir_all(&dir)?;
        let mut staged = tempfile::NamedTempFile::new_in(&dir)?;
        staged.write_all(&bytes)?;
        staged.flush()?;

        let path = dir.join(&filename);
        staged.persist(&path).map_err(|e| ReportError::Sink(e.error))?;
        tracing::info!(path = %path.display(), "report written");
        Ok(path)
    })
    .await
    .map_err(|e| ReportError::Pdf(format!("save task failed: {e}")))?
}

/// Compose, render and persist the visit report. Completes or fails exactly
/// once; there is no partial-success signal.
pub async fn generate_visit_report(
    conn: &Connection,
    visit_id: &Uuid,
    out_dir: &Path,
) -> Result<PathBuf, ReportError> {
    let document = compose_visit_report(conn, visit_id)?;
    let bytes = render(&document)?;
    save_report(bytes, out_dir.to_path_buf(), document.filename).await
}

/// Compose, render and persist the portfolio report.
pub async fn generate_portfolio_report(
    conn: &Connection,
    portfolio_id: &Uuid,
    out_dir: &Path,
) -> Result<PathBuf, ReportError> {
    let document = compose_portfolio_report(conn, portfolio_id)?;
    let bytes = render(&document)?;
    save_report(bytes, out_dir.to_path_buf(), document.filename).await
}

// ─── Filenames ────────────────────────────────────────────────────────────────

/// Deterministic, filesystem-safe name fragment: characters outside
/// `[A-Za-z0-9_- ]` are stripped, whitespace runs collapse to single hyphens.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ' '))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

// ─── Tests ────────────────────────────────────────────────────────────────────
