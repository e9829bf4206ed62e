//! Section renderers. Each renderer draws through the layout cursor and
//! absorbs its own per-item failures: a missing photo file, an unreadable
//! annotation payload or a failing signature embed degrade locally and never
//! abort the document.

use base64::Engine as _;
use printpdf::image_crate::{self, DynamicImage, GenericImageView};
use printpdf::{Image, ImageTransform, IndirectFontRef, Mm, PdfLayerReference};

use crate::costs::{format_amount, rollup};
use crate::models::parse_annotation_views;

use super::cursor::{LayoutCursor, MARGIN_LEFT};
use super::text::wrap_text;
use super::{AnnotationBlock, ConsentItem, PairSlot, PhotoCell, TreatmentBlock};

pub(crate) struct Fonts {
    pub regular: IndirectFontRef,
    pub bold: IndirectFontRef,
    pub mono: IndirectFontRef,
}

// Layout constants that are part of the rendered contract.
pub const PHOTO_COLUMNS: usize = 3;
const CELL_WIDTH: Mm = Mm(52.0);
const CELL_HEIGHT: Mm = Mm(39.0);
const CELL_GAP_X: Mm = Mm(6.0);
const CELL_GAP_Y: Mm = Mm(10.0);
const CAPTION_DROP: Mm = Mm(4.0);
const SIGNATURE_WIDTH: Mm = Mm(50.0);
const SIGNATURE_HEIGHT: Mm = Mm(20.0);
const SLOT_WIDTH: Mm = Mm(125.0);
const SLOT_HEIGHT: Mm = Mm(130.0);
const SLOT_GAP: Mm = Mm(7.0);

const LINE: Mm = Mm(4.5);
const HEADING_DROP: Mm = Mm(6.0);
const WRAP_WIDTH: usize = 95;

fn body_line(cursor: &mut LayoutCursor, font: &IndirectFontRef, indent: f64, text: &str) {
    cursor.ensure_room(LINE);
    cursor
        .layer()
        .use_text(text, 9.0, Mm(MARGIN_LEFT.0 + indent as f32), cursor.y(), font);
    cursor.advance(LINE);
}

fn heading_line(cursor: &mut LayoutCursor, fonts: &Fonts, text: &str) {
    cursor.ensure_room(Mm(HEADING_DROP.0 + LINE.0));
    cursor
        .layer()
        .use_text(text, 11.0, MARGIN_LEFT, cursor.y(), &fonts.bold);
    cursor.advance(HEADING_DROP);
}

// ─── Text sections ────────────────────────────────────────────────────────────

pub(crate) fn render_title(cursor: &mut LayoutCursor, fonts: &Fonts, clinic_name: &str, label: &str) {
    cursor
        .layer()
        .use_text(clinic_name, 16.0, MARGIN_LEFT, cursor.y(), &fonts.bold);
    cursor.advance(Mm(8.0));
    cursor
        .layer()
        .use_text(label, 12.0, MARGIN_LEFT, cursor.y(), &fonts.regular);
    cursor.advance(Mm(12.0));
}

pub(crate) fn render_patient_info(cursor: &mut LayoutCursor, fonts: &Fonts, lines: &[String]) {
    heading_line(cursor, fonts, "PATIENT:");
    for line in lines {
        body_line(cursor, &fonts.regular, 5.0, line);
    }
    cursor.advance(Mm(4.0));
}

pub(crate) fn render_visit_detail(
    cursor: &mut LayoutCursor,
    fonts: &Fonts,
    lines: &[String],
    notes: Option<&str>,
) {
    heading_line(cursor, fonts, "VISIT:");
    for line in lines {
        body_line(cursor, &fonts.regular, 5.0, line);
    }
    cursor.advance(Mm(4.0));

    if let Some(notes) = notes {
        heading_line(cursor, fonts, "NOTES:");
        for paragraph in notes.lines() {
            for line in wrap_text(paragraph, WRAP_WIDTH) {
                body_line(cursor, &fonts.regular, 5.0, &line);
            }
        }
        cursor.advance(Mm(4.0));
    }
}

// ─── Photo grid ───────────────────────────────────────────────────────────────

/// Row sizes of an n-photo grid: full rows of [`PHOTO_COLUMNS`], then the
/// remainder.
pub(crate) fn grid_rows(count: usize) -> Vec<usize> {
    (0..count)
        .step_by(PHOTO_COLUMNS)
        .map(|start| PHOTO_COLUMNS.min(count - start))
        .collect()
}

pub(crate) fn render_photo_grid(cursor: &mut LayoutCursor, fonts: &Fonts, cells: &[PhotoCell]) {
    heading_line(cursor, fonts, "PHOTOS:");

    let row_height = Mm(CELL_HEIGHT.0 + CAPTION_DROP.0 + CELL_GAP_Y.0);
    let mut index = 0;
    for row_len in grid_rows(cells.len()) {
        cursor.ensure_room(row_height);
        for column in 0..row_len {
            let cell = &cells[index];
            index += 1;

            let image = match load_photo(&cell.path) {
                Ok(image) => image,
                Err(reason) => {
                    // Cell stays empty; the caption is not rendered either.
                    tracing::warn!(path = %cell.path, %reason, "skipping unreadable photo");
                    continue;
                }
            };

            let x = Mm(MARGIN_LEFT.0 + column as f32 * (CELL_WIDTH.0 + CELL_GAP_X.0));
            let cell_bottom = Mm(cursor.y().0 - CELL_HEIGHT.0);
            place_image(cursor.layer(), &image, x, cell_bottom, CELL_WIDTH, CELL_HEIGHT);
            cursor.layer().use_text(
                &cell.caption,
                8.0,
                x,
                Mm(cell_bottom.0 - CAPTION_DROP.0),
                &fonts.regular,
            );
        }
        cursor.advance(row_height);
    }
}

// ─── Treatment ledger ─────────────────────────────────────────────────────────

pub(crate) fn render_treatment_ledger(
    cursor: &mut LayoutCursor,
    fonts: &Fonts,
    blocks: &[TreatmentBlock],
    provincial_rate: f64,
    federal_rate: f64,
) {
    heading_line(cursor, fonts, "TREATMENTS:");

    let mut subtotal = 0.0;
    for block in blocks {
        cursor.ensure_room(Mm(22.0));
        cursor
            .layer()
            .use_text(&block.heading, 10.0, MARGIN_LEFT, cursor.y(), &fonts.bold);
        cursor.advance(Mm(5.0));

        for line in &block.detail_lines {
            body_line(cursor, &fonts.regular, 5.0, line);
        }
        for area in &block.areas {
            subtotal += area.cost;
            body_line(cursor, &fonts.mono, 5.0, &area.label);
        }
        cursor.advance(Mm(3.0));
    }

    let summary = rollup(subtotal, provincial_rate, federal_rate);
    cursor.ensure_room(Mm(24.0));
    cursor.advance(Mm(2.0));
    body_line(
        cursor,
        &fonts.mono,
        5.0,
        &format!("Subtotal: ${}", format_amount(summary.subtotal)),
    );
    if provincial_rate != 0.0 {
        body_line(
            cursor,
            &fonts.mono,
            5.0,
            &format!(
                "Provincial tax ({provincial_rate}%): ${}",
                format_amount(summary.provincial_tax)
            ),
        );
    }
    if federal_rate != 0.0 {
        body_line(
            cursor,
            &fonts.mono,
            5.0,
            &format!(
                "Federal tax ({federal_rate}%): ${}",
                format_amount(summary.federal_tax)
            ),
        );
    }
    body_line(
        cursor,
        &fonts.bold,
        5.0,
        &format!("Total: ${}", format_amount(summary.total)),
    );
}

// ─── Annotation summary ───────────────────────────────────────────────────────

/// Lines rendered for one annotation payload: one "view: n points" line per
/// view, or a single fallback line when the payload does not parse.
pub(crate) fn annotation_lines(points_json: &str) -> Vec<String> {
    match parse_annotation_views(points_json) {
        Ok(views) => views
            .iter()
            .map(|view| {
                let count = view.points.len();
                let plural = if count == 1 { "" } else { "s" };
                format!("{}: {count} point{plural}", view.view)
            })
            .collect(),
        Err(error) => {
            tracing::warn!(%error, "unreadable annotation point data");
            vec!["Annotation data could not be read".into()]
        }
    }
}

pub(crate) fn render_annotation_summary(
    cursor: &mut LayoutCursor,
    fonts: &Fonts,
    blocks: &[AnnotationBlock],
) {
    heading_line(cursor, fonts, "INJECTION ANNOTATIONS:");

    for block in blocks {
        cursor.ensure_room(Mm(16.0));
        cursor
            .layer()
            .use_text(&block.label, 10.0, MARGIN_LEFT, cursor.y(), &fonts.bold);
        cursor.advance(Mm(5.0));

        for payload in &block.payloads {
            for line in annotation_lines(payload) {
                body_line(cursor, &fonts.regular, 5.0, &line);
            }
        }
        cursor.advance(Mm(3.0));
    }
}

// ─── Consents ─────────────────────────────────────────────────────────────────

/// Decode a signature-pad capture: base64 PNG, with or without a data-URL
/// prefix.
pub(crate) fn decode_signature(data: &str) -> Result<DynamicImage, String> {
    let raw = data
        .rsplit_once("base64,")
        .map(|(_, tail)| tail)
        .unwrap_or(data);
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(raw.trim())
        .map_err(|e| e.to_string())?;
    image_crate::load_from_memory(&bytes).map_err(|e| e.to_string())
}

pub(crate) fn render_consents(cursor: &mut LayoutCursor, fonts: &Fonts, items: &[ConsentItem]) {
    heading_line(cursor, fonts, "CONSENTS:");

    for item in items {
        cursor.ensure_room(Mm(SIGNATURE_HEIGHT.0 + 18.0));
        cursor
            .layer()
            .use_text(&item.label, 10.0, MARGIN_LEFT, cursor.y(), &fonts.bold);
        cursor.advance(Mm(5.0));

        if let Some(signed) = &item.signed_line {
            body_line(cursor, &fonts.regular, 5.0, signed);
        }

        if let Some(data) = &item.signature_data {
            match decode_signature(data) {
                Ok(image) => {
                    let bottom = Mm(cursor.y().0 - SIGNATURE_HEIGHT.0);
                    place_image(
                        cursor.layer(),
                        &image,
                        Mm(MARGIN_LEFT.0 + 5.0),
                        bottom,
                        SIGNATURE_WIDTH,
                        SIGNATURE_HEIGHT,
                    );
                    cursor.advance(Mm(SIGNATURE_HEIGHT.0 + 2.0));
                }
                Err(reason) => {
                    // Text lines stay; only the image is dropped.
                    tracing::warn!(%reason, "signature embed failed, skipping image");
                }
            }
        }
        cursor.advance(Mm(4.0));
    }
}

// ─── Portfolio pair pages ─────────────────────────────────────────────────────

pub(crate) fn render_pair_page(
    cursor: &mut LayoutCursor,
    fonts: &Fonts,
    heading: &str,
    before: Option<&PairSlot>,
    after: Option<&PairSlot>,
) {
    cursor
        .layer()
        .use_text(heading, 12.0, MARGIN_LEFT, cursor.y(), &fonts.bold);
    cursor.advance(Mm(10.0));

    let top = cursor.y();
    let slots = [
        (before, MARGIN_LEFT.0),
        (after, MARGIN_LEFT.0 + SLOT_WIDTH.0 + SLOT_GAP.0),
    ];
    for (slot, x) in slots {
        let Some(slot) = slot else { continue };
        match load_photo(&slot.path) {
            Ok(image) => {
                let bottom = Mm(top.0 - SLOT_HEIGHT.0);
                place_image(cursor.layer(), &image, Mm(x), bottom, SLOT_WIDTH, SLOT_HEIGHT);
                cursor.layer().use_text(
                    &slot.caption,
                    10.0,
                    Mm(x),
                    Mm(bottom.0 - 6.0),
                    &fonts.regular,
                );
            }
            Err(reason) => {
                tracing::warn!(path = %slot.path, %reason, "skipping unreadable portfolio photo");
            }
        }
    }
    cursor.advance(Mm(SLOT_HEIGHT.0 + 12.0));
}

// ─── Image plumbing ───────────────────────────────────────────────────────────

fn load_photo(path: &str) -> Result<DynamicImage, String> {
    image_crate::open(path).map_err(|e| e.to_string())
}

/// Scale the image to fit the box, centered, and add it to the layer.
fn place_image(
    layer: PdfLayerReference,
    image: &DynamicImage,
    x: Mm,
    y: Mm,
    max_width: Mm,
    max_height: Mm,
) {
    let dpi = 300.0f32;
    let (px_width, px_height) = image.dimensions();
    let natural_width = px_width as f32 * 25.4 / dpi;
    let natural_height = px_height as f32 * 25.4 / dpi;
    let scale = (max_width.0 / natural_width).min(max_height.0 / natural_height);

    Image::from_dynamic_image(image).add_to_layer(
        layer,
        ImageTransform {
            translate_x: Some(Mm(x.0 + (max_width.0 - natural_width * scale) / 2.0)),
            translate_y: Some(Mm(y.0 + (max_height.0 - natural_height * scale) / 2.0)),
            scale_x: Some(scale),
            scale_y: Some(scale),
            dpi: Some(dpi),
            ..Default::default()
        },
    );
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use printpdf::{BuiltinFont, PdfDocument};

    fn fixture() -> (printpdf::PdfDocumentReference, Fonts, PdfLayerReference) {
        let (doc, page, layer) = PdfDocument::new("t", Mm(210.0), Mm(297.0), "Layer 1");
        let fonts = Fonts {
            regular: doc.add_builtin_font(BuiltinFont::Helvetica).unwrap(),
            bold: doc.add_builtin_font(BuiltinFont::HelveticaBold).unwrap(),
            mono: doc.add_builtin_font(BuiltinFont::Courier).unwrap(),
        };
        let layer = doc.get_page(page).get_layer(layer);
        (doc, fonts, layer)
    }

    fn png_fixture(dir: &std::path::Path) -> String {
        let path = dir.join("photo.png");
        image_crate::RgbImage::new(12, 9).save(&path).unwrap();
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn seven_photos_make_rows_of_three_three_one() {
        assert_eq!(grid_rows(7), vec![3, 3, 1]);
        assert_eq!(grid_rows(3), vec![3]);
        assert_eq!(grid_rows(0), Vec::<usize>::new());
    }

    #[test]
    fn grid_overflow_starts_a_second_page() {
        let tmp = tempfile::tempdir().unwrap();
        let path = png_fixture(tmp.path());
        let cells: Vec<PhotoCell> = (0..15)
            .map(|i| PhotoCell {
                path: path.clone(),
                caption: format!("front - {i}"),
            })
            .collect();

        let (doc, fonts, layer) = fixture();
        let mut cursor = LayoutCursor::new(&doc, layer, Mm(210.0), Mm(297.0));
        render_photo_grid(&mut cursor, &fonts, &cells);

        // 15 photos = 5 rows; only 4 rows fit above the bottom threshold.
        assert_eq!(cursor.page_count(), 2);
    }

    #[test]
    fn missing_photo_files_do_not_abort_the_grid() {
        let tmp = tempfile::tempdir().unwrap();
        let good = png_fixture(tmp.path());
        let cells = vec![
            PhotoCell {
                path: good,
                caption: "front".into(),
            },
            PhotoCell {
                path: "/nonexistent/gone.png".into(),
                caption: "left".into(),
            },
        ];

        let (doc, fonts, layer) = fixture();
        let mut cursor = LayoutCursor::new(&doc, layer, Mm(210.0), Mm(297.0));
        render_photo_grid(&mut cursor, &fonts, &cells);
        assert_eq!(cursor.page_count(), 1);
    }

    #[test]
    fn annotation_lines_count_points_per_view() {
        let json = r#"[{"view": "front", "points": [{"x": 1.0, "y": 2.0}]},
                       {"view": "left", "points": [{"x": 1.0, "y": 2.0}, {"x": 2.0, "y": 3.0}]}]"#;
        assert_eq!(
            annotation_lines(json),
            vec!["front: 1 point".to_string(), "left: 2 points".to_string()]
        );
    }

    #[test]
    fn corrupt_annotation_yields_exactly_one_fallback_line() {
        let lines = annotation_lines("{definitely not json");
        assert_eq!(lines, vec!["Annotation data could not be read".to_string()]);
    }

    #[test]
    fn decode_signature_accepts_data_url_prefix() {
        let mut png = Vec::new();
        let image = image_crate::DynamicImage::ImageRgb8(image_crate::RgbImage::new(4, 4));
        image
            .write_to(
                &mut std::io::Cursor::new(&mut png),
                image_crate::ImageOutputFormat::Png,
            )
            .unwrap();
        let encoded = base64::engine::general_purpose::STANDARD.encode(&png);

        assert!(decode_signature(&encoded).is_ok());
        assert!(decode_signature(&format!("data:image/png;base64,{encoded}")).is_ok());
    }

    #[test]
    fn decode_signature_rejects_garbage() {
        assert!(decode_signature("not base64 at all!!!").is_err());
        let bogus = base64::engine::general_purpose::STANDARD.encode(b"not an image");
        assert!(decode_signature(&bogus).is_err());
    }

    #[test]
    fn consent_with_bad_signature_keeps_text_lines() {
        let (doc, fonts, layer) = fixture();
        let mut cursor = LayoutCursor::new(&doc, layer, Mm(210.0), Mm(297.0));
        let items = vec![ConsentItem {
            label: "Botulinum toxin consent".into(),
            signed_line: Some("Signed: 2026-01-05".into()),
            signature_data: Some("garbage".into()),
        }];
        render_consents(&mut cursor, &fonts, &items);
        assert_eq!(cursor.page_count(), 1);
    }
}
