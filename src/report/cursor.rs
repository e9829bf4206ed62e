//! Layout cursor: the single owner of page/vertical bookkeeping during
//! rendering. Section renderers only ever call `advance`, `would_overflow`,
//! `ensure_room` and `new_page`; they never track coordinates themselves.

use printpdf::{Mm, PdfDocumentReference, PdfLayerReference};

pub(crate) const MARGIN_LEFT: Mm = Mm(20.0);
pub(crate) const MARGIN_TOP: Mm = Mm(17.0);
pub(crate) const MARGIN_BOTTOM: Mm = Mm(18.0);

pub(crate) struct LayoutCursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    page_width: Mm,
    page_height: Mm,
    y: Mm,
    pages: usize,
}

impl<'a> LayoutCursor<'a> {
    pub(crate) fn new(
        doc: &'a PdfDocumentReference,
        first_layer: PdfLayerReference,
        page_width: Mm,
        page_height: Mm,
    ) -> Self {
        Self {
            doc,
            layer: first_layer,
            page_width,
            page_height,
            y: Mm(page_height.0 - MARGIN_TOP.0),
            pages: 1,
        }
    }

    pub(crate) fn layer(&self) -> PdfLayerReference {
        self.layer.clone()
    }

    /// Current vertical write position, measured from the page bottom.
    pub(crate) fn y(&self) -> Mm {
        self.y
    }

    pub(crate) fn page_count(&self) -> usize {
        self.pages
    }

    /// Move the write position down by `height`.
    pub(crate) fn advance(&mut self, height: Mm) {
        self.y = Mm(self.y.0 - height.0);
    }

    /// Would writing `height` cross the bottom margin?
    pub(crate) fn would_overflow(&self, height: Mm) -> bool {
        self.y.0 - height.0 < MARGIN_BOTTOM.0
    }

    /// Start a new page first if `height` does not fit on this one.
    pub(crate) fn ensure_room(&mut self, height: Mm) {
        if self.would_overflow(height) {
            self.new_page();
        }
    }

    /// Start a new page and reset the write position to the top margin.
    pub(crate) fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(
            self.page_width,
            self.page_height,
            format!("Page {}", self.pages + 1),
        );
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.pages += 1;
        self.y = Mm(self.page_height.0 - MARGIN_TOP.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use printpdf::PdfDocument;

    fn cursor_fixture(doc: &PdfDocumentReference, layer: PdfLayerReference) -> LayoutCursor<'_> {
        LayoutCursor::new(doc, layer, Mm(210.0), Mm(297.0))
    }

    #[test]
    fn starts_below_the_top_margin() {
        let (doc, page, layer) = PdfDocument::new("t", Mm(210.0), Mm(297.0), "Layer 1");
        let cursor = cursor_fixture(&doc, doc.get_page(page).get_layer(layer));
        assert_eq!(cursor.y().0, 297.0 - MARGIN_TOP.0);
        assert_eq!(cursor.page_count(), 1);
    }

    #[test]
    fn advance_moves_down_monotonically() {
        let (doc, page, layer) = PdfDocument::new("t", Mm(210.0), Mm(297.0), "Layer 1");
        let mut cursor = cursor_fixture(&doc, doc.get_page(page).get_layer(layer));
        let before = cursor.y().0;
        cursor.advance(Mm(12.5));
        assert_eq!(cursor.y().0, before - 12.5);
    }

    #[test]
    fn overflow_starts_a_new_page_at_the_top_margin() {
        let (doc, page, layer) = PdfDocument::new("t", Mm(210.0), Mm(297.0), "Layer 1");
        let mut cursor = cursor_fixture(&doc, doc.get_page(page).get_layer(layer));

        // Eat almost the whole content area, then ask for a tall row.
        cursor.advance(Mm(250.0));
        assert!(cursor.would_overflow(Mm(50.0)));
        cursor.ensure_room(Mm(50.0));

        assert_eq!(cursor.page_count(), 2);
        assert_eq!(cursor.y().0, 297.0 - MARGIN_TOP.0);
    }

    #[test]
    fn ensure_room_is_a_no_op_when_content_fits() {
        let (doc, page, layer) = PdfDocument::new("t", Mm(210.0), Mm(297.0), "Layer 1");
        let mut cursor = cursor_fixture(&doc, doc.get_page(page).get_layer(layer));
        cursor.ensure_room(Mm(50.0));
        assert_eq!(cursor.page_count(), 1);
    }
}
