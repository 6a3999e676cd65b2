use std::io::Cursor;

use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfLayerReference,
    image_crate::codecs::png::PngDecoder,
};

use super::DocumentError;

static LOGO: &[u8] = include_bytes!("../../static/img/logo.png");

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 18.0;
const FONT_SIZE: f32 = 10.0;
const LINE_HEIGHT: f32 = 5.0;
/// Baseline of the first text line; the logo sits above it.
const TEXT_TOP: f32 = 262.0;

pub const LINES_PER_PAGE: usize = 48;

pub fn page_count(lines: usize) -> usize {
    lines.div_ceil(LINES_PER_PAGE).max(1)
}

fn pdf_error(e: impl std::fmt::Display) -> DocumentError {
    DocumentError::Pdf(e.to_string())
}

fn draw_logo(layer: PdfLayerReference) -> Result<(), DocumentError> {
    let decoder =
        PngDecoder::new(Cursor::new(LOGO)).map_err(|e| DocumentError::Logo(e.to_string()))?;
    let image = Image::try_from(decoder).map_err(|e| DocumentError::Logo(e.to_string()))?;

    image.add_to_layer(
        layer,
        ImageTransform {
            translate_x: Some(Mm(MARGIN)),
            translate_y: Some(Mm(TEXT_TOP + 8.0)),
            dpi: Some(150.0),
            ..Default::default()
        },
    );
    Ok(())
}

fn draw_lines(layer: &PdfLayerReference, font: &IndirectFontRef, lines: &[&str]) {
    let mut y = TEXT_TOP;
    for line in lines {
        layer.use_text(*line, FONT_SIZE, Mm(MARGIN), Mm(y), font);
        y -= LINE_HEIGHT;
    }
}

/// A4 pages of monospaced text, `LINES_PER_PAGE` lines each, logo on the first.
pub fn layout(title: &str, body: &str) -> Result<Vec<u8>, DocumentError> {
    let lines: Vec<&str> = body.lines().collect();

    let (doc, first_page, first_layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Courier)
        .map_err(pdf_error)?;

    draw_logo(doc.get_page(first_page).get_layer(first_layer))?;

    let mut chunks = lines.chunks(LINES_PER_PAGE);
    let first_chunk = chunks.next().unwrap_or(&[]);
    draw_lines(
        &doc.get_page(first_page).get_layer(first_layer),
        &font,
        first_chunk,
    );

    for (i, chunk) in chunks.enumerate() {
        let (page, layer) = doc.add_page(
            Mm(PAGE_WIDTH),
            Mm(PAGE_HEIGHT),
            format!("Layer {}", i + 2),
        );
        draw_lines(&doc.get_page(page).get_layer(layer), &font, chunk);
    }

    tracing::debug!(title, pages = page_count(lines.len()), "Laid out document");

    doc.save_to_bytes().map_err(pdf_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_rounds_up_and_never_hits_zero() {
        assert_eq!(page_count(0), 1);
        assert_eq!(page_count(LINES_PER_PAGE), 1);
        assert_eq!(page_count(LINES_PER_PAGE + 1), 2);
        assert_eq!(page_count(LINES_PER_PAGE * 3), 3);
    }

    #[test]
    fn short_body_is_a_pdf() {
        let bytes = layout("Payslip", "Hello\nWorld").unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn long_body_grows_the_file() {
        let short = layout("Report", "line").unwrap();
        let body: String = (0..LINES_PER_PAGE * 3)
            .map(|i| format!("line {i}\n"))
            .collect();
        let long = layout("Report", &body).unwrap();
        assert!(long.starts_with(b"%PDF"));
        assert!(long.len() > short.len());
    }

    #[test]
    fn embedded_logo_decodes() {
        let decoder = PngDecoder::new(Cursor::new(LOGO)).unwrap();
        assert!(Image::try_from(decoder).is_ok());
    }
}
