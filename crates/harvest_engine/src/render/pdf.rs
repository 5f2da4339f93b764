use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument};

use super::layout::{DocumentPlan, FontWeight};
use super::RenderError;

const LAYER_NAME: &str = "Layer 1";

/// Encodes a laid-out document with the built-in Helvetica faces.
///
/// `plan` text is expected to be sanitized already; the built-in fonts use a
/// single-byte encoding.
pub fn encode_pdf(plan: &DocumentPlan, doc_title: &str) -> Result<Vec<u8>, RenderError> {
    let width = Mm(plan.geometry.width_mm);
    let height = Mm(plan.geometry.height_mm);
    let (doc, first_page, first_layer) = PdfDocument::new(doc_title, width, height, LAYER_NAME);

    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(encode_error)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(encode_error)?;

    for (idx, frame) in plan.pages.iter().enumerate() {
        let (page, layer) = if idx == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(width, height, LAYER_NAME)
        };
        let layer = doc.get_page(page).get_layer(layer);
        for line in &frame.lines {
            let font: &IndirectFontRef = match line.weight {
                FontWeight::Regular => &regular,
                FontWeight::Bold => &bold,
            };
            layer.use_text(
                line.text.as_str(),
                line.size_pt,
                Mm(line.x_mm),
                Mm(plan.geometry.height_mm - line.baseline_mm),
                font,
            );
        }
    }

    doc.save_to_bytes().map_err(encode_error)
}

fn encode_error(err: impl std::fmt::Debug) -> RenderError {
    RenderError::Encode(format!("{err:?}"))
}
