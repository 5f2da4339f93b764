//! Story document rendering: the ordered entries become one PDF named after
//! the story title.

mod layout;
mod metrics;
mod pdf;

use std::fs;
use std::path::{Path, PathBuf};

use harvest_logging::{harvest_info, harvest_warn};
use thiserror::Error;

use crate::filename::story_base_name;
use crate::persist::{AtomicFileWriter, PersistError};
use crate::sanitize::sanitize;
use crate::store::Entry;

pub use layout::{
    plan_document, DocumentPlan, FontWeight, PageFrame, PageGeometry, PlacedLine, Section,
    SectionKind,
};
pub use metrics::text_width_mm;

/// Where the document lands relative to the chosen output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputLayout {
    /// `{dir}/{base}/{base}.pdf`; falls back to `{dir}/{base}.pdf` if the
    /// story folder cannot be created.
    #[default]
    StoryFolder,
    /// `{dir}/{base}.pdf`
    Flat,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no data to generate PDF")]
    EmptyInput,
    #[error("could not encode PDF: {0}")]
    Encode(String),
    #[error("could not write PDF: {0}")]
    Write(#[from] PersistError),
}

/// Renders `entries` and returns the absolute path of the written file.
///
/// The first entry is the title page. Nothing is written for empty input.
/// An existing file with the same name is replaced.
pub fn render_document(
    entries: &[Entry],
    output_dir: &Path,
    layout: OutputLayout,
) -> Result<PathBuf, RenderError> {
    let first = entries.first().ok_or(RenderError::EmptyInput)?;
    let base_name = story_base_name(&first.title);

    let plan = plan_document(entries, PageGeometry::default());
    let bytes = pdf::encode_pdf(&plan, &sanitize(&first.title))?;

    let dir = resolve_output_dir(output_dir, &base_name, layout);
    let written = AtomicFileWriter::new(dir).write(&format!("{base_name}.pdf"), &bytes)?;
    let path = std::path::absolute(&written).unwrap_or(written);
    harvest_info!(
        "Rendered {} entries on {} pages to {}",
        entries.len(),
        plan.pages.len(),
        path.display()
    );
    Ok(path)
}

/// Directory the document will be written into.
pub fn resolve_output_dir(output_dir: &Path, base_name: &str, layout: OutputLayout) -> PathBuf {
    match layout {
        OutputLayout::Flat => output_dir.to_path_buf(),
        OutputLayout::StoryFolder => {
            let folder = output_dir.join(base_name);
            match fs::create_dir_all(&folder) {
                Ok(()) => folder,
                Err(err) => {
                    harvest_warn!(
                        "Could not create story folder {}: {}; writing to {}",
                        folder.display(),
                        err,
                        output_dir.display()
                    );
                    output_dir.to_path_buf()
                }
            }
        }
    }
}
