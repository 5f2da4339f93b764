//! Page layout for the story document, independent of the PDF backend.
//!
//! The first entry becomes a title page, every later entry a chapter that
//! starts on a fresh page. All text is sanitized before it is measured.

use crate::sanitize::sanitize;
use crate::store::Entry;

use super::metrics::{pt_to_mm, text_width_mm};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub weight: FontWeight,
    pub size_pt: f32,
    pub line_height_mm: f32,
    pub align: Align,
}

pub const TITLE_HEADING: TextStyle = TextStyle {
    weight: FontWeight::Bold,
    size_pt: 24.0,
    line_height_mm: 15.0,
    align: Align::Center,
};
pub const TITLE_BODY: TextStyle = TextStyle {
    weight: FontWeight::Regular,
    size_pt: 12.0,
    line_height_mm: 7.0,
    align: Align::Left,
};
pub const CHAPTER_HEADING: TextStyle = TextStyle {
    weight: FontWeight::Bold,
    size_pt: 16.0,
    line_height_mm: 10.0,
    align: Align::Left,
};
pub const CHAPTER_BODY: TextStyle = TextStyle {
    weight: FontWeight::Regular,
    size_pt: 11.0,
    line_height_mm: 6.0,
    align: Align::Left,
};

const TITLE_GAP_MM: f32 = 10.0;

/// Page size and margins in millimetres. Defaults to A4.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width_mm: f32,
    pub height_mm: f32,
    pub margin_left_mm: f32,
    pub margin_right_mm: f32,
    pub margin_top_mm: f32,
    /// Distance from the bottom edge at which text breaks to a new page.
    pub margin_bottom_mm: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            width_mm: 210.0,
            height_mm: 297.0,
            margin_left_mm: 10.0,
            margin_right_mm: 10.0,
            margin_top_mm: 10.0,
            margin_bottom_mm: 15.0,
        }
    }
}

impl PageGeometry {
    pub fn content_width_mm(&self) -> f32 {
        self.width_mm - self.margin_left_mm - self.margin_right_mm
    }

    fn break_at_mm(&self) -> f32 {
        self.height_mm - self.margin_bottom_mm
    }
}

/// A single line of text with its position measured from the page's top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub weight: FontWeight,
    pub size_pt: f32,
    pub x_mm: f32,
    pub baseline_mm: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageFrame {
    pub lines: Vec<PlacedLine>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    TitlePage,
    Chapter,
}

/// Where one entry landed in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub kind: SectionKind,
    pub title: String,
    pub first_page: usize,
    pub page_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentPlan {
    pub geometry: PageGeometry,
    pub pages: Vec<PageFrame>,
    pub sections: Vec<Section>,
}

pub fn plan_document(entries: &[Entry], geometry: PageGeometry) -> DocumentPlan {
    let mut layouter = Layouter::new(geometry);
    let mut sections = Vec::with_capacity(entries.len());

    for (idx, entry) in entries.iter().enumerate() {
        let title = sanitize(&entry.title);
        let body = sanitize(&entry.body);
        let first_page = layouter.begin_page();

        let kind = if idx == 0 {
            layouter.write_block(&title, &TITLE_HEADING);
            layouter.gap(TITLE_GAP_MM);
            layouter.write_block(&body, &TITLE_BODY);
            SectionKind::TitlePage
        } else {
            layouter.write_block(&title, &CHAPTER_HEADING);
            layouter.write_block(&body, &CHAPTER_BODY);
            SectionKind::Chapter
        };

        sections.push(Section {
            kind,
            title,
            first_page,
            page_count: layouter.pages.len() - first_page,
        });
    }

    DocumentPlan {
        geometry,
        pages: layouter.pages,
        sections,
    }
}

struct Layouter {
    geometry: PageGeometry,
    pages: Vec<PageFrame>,
    cursor_mm: f32,
}

impl Layouter {
    fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            pages: Vec::new(),
            cursor_mm: geometry.margin_top_mm,
        }
    }

    /// Starts a fresh page and returns its index.
    fn begin_page(&mut self) -> usize {
        self.pages.push(PageFrame::default());
        self.cursor_mm = self.geometry.margin_top_mm;
        self.pages.len() - 1
    }

    fn gap(&mut self, mm: f32) {
        self.cursor_mm += mm;
    }

    fn write_block(&mut self, text: &str, style: &TextStyle) {
        let width = self.geometry.content_width_mm();
        for paragraph in text.split('\n') {
            for line in wrap_paragraph(paragraph, style, width) {
                self.place(line, style);
            }
        }
    }

    fn place(&mut self, text: String, style: &TextStyle) {
        let at_top = self.cursor_mm <= self.geometry.margin_top_mm;
        if !at_top && self.cursor_mm + style.line_height_mm > self.geometry.break_at_mm() {
            self.begin_page();
        }

        let top = self.cursor_mm;
        self.cursor_mm += style.line_height_mm;
        if text.is_empty() {
            return;
        }

        let x_mm = match style.align {
            Align::Left => self.geometry.margin_left_mm,
            Align::Center => {
                let free = self.geometry.content_width_mm()
                    - text_width_mm(&text, style.weight, style.size_pt);
                self.geometry.margin_left_mm + (free / 2.0).max(0.0)
            }
        };
        // Vertically centred in the line box.
        let baseline_mm = top + style.line_height_mm / 2.0 + pt_to_mm(style.size_pt) * 0.3;

        if let Some(page) = self.pages.last_mut() {
            page.lines.push(PlacedLine {
                text,
                weight: style.weight,
                size_pt: style.size_pt,
                x_mm,
                baseline_mm,
            });
        }
    }
}

/// Greedy word wrap. Words wider than the line are split by character.
/// An empty paragraph yields one empty line so blank lines keep their height.
fn wrap_paragraph(paragraph: &str, style: &TextStyle, width_mm: f32) -> Vec<String> {
    let fits = |candidate: &str| text_width_mm(candidate, style.weight, style.size_pt) <= width_mm;
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in paragraph.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if fits(&candidate) {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if fits(word) {
            current = word.to_string();
            continue;
        }
        for c in word.chars() {
            current.push(c);
            if !fits(&current) && current.chars().count() > 1 {
                current.pop();
                lines.push(std::mem::take(&mut current));
                current.push(c);
            }
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}
