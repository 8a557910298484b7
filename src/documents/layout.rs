//! Page geometry, positioned draw operations and the cursor-driven writer the
//! composers lay documents out with.
//!
//! Coordinates are millimetres measured from the top-left corner of the page;
//! the render engine flips them for PDF.

use super::common::{printable_text, text_width, wrap_text};

/// Fixed page format shared by every document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl PageGeometry {
    pub const A4: PageGeometry = PageGeometry {
        width: 210.0,
        height: 297.0,
        margin: 20.0,
    };

    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    /// Lowest y any content may reach.
    pub fn bottom_limit(&self) -> f32 {
        self.height - self.margin
    }
}

/// True when a block of `needed` millimetres starting at `cursor_y` would cross
/// the bottom margin.
pub fn needs_page_break(cursor_y: f32, needed: f32, geometry: &PageGeometry) -> bool {
    cursor_y + needed > geometry.bottom_limit()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

impl FontWeight {
    pub fn is_bold(&self) -> bool {
        matches!(self, FontWeight::Bold)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        baseline: f32,
        size: f32,
        weight: FontWeight,
        text: String,
    },
    Rule {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        thickness: f32,
    },
    Frame {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        thickness: f32,
    },
    Logo {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

impl DrawOp {
    /// Lowest y this operation touches.
    pub fn bottom(&self) -> f32 {
        match self {
            DrawOp::Text { baseline, .. } => *baseline,
            DrawOp::Rule { y1, y2, .. } => y1.max(*y2),
            DrawOp::Frame { y, height, .. } | DrawOp::Logo { y, height, .. } => y + height,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub ops: Vec<DrawOp>,
}

impl PageLayout {
    pub fn lowest_point(&self) -> f32 {
        self.ops.iter().map(DrawOp::bottom).fold(0.0, f32::max)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentLayout {
    pub title: String,
    pub geometry: PageGeometry,
    pub pages: Vec<PageLayout>,
}

impl DocumentLayout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Text runs in drawing order, one per line.
    pub fn text_lines(&self) -> Vec<&str> {
        self.pages
            .iter()
            .flat_map(|p| p.ops.iter())
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn has_logo(&self) -> bool {
        self.pages
            .iter()
            .flat_map(|p| p.ops.iter())
            .any(|op| matches!(op, DrawOp::Logo { .. }))
    }
}

/// Where text sits inside its line slot, as a fraction of the line height.
const BASELINE_RATIO: f32 = 0.75;

/// Cursor over a growing list of pages.
///
/// With pagination on, every line and block first checks the remaining space
/// and moves to a fresh page when it would cross the bottom margin. With it
/// off, content is laid out on the current page no matter how far it runs.
pub struct LayoutWriter {
    geometry: PageGeometry,
    paginate: bool,
    pages: Vec<PageLayout>,
    y: f32,
}

impl LayoutWriter {
    pub fn new(geometry: PageGeometry, paginate: bool) -> Self {
        Self {
            geometry,
            paginate,
            pages: vec![PageLayout::default()],
            y: geometry.margin,
        }
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn set_y(&mut self, y: f32) {
        self.y = y;
    }

    pub fn advance(&mut self, dy: f32) {
        self.y += dy;
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn new_page(&mut self) {
        self.pages.push(PageLayout::default());
        self.y = self.geometry.margin;
    }

    /// Break the page if `needed` millimetres do not fit. Returns whether a
    /// new page was started.
    pub fn ensure_space(&mut self, needed: f32) -> bool {
        if self.paginate && needs_page_break(self.y, needed, &self.geometry) {
            self.new_page();
            true
        } else {
            false
        }
    }

    pub fn push(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    fn push_text(&mut self, x: f32, size: f32, weight: FontWeight, line_height: f32, text: &str) {
        let baseline = self.y + line_height * BASELINE_RATIO;
        self.push(DrawOp::Text {
            x,
            baseline,
            size,
            weight,
            text: printable_text(text).into_owned(),
        });
    }

    /// One line of text at the left margin.
    pub fn line(&mut self, text: &str, size: f32, weight: FontWeight, line_height: f32) {
        self.ensure_space(line_height);
        let x = self.geometry.margin;
        self.push_text(x, size, weight, line_height, text);
        self.y += line_height;
    }

    pub fn centered_line(&mut self, text: &str, size: f32, weight: FontWeight, line_height: f32) {
        self.ensure_space(line_height);
        let width = text_width(text, size, weight.is_bold());
        let x = ((self.geometry.width - width) / 2.0).max(self.geometry.margin);
        self.push_text(x, size, weight, line_height, text);
        self.y += line_height;
    }

    /// Pre-wrapped lines, each checked against the bottom margin on its own.
    pub fn lines(&mut self, lines: &[String], size: f32, weight: FontWeight, line_height: f32) {
        for line in lines {
            self.line(line, size, weight, line_height);
        }
    }

    /// Wrap `text` to the content width and write it line by line.
    pub fn paragraph(&mut self, text: &str, size: f32, weight: FontWeight, line_height: f32) {
        let lines = wrap_text(
            text,
            size,
            self.geometry.content_width(),
            weight.is_bold(),
        );
        self.lines(&lines, size, weight, line_height);
    }

    /// Bold label followed by its value; long values wrap under the value column.
    pub fn labeled_line(
        &mut self,
        label: &str,
        value: &str,
        label_width: f32,
        size: f32,
        line_height: f32,
    ) {
        self.labeled_line_bounded(label, value, label_width, size, line_height, usize::MAX);
    }

    /// Like [`labeled_line`](Self::labeled_line), but the value takes at most
    /// `max_lines` lines; a cut value ends in an ellipsis.
    pub fn labeled_line_bounded(
        &mut self,
        label: &str,
        value: &str,
        label_width: f32,
        size: f32,
        line_height: f32,
        max_lines: usize,
    ) {
        let value_x = self.geometry.margin + label_width;
        let value_width = self.geometry.content_width() - label_width;
        let mut value_lines = wrap_text(value, size, value_width, false);
        if value_lines.is_empty() {
            value_lines.push(String::new());
        }
        if value_lines.len() > max_lines.max(1) {
            log::debug!(
                "Value for '{}' cut from {} to {} lines",
                label,
                value_lines.len(),
                max_lines.max(1)
            );
            value_lines.truncate(max_lines.max(1));
            if let Some(last) = value_lines.last_mut() {
                *last = with_ellipsis(last, size, value_width);
            }
        }

        for (i, value_line) in value_lines.iter().enumerate() {
            self.ensure_space(line_height);
            if i == 0 {
                let label_x = self.geometry.margin;
                self.push_text(label_x, size, FontWeight::Bold, line_height, label);
            }
            self.push_text(value_x, size, FontWeight::Regular, line_height, value_line);
            self.y += line_height;
        }
    }

    /// Horizontal rule across the content width, centred in a `gap` high slot.
    pub fn rule(&mut self, gap: f32, thickness: f32) {
        self.ensure_space(gap);
        let y = self.y + gap / 2.0;
        self.push(DrawOp::Rule {
            x1: self.geometry.margin,
            y1: y,
            x2: self.geometry.width - self.geometry.margin,
            y2: y,
            thickness,
        });
        self.y += gap;
    }

    pub fn finish(self, title: impl Into<String>) -> DocumentLayout {
        DocumentLayout {
            title: title.into(),
            geometry: self.geometry,
            pages: self.pages,
        }
    }
}

const ELLIPSIS: &str = "...";

/// `line` shortened from the end until it and a trailing ellipsis fit `max_width`.
fn with_ellipsis(line: &str, size: f32, max_width: f32) -> String {
    let mut kept: String = line.trim_end().to_string();
    while !kept.is_empty() && text_width(&format!("{}{}", kept, ELLIPSIS), size, false) > max_width {
        kept.pop();
    }
    format!("{}{}", kept.trim_end(), ELLIPSIS)
}
