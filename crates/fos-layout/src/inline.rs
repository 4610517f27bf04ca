//! Inline Layout
//!
//! Inline formatting context (IFC): inline boxes and text flow horizontally
//! and wrap to new lines. Fragments are top-aligned within their line.

/// Line box - a horizontal line containing inline fragments
#[derive(Debug, Clone, PartialEq)]
pub struct LineBox {
    /// X position of line start
    pub x: f64,
    /// Y position of line
    pub y: f64,
    /// Width of the line
    pub width: f64,
    /// Height of the line (max height of all fragments)
    pub height: f64,
    /// Fragments on this line
    pub fragments: Vec<InlineFragment>,
}

/// A fragment of inline content on a line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InlineFragment {
    /// Position on the line
    pub x: f64,
    pub width: f64,
    pub height: f64,
    /// Is this a text fragment?
    pub is_text: bool,
}

/// Inline formatting context
#[derive(Debug, Clone)]
pub struct InlineFormattingContext {
    /// Available width for the line
    container_width: f64,
    /// Starting X position
    start_x: f64,
    /// Current Y position
    cursor_y: f64,
    /// Current X position within line
    cursor_x: f64,
    /// Current line being built
    current_line: LineBox,
    /// Completed lines
    lines: Vec<LineBox>,
    /// Start a new line when content does not fit
    wrap: bool,
}

impl InlineFormattingContext {
    /// Create a new inline formatting context
    pub fn new(container_width: f64, start_x: f64, start_y: f64) -> Self {
        Self {
            container_width,
            start_x,
            cursor_y: start_y,
            cursor_x: start_x,
            current_line: Self::empty_line(start_x, start_y),
            lines: Vec::new(),
            wrap: true,
        }
    }

    /// Keep everything on one line (flex rows without `flex-wrap`)
    pub fn without_wrapping(mut self) -> Self {
        self.wrap = false;
        self
    }

    fn empty_line(x: f64, y: f64) -> LineBox {
        LineBox {
            x,
            y,
            width: 0.0,
            height: 0.0,
            fragments: Vec::new(),
        }
    }

    fn remaining(&self) -> f64 {
        self.start_x + self.container_width - self.cursor_x
    }

    fn push(&mut self, width: f64, height: f64, is_text: bool) -> (f64, f64) {
        let position = (self.cursor_x, self.current_line.y);
        self.current_line.fragments.push(InlineFragment {
            x: self.cursor_x,
            width,
            height,
            is_text,
        });
        self.current_line.height = self.current_line.height.max(height);
        self.cursor_x += width;
        self.current_line.width = self.cursor_x - self.start_x;
        position
    }

    /// Place an atomic inline box (margin box size), returning its top-left corner
    pub fn add_inline_box(&mut self, width: f64, height: f64) -> (f64, f64) {
        // Check if we need to wrap to new line
        if self.wrap && width > self.remaining() && !self.current_line.fragments.is_empty() {
            self.finish_line();
        }
        self.push(width, height, false)
    }

    /// Add a text run, breaking at whitespace
    pub fn add_text(&mut self, text: &str, char_width: f64, line_height: f64) {
        let space = char_width;
        for word in text.split_whitespace() {
            let width = word.chars().count() as f64 * char_width;
            let leading = if self.current_line.fragments.is_empty() { 0.0 } else { space };
            if self.wrap && leading + width > self.remaining() && !self.current_line.fragments.is_empty() {
                self.finish_line();
                self.push(width, line_height, true);
            } else {
                self.cursor_x += leading;
                self.push(width, line_height, true);
            }
        }
    }

    /// Finish the current line and start a new one
    pub fn finish_line(&mut self) {
        self.cursor_y += self.current_line.height;
        let line = std::mem::replace(&mut self.current_line, Self::empty_line(self.start_x, self.cursor_y));
        if !line.fragments.is_empty() {
            self.lines.push(line);
        }
        self.cursor_x = self.start_x;
    }

    /// Finalize and return all lines
    pub fn finish(mut self) -> Vec<LineBox> {
        self.finish_line();
        self.lines
    }

    /// Y position below the last finished line
    pub fn cursor_y(&self) -> f64 {
        self.cursor_y
    }

    /// Is anything placed yet?
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.current_line.fragments.is_empty()
    }
}
