//! ESC/POS command builder
//!
//! Provides a fluent API for building ESC/POS print data.

use crate::encoding::{convert_to_cp858, cp858_width};

/// ESC @ - Initialize printer
pub const INIT: [u8; 2] = [0x1B, 0x40];

/// ESC t n - Select character code table (19 = PC858 Euro)
pub const SELECT_CP858: [u8; 3] = [0x1B, 0x74, 19];

/// ESC d 5, GS V 0 - Feed five lines, then full cut
pub const FEED_AND_CUT: [u8; 6] = [0x1B, 0x64, 0x05, 0x1D, 0x56, 0x00];

/// DLE EOT 4 - Transmit paper roll sensor status
pub const PAPER_STATUS_QUERY: [u8; 3] = [0x10, 0x04, 0x04];

/// ESC/POS byte builder
///
/// Builds the wire payload for thermal printers. Text is encoded to CP858 as
/// it is written, so raw binary blocks (raster images) can be mixed in
/// without being touched.
pub struct EscPosBuilder {
    buf: Vec<u8>,
}

impl EscPosBuilder {
    /// Create a builder whose buffer starts with `ESC @`
    pub fn new() -> Self {
        let mut buf = Vec::with_capacity(4096);
        buf.extend_from_slice(&INIT);
        Self { buf }
    }

    /// Write text (CP858 encoded, control bytes kept)
    pub fn text(&mut self, s: &str) -> &mut Self {
        self.buf.extend_from_slice(&convert_to_cp858(s));
        self
    }

    /// Select the PC858 (Euro) character table
    pub fn code_page_cp858(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&SELECT_CP858);
        self
    }

    /// Feed five lines and cut, the trailer of every payload
    pub fn feed_and_cut(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&FEED_AND_CUT);
        self
    }

    /// Write raw bytes directly
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Build the final byte buffer
    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}

impl Default for EscPosBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// String-based ESC/POS Builder (for receipt rendering)
// ============================================================================

/// String-based ESC/POS command builder
///
/// Accumulates a UTF-8 `String` with ESC/POS commands embedded as control
/// characters. The string is turned into bytes later by the segment encoder,
/// which keeps the commands and transcodes the text to CP858.
pub struct EscPosTextBuilder {
    buf: String,
    width: usize,
}

impl EscPosTextBuilder {
    /// Create a new text builder with specified paper width in characters
    pub fn new(width: usize) -> Self {
        Self {
            buf: String::new(),
            width,
        }
    }

    /// Get the configured paper width
    pub fn width(&self) -> usize {
        self.width
    }

    // === Text Output ===

    /// Write raw text
    pub fn write(&mut self, s: &str) -> &mut Self {
        self.buf.push_str(s);
        self
    }

    /// Write text followed by newline
    pub fn write_line(&mut self, s: &str) -> &mut Self {
        self.buf.push_str(s);
        self.buf.push('\n');
        self
    }

    /// Write an empty line
    pub fn blank(&mut self) -> &mut Self {
        self.buf.push('\n');
        self
    }

    // === Alignment ===

    /// Align text to center
    pub fn align_center(&mut self) -> &mut Self {
        self.buf.push_str("\x1B\x61\x01");
        self
    }

    /// Align text to left (default)
    pub fn align_left(&mut self) -> &mut Self {
        self.buf.push_str("\x1B\x61\x00");
        self
    }

    // === Text Style ===

    /// Enable bold text
    pub fn bold_on(&mut self) -> &mut Self {
        self.buf.push_str("\x1B\x45\x01");
        self
    }

    /// Disable bold text
    pub fn bold_off(&mut self) -> &mut Self {
        self.buf.push_str("\x1B\x45\x00");
        self
    }

    /// Double width and height
    pub fn size_double(&mut self) -> &mut Self {
        self.buf.push_str("\x1D\x21\x11");
        self
    }

    /// Reset to normal size
    pub fn size_reset(&mut self) -> &mut Self {
        self.buf.push_str("\x1D\x21\x00");
        self
    }

    // === Separators ===

    /// Print a line of '=' characters
    pub fn eq_sep(&mut self) -> &mut Self {
        self.write_line(&"=".repeat(self.width))
    }

    /// Print a line of '-' characters
    pub fn dash_sep(&mut self) -> &mut Self {
        self.write_line(&"-".repeat(self.width))
    }

    // === Layout Helpers ===

    /// Print left and right text on the same line
    pub fn line_lr(&mut self, left: &str, right: &str) -> &mut Self {
        let lw = cp858_width(left);
        let rw = cp858_width(right);

        if lw + rw >= self.width {
            self.write_line(&format!("{} {}", left, right));
        } else {
            let spaces = self.width - lw - rw;
            self.write(left);
            self.write(&" ".repeat(spaces));
            self.write_line(right);
        }
        self
    }

    // === Build ===

    /// Finalize and return the accumulated string
    pub fn finalize(self) -> String {
        self.buf
    }

    /// Get the current buffer as a string reference
    pub fn as_str(&self) -> &str {
        &self.buf
    }
}

impl Default for EscPosTextBuilder {
    fn default() -> Self {
        Self::new(48)
    }
}

/// Strip ESC/POS control sequences, leaving what a person would read
///
/// Used when a receipt has no printer and is echoed to the console.
pub fn strip_commands(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        match c {
            // ESC x n / GS x n: every marker the text builder emits is 3 chars
            '\x1B' | '\x1D' => {
                chars.next();
                chars.next();
            }
            '\n' => out.push('\n'),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}
