//! CP858 encoding utilities for European thermal printers
//!
//! CP858 is CP850 with the Euro sign at 0xD5. Every character occupies one
//! byte and one print cell, so widths are plain character counts.
//! This module provides utilities for:
//! - Calculating printable widths
//! - Truncating/padding strings to a width
//! - Converting UTF-8 to CP858 while preserving ESC/POS commands

use tracing::instrument;

/// Byte written for characters CP858 cannot represent
pub const REPLACEMENT: u8 = b'?';

/// Upper half of CP858 (0x80..=0xFF)
const CP858_HIGH: [char; 128] = [
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å', // 0x80
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', 'ø', '£', 'Ø', '×', 'ƒ', // 0x90
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '®', '¬', '½', '¼', '¡', '«', '»', // 0xA0
    '░', '▒', '▓', '│', '┤', 'Á', 'Â', 'À', '©', '╣', '║', '╗', '╝', '¢', '¥', '┐', // 0xB0
    '└', '┴', '┬', '├', '─', '┼', 'ã', 'Ã', '╚', '╔', '╩', '╦', '╠', '═', '╬', '¤', // 0xC0
    'ð', 'Ð', 'Ê', 'Ë', 'È', '€', 'Í', 'Î', 'Ï', '┘', '┌', '█', '▄', '¦', 'Ì', '▀', // 0xD0
    'Ó', 'ß', 'Ô', 'Ò', 'õ', 'Õ', 'µ', 'þ', 'Þ', 'Ú', 'Û', 'Ù', 'ý', 'Ý', '¯', '´', // 0xE0
    '\u{AD}', '±', '‗', '¾', '¶', '§', '÷', '¸', '°', '¨', '·', '¹', '³', '²', '■', '\u{A0}', // 0xF0
];

/// Encode a single character to its CP858 byte
///
/// Returns `None` when the code page has no glyph for it.
pub fn encode_char(c: char) -> Option<u8> {
    if c.is_ascii() {
        return Some(c as u8);
    }
    CP858_HIGH
        .iter()
        .position(|&m| m == c)
        .map(|idx| 0x80 + idx as u8)
}

/// Get the printable width of a string (one cell per character)
pub fn cp858_width(s: &str) -> usize {
    s.chars().count()
}

/// Truncate a string to fit within a width
pub fn truncate_cp858(s: &str, max_width: usize) -> String {
    s.chars().take(max_width).collect()
}

/// Pad a string to a specific width
///
/// If the string is longer than the width, it will be truncated.
pub fn pad_cp858(s: &str, width: usize, align_right: bool) -> String {
    let current_width = cp858_width(s);
    if current_width >= width {
        return truncate_cp858(s, width);
    }
    let spaces = width - current_width;
    if align_right {
        format!("{}{}", " ".repeat(spaces), s)
    } else {
        format!("{}{}", s, " ".repeat(spaces))
    }
}

/// Convert text (with embedded ESC/POS commands) to CP858
///
/// ASCII characters, including the control bytes of ESC/POS commands, are
/// written exactly as is. Other characters are looked up in the code page;
/// anything without a glyph becomes [`REPLACEMENT`].
#[instrument(skip(text), fields(len = text.len()))]
pub fn convert_to_cp858(text: &str) -> Vec<u8> {
    let mut result = Vec::with_capacity(text.len());
    let mut replaced = 0usize;

    for c in text.chars() {
        match encode_char(c) {
            Some(b) => result.push(b),
            None => {
                replaced += 1;
                result.push(REPLACEMENT);
            }
        }
    }

    if replaced > 0 {
        tracing::debug!(replaced, "characters outside CP858 replaced");
    }

    result
}
