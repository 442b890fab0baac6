//! Greedy word wrap for fixed-width receipts
//!
//! Wrap points must be deterministic: the same text always breaks at the same
//! columns, so reprints look identical.

use comanda_printer::cp858_width;

/// Split `s` after `width` characters
fn split_at_width(s: &str, width: usize) -> (&str, &str) {
    match s.char_indices().nth(width) {
        Some((idx, _)) => s.split_at(idx),
        None => (s, ""),
    }
}

/// Wrap `text` into lines of at most `max_width` cells
///
/// Words are packed greedily. Continuation lines start with `indent`. A word
/// that cannot fit on a fresh continuation line is hard-split: the first piece
/// fills the room left on the current line (`max_width - current_width`), and
/// splitting repeats on following lines until the remainder fits.
///
/// An indent at least as wide as the line is ignored.
pub fn wrap(text: &str, max_width: usize, indent: &str) -> Vec<String> {
    let max_width = max_width.max(1);
    let indent = if cp858_width(indent) >= max_width {
        ""
    } else {
        indent
    };
    let indent_width = cp858_width(indent);

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;
    // Only the indent (or nothing) on the current line so far
    let mut at_line_start = true;

    for word in text.split_whitespace() {
        let mut rest = word;
        loop {
            let sep = usize::from(!at_line_start);
            let rest_width = cp858_width(rest);

            if current_width + sep + rest_width <= max_width {
                if sep == 1 {
                    current.push(' ');
                }
                current.push_str(rest);
                current_width += sep + rest_width;
                at_line_start = false;
                break;
            }

            if !at_line_start && indent_width + rest_width <= max_width {
                lines.push(std::mem::replace(&mut current, indent.to_string()));
                current_width = indent_width;
                at_line_start = true;
                continue;
            }

            let room = max_width.saturating_sub(current_width + sep);
            if room == 0 {
                lines.push(std::mem::replace(&mut current, indent.to_string()));
                current_width = indent_width;
                at_line_start = true;
                continue;
            }

            let (head, tail) = split_at_width(rest, room);
            if sep == 1 {
                current.push(' ');
            }
            current.push_str(head);
            lines.push(std::mem::replace(&mut current, indent.to_string()));
            current_width = indent_width;
            at_line_start = true;
            rest = tail;
        }
    }

    if !at_line_start {
        lines.push(current);
    }
    lines
}
