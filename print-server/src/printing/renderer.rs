//! Kitchen ticket renderer
//!
//! Renders an order into fixed-width text with embedded ESC/POS markers.
//! Kitchen tickets carry no prices.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use comanda_printer::{EscPosTextBuilder, cp858_width};

use super::types::{ReceiptContext, ReceiptLine};
use super::wrap::wrap;

/// Kitchen ticket renderer
pub struct KitchenTicketRenderer {
    width: usize,
    timezone: Tz,
}

impl KitchenTicketRenderer {
    /// Create a new renderer with specified paper width and timezone
    ///
    /// Common widths:
    /// - 58mm paper: 32 characters
    /// - 80mm paper: 48 characters
    pub fn new(width: usize, timezone: Tz) -> Self {
        Self { width, timezone }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Render a kitchen ticket; `progress` is the printer's running number
    pub fn render(&self, ctx: &ReceiptContext, lines: &[ReceiptLine], progress: u64) -> String {
        let mut b = EscPosTextBuilder::new(self.width);

        self.render_header(&mut b, ctx, progress);

        for line in lines {
            self.render_item(&mut b, line);
        }

        b.finalize()
    }

    fn render_header(&self, b: &mut EscPosTextBuilder, ctx: &ReceiptContext, progress: u64) {
        b.align_left();
        b.bold_on();
        let number = format!("N. {}", progress);
        let room = self.width.saturating_sub(cp858_width(&number) + 1).max(1);
        let mut rows = wrap(&format!("ORDINE: {}", ctx.display_code), room, "").into_iter();
        b.line_lr(&rows.next().unwrap_or_default(), &number);
        for row in rows {
            b.write_line(&row);
        }
        b.bold_off();

        // Double size halves the usable columns
        let large_width = (self.width / 2).max(1);
        b.size_double();
        if !ctx.table.is_empty() {
            write_wrapped(b, &format!("TAVOLO: {}", ctx.table), large_width, "");
        }
        if !ctx.customer.is_empty() {
            write_wrapped(b, &format!("CLIENTE: {}", ctx.customer), large_width, "");
        }
        b.write_line(&format!("PROGR: {}", progress));
        b.size_reset();

        if let Some(confirmed_at) = ctx.confirmed_at {
            b.write_line(&format!(
                "CONFERMATO: {}",
                format_timestamp(confirmed_at, self.timezone)
            ));
        }

        b.eq_sep();
    }

    /// `2x Spaghetti`, continuation lines aligned under the name, then notes
    fn render_item(&self, b: &mut EscPosTextBuilder, line: &ReceiptLine) {
        let prefix = format!("{}x ", line.quantity);
        let indent = " ".repeat(cp858_width(&prefix));

        write_wrapped(
            b,
            &format!("{}{}", prefix, line.food_name),
            self.width,
            &indent,
        );

        if let Some(notes) = line.notes() {
            let room = self.width.saturating_sub(indent.len()).max(1);
            for row in wrap(&format!("NOTE: {}", notes), room, "") {
                b.write_line(&format!("{}{}", indent, row));
            }
        }

        b.blank();
    }
}

impl Default for KitchenTicketRenderer {
    fn default() -> Self {
        Self::new(48, chrono_tz::Europe::Rome)
    }
}

pub(crate) fn write_wrapped(b: &mut EscPosTextBuilder, text: &str, width: usize, indent: &str) {
    for row in wrap(text, width, indent) {
        b.write_line(&row);
    }
}

/// `DD/MM/YYYY HH:MM` in the given timezone
pub(crate) fn format_timestamp(ts: DateTime<Utc>, tz: Tz) -> String {
    ts.with_timezone(&tz).format("%d/%m/%Y %H:%M").to_string()
}
