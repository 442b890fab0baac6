//! Cash receipt renderer
//!
//! Output is a list of segments rather than one string: logo and footer are
//! pre-rasterized binary blocks, and every tear-off ticket is separated from
//! the previous one by a feed-and-cut.

use chrono_tz::Tz;
use comanda_printer::{EscPosTextBuilder, FEED_AND_CUT, PrintSegment, cp858_width, pad_cp858};
use rust_decimal::Decimal;

use super::assets::ReceiptAssets;
use super::money::{ReceiptTotals, format_currency};
use super::renderer::{format_timestamp, write_wrapped};
use super::types::{PricedReceiptLine, ReceiptContext, ReceiptLine};
use super::wrap::wrap;

pub struct CashReceiptRenderer {
    width: usize,
    timezone: Tz,
}

impl CashReceiptRenderer {
    pub fn new(width: usize, timezone: Tz) -> Self {
        Self { width, timezone }
    }

    /// Render the full receipt: `[logo] body [footer] (cut, ticket)*`
    pub fn render(
        &self,
        ctx: &ReceiptContext,
        lines: &[PricedReceiptLine],
        assets: &ReceiptAssets,
    ) -> Vec<PrintSegment> {
        let mut segments = Vec::with_capacity(3 + ctx.single_tickets.len() * 2);

        if !assets.logo.is_empty() {
            segments.push(PrintSegment::raw(assets.logo.clone()));
        }

        segments.push(PrintSegment::Text(self.render_body(ctx, lines)));

        if !assets.footer.is_empty() {
            segments.push(PrintSegment::raw(assets.footer.clone()));
        }

        for ticket in &ctx.single_tickets {
            segments.push(PrintSegment::raw(FEED_AND_CUT.to_vec()));
            segments.push(PrintSegment::Text(self.render_single_ticket(ctx, ticket)));
        }

        segments
    }

    fn render_body(&self, ctx: &ReceiptContext, lines: &[PricedReceiptLine]) -> String {
        let mut b = EscPosTextBuilder::new(self.width);

        self.render_header(&mut b, ctx);

        for line in lines {
            self.render_item(&mut b, line);
        }

        let totals = ReceiptTotals::compute(lines, ctx.discount);
        self.render_totals(&mut b, &totals);

        b.finalize()
    }

    fn render_header(&self, b: &mut EscPosTextBuilder, ctx: &ReceiptContext) {
        b.align_center();
        b.bold_on();
        b.size_double();
        b.write_line(&format!("N. {}", ticket_label(ctx)));
        b.size_reset();
        b.bold_off();
        b.align_left();

        b.write_line(&format!("CODICE: {}", ctx.display_code));
        if !ctx.table.is_empty() {
            b.write_line(&format!("TAVOLO: {}", ctx.table));
        }
        if !ctx.customer.is_empty() {
            write_wrapped(b, &format!("CLIENTE: {}", ctx.customer), self.width, "");
        }
        b.write_line(&format!("PAGAMENTO: {}", ctx.payment_method.label()));
        if let Some(confirmed_at) = ctx.confirmed_at {
            b.write_line(&format!(
                "DATA: {}",
                format_timestamp(confirmed_at, self.timezone)
            ));
        }

        b.eq_sep();
    }

    /// Name on the left (wrapped), base price in the right column
    fn render_item(&self, b: &mut EscPosTextBuilder, line: &PricedReceiptLine) {
        let price = format_currency(line.base_total());
        let prefix = format!("{}x ", line.line.quantity);
        let indent = " ".repeat(cp858_width(&prefix));
        let name_width = self.left_width(&price);

        let rows = wrap(
            &format!("{}{}", prefix, line.line.food_name),
            name_width,
            &indent,
        );
        let mut rows = rows.iter();
        let first = rows.next().map(String::as_str).unwrap_or("");
        self.price_row(b, first, &price);
        for row in rows {
            b.write_line(row);
        }

        if line.surcharge > Decimal::ZERO {
            let extra = format_currency(line.surcharge_total());
            self.price_row(b, &format!("{}EXTRA", indent), &extra);
        }
    }

    fn render_totals(&self, b: &mut EscPosTextBuilder, totals: &ReceiptTotals) {
        b.dash_sep();
        self.price_row(b, "SUBTOTALE", &format_currency(totals.subtotal));
        if totals.surcharge > Decimal::ZERO {
            self.price_row(b, "EXTRA TOTALI", &format_currency(totals.surcharge));
        }
        if totals.discount > Decimal::ZERO {
            self.price_row(
                b,
                "SCONTO",
                &format!("-{}", format_currency(totals.discount)),
            );
        }
        b.eq_sep();

        b.bold_on();
        self.price_row(b, "TOTALE", &format_currency(totals.total));
        b.bold_off();
    }

    fn render_single_ticket(&self, ctx: &ReceiptContext, ticket: &ReceiptLine) -> String {
        let mut b = EscPosTextBuilder::new(self.width);
        let large_width = (self.width / 2).max(1);

        b.align_center();
        b.size_double();
        b.bold_on();
        b.write_line(&format!("N. {}", ticket_label(ctx)));
        b.bold_off();
        if !ctx.table.is_empty() {
            b.write_line(&format!("TAVOLO: {}", ctx.table));
        }
        write_wrapped(
            &mut b,
            &format!("{}x {}", ticket.quantity, ticket.food_name),
            large_width,
            "",
        );
        b.size_reset();
        b.align_left();

        b.finalize()
    }

    /// Columns left for text when `price` takes the right edge plus one space
    fn left_width(&self, price: &str) -> usize {
        self.width
            .saturating_sub(cp858_width(price) + 1)
            .max(1)
    }

    /// `left` padded so that `left + " " + right` spans the full width
    fn price_row(&self, b: &mut EscPosTextBuilder, left: &str, right: &str) {
        let left_width = self.left_width(right);
        b.write_line(&format!("{} {}", pad_cp858(left, left_width, false), right));
    }
}

impl Default for CashReceiptRenderer {
    fn default() -> Self {
        Self::new(48, chrono_tz::Europe::Rome)
    }
}

/// Ticket number, or the order code when no number was assigned
fn ticket_label(ctx: &ReceiptContext) -> &str {
    if ctx.ticket_number.is_empty() {
        &ctx.display_code
    } else {
        &ctx.ticket_number
    }
}
