//! # comanda-printer
//!
//! ESC/POS thermal printer library - low-level printing capabilities only.
//!
//! ## Scope
//!
//! This crate handles HOW to print:
//! - ESC/POS command building
//! - CP858 encoding (Euro sign, Western European accents)
//! - Print segments and payload encoding
//! - Network printing (TCP port 9100) and paper status queries
//! - Image/logo rasterization
//!
//! Business logic (WHAT to print) stays in application code:
//! - Kitchen and cash receipt layout → print-server
//!
//! ## Example
//!
//! ```ignore
//! use comanda_printer::{encode_segments, EscPosTextBuilder, NetworkPrinter, PrintSegment, Printer};
//!
//! let mut b = EscPosTextBuilder::new(48);
//! b.align_center();
//! b.size_double();
//! b.write_line("CUCINA");
//! b.size_reset();
//! b.eq_sep();
//! b.align_left();
//! b.write_line("2x Spaghetti alla carbonara");
//!
//! let payload = encode_segments(&[PrintSegment::Text(b.finalize())]);
//!
//! let printer = NetworkPrinter::new("192.168.1.100", 9100)?;
//! if printer.status().await?.can_print() {
//!     printer.print(&payload).await?;
//! }
//! ```

mod encoding;
mod error;
mod escpos;
mod printer;
mod segment;

#[cfg(feature = "image")]
pub mod raster;

// Re-exports
pub use encoding::{convert_to_cp858, cp858_width, encode_char, pad_cp858, truncate_cp858};
pub use error::{PrintError, PrintResult};
pub use escpos::{
    EscPosBuilder, EscPosTextBuilder, FEED_AND_CUT, INIT, PAPER_STATUS_QUERY, SELECT_CP858,
    strip_commands,
};
pub use printer::{NetworkPrinter, Printer, PrinterStatus, STATUS_TIMEOUT};
pub use segment::{PrintSegment, encode_segments};

#[cfg(feature = "image")]
pub use raster::{RasterOptions, rasterize};
