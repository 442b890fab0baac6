//! Receipt images
//!
//! Logo and footer live in a primary asset directory (per deployment), with a
//! default directory as fallback. Images are rasterized on every receipt; a
//! missing or broken image just leaves the receipt without it.

use std::path::PathBuf;

use comanda_printer::{RasterOptions, rasterize};
use tracing::debug;

pub const LOGO_FILE: &str = "logo.png";
pub const FOOTER_FILE: &str = "footer.png";

/// Pre-rasterized `GS v 0` blocks; empty when the image is unavailable
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceiptAssets {
    pub logo: Vec<u8>,
    pub footer: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct AssetStore {
    primary: PathBuf,
    fallback: PathBuf,
    paper_width_dots: u32,
}

impl AssetStore {
    pub fn new(
        primary: impl Into<PathBuf>,
        fallback: impl Into<PathBuf>,
        paper_width_dots: u32,
    ) -> Self {
        Self {
            primary: primary.into(),
            fallback: fallback.into(),
            paper_width_dots,
        }
    }

    /// First existing `name` in the primary then the fallback directory
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        [&self.primary, &self.fallback]
            .into_iter()
            .map(|dir| dir.join(name))
            .find(|p| p.is_file())
    }

    /// Rasterize logo and footer for one receipt
    ///
    /// The footer carries the ticket number drawn next to it. Blocking: image
    /// decoding runs on the caller's thread.
    pub fn load(&self, ticket_number: &str) -> ReceiptAssets {
        let logo = self.raster(LOGO_FILE, RasterOptions::new(self.paper_width_dots));

        let mut footer_options = RasterOptions::new(self.paper_width_dots);
        if !ticket_number.trim().is_empty() {
            footer_options.inline_text = Some(ticket_number.trim().to_string());
        }
        let footer = self.raster(FOOTER_FILE, footer_options);

        ReceiptAssets { logo, footer }
    }

    fn raster(&self, name: &str, options: RasterOptions) -> Vec<u8> {
        match self.resolve(name) {
            Some(path) => rasterize(&path, &options),
            None => {
                debug!(asset = name, "asset not found in any directory");
                Vec::new()
            }
        }
    }
}
