//! Print segments and the payload encoder
//!
//! A receipt travels as an ordered list of segments: text produced by the
//! layout code (ESC/POS markers embedded) and opaque binary blocks such as
//! raster images. [`encode_segments`] turns the list into the bytes that go on
//! the wire.

use crate::escpos::EscPosBuilder;

/// One piece of a print payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrintSegment {
    /// Text with embedded control markers, transcoded to CP858 on encode
    Text(String),
    /// Bytes written to the printer untouched
    RawBytes(Vec<u8>),
}

impl PrintSegment {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn raw(bytes: impl Into<Vec<u8>>) -> Self {
        Self::RawBytes(bytes.into())
    }
}

impl From<String> for PrintSegment {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for PrintSegment {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Encode segments into one payload
///
/// Layout: `ESC @`, `ESC t 19` (PC858), each segment in order, then the
/// feed-and-cut trailer. Characters without a CP858 glyph are replaced, so
/// encoding never fails.
pub fn encode_segments(segments: &[PrintSegment]) -> Vec<u8> {
    let mut b = EscPosBuilder::default();
    b.code_page_cp858();

    for segment in segments {
        match segment {
            PrintSegment::Text(s) => b.text(s),
            PrintSegment::RawBytes(bytes) => b.raw(bytes),
        };
    }

    b.feed_and_cut();
    b.build()
}
