//! Bitmap layout conversion
//!
//! Frames are stored row-major with the leftmost pixel in bit 0 of each
//! byte. SSD1306 graphics RAM is organised in pages: one byte covers a
//! column of eight rows, with the top row in bit 0.
//!
//! ```text
//! frame byte (row y, x = 8k..8k+7)      page byte (column x, rows 8p..8p+7)
//!   bit 0 -> x = 8k                       bit 0 -> y = 8p
//!   bit 7 -> x = 8k + 7                   bit 7 -> y = 8p + 7
//! ```

/// Convert one 8-row page of a row-major frame into column bytes
///
/// `out` receives `width` bytes. Rows past `height` read as dark.
pub fn page_from_rows(frame: &[u8], width: usize, height: usize, page: usize, out: &mut [u8]) {
    let row_bytes = width / 8;

    for (x, column) in out.iter_mut().take(width).enumerate() {
        let mut byte = 0u8;
        for bit in 0..8 {
            let y = page * 8 + bit;
            if y >= height {
                break;
            }
            let src = frame.get(y * row_bytes + x / 8).copied().unwrap_or(0);
            if src & (1 << (x % 8)) != 0 {
                byte |= 1 << bit;
            }
        }
        *column = byte;
    }
}
