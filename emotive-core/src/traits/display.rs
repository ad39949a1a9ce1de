//! Display sink trait

/// Destination for fully reconstructed frames
///
/// `push` must consume the buffer before returning: the caller mutates the
/// same buffer for the next frame as soon as the future completes.
#[allow(async_fn_in_trait)]
pub trait DisplaySink {
    /// Transport or hardware error
    type Error;

    /// Transmit a packed 1bpp bitmap (row-major, LSB leftmost) of the given
    /// dimensions to the panel
    async fn push(&mut self, buffer: &[u8], width: u16, height: u16) -> Result<(), Self::Error>;
}

impl<T: DisplaySink> DisplaySink for &mut T {
    type Error = T::Error;

    async fn push(&mut self, buffer: &[u8], width: u16, height: u16) -> Result<(), Self::Error> {
        (**self).push(buffer, width, height).await
    }
}
