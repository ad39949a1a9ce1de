//! Time source for frame pacing

/// Monotonic clock with a suspending wait
#[allow(async_fn_in_trait)]
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin
    fn now_ms(&self) -> u64;

    /// Suspend the caller for `ms` milliseconds
    async fn wait_ms(&mut self, ms: u32);
}
