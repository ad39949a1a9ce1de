//! Playback driver
//!
//! Owns the working framebuffer and the display sink. One call to
//! [`PlaybackDriver::play`] runs one animation to completion, abort, or
//! failure:
//!
//! ```text
//! Idle ──play──▶ Loading ──▶ Playing(1) ──▶ … ──▶ Playing(n-1) ──▶ Done
//!                  │ copy base   │ apply deltas
//!                  └─ push, wait ┴─ push, wait
//! ```
//!
//! The frame is always pushed before its delay starts. The abort signal is
//! checked between frames only, never while deltas are being applied.

use crate::frame::{Frame, FrameBuffer, FrameError, FrameStore};
use crate::traits::{AbortSignal, Clock, DisplaySink};

use super::machine::{PlaybackEvent, PlaybackOutcome, PlaybackState};

/// Frame delay used when neither the store nor the config provides one
pub const DEFAULT_FRAME_DELAY_MS: u16 = 100;

/// Playback failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlaybackError<E> {
    /// Frame data could not be reconstructed (bad index or size)
    Frame(FrameError),
    /// Display sink failed to transmit a frame; playback stopped there
    DisplayTransport(E),
}

impl<E> From<FrameError> for PlaybackError<E> {
    fn from(e: FrameError) -> Self {
        PlaybackError::Frame(e)
    }
}

/// Summary of a finished playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlaybackReport {
    /// Frames handed to the display sink
    pub frames_pushed: u16,
    /// Completed or Aborted (failures are returned as errors)
    pub outcome: PlaybackOutcome,
    /// Wall time from start to finish
    pub elapsed_ms: u64,
}

/// Plays frame stores through one working framebuffer of `N` bytes
pub struct PlaybackDriver<S, C, const N: usize> {
    sink: S,
    clock: C,
    buffer: FrameBuffer<N>,
    state: PlaybackState,
    default_delay_ms: u16,
}

impl<S, C, const N: usize> PlaybackDriver<S, C, N>
where
    S: DisplaySink,
    C: Clock,
{
    /// Create a driver that owns `sink` and a cleared framebuffer
    pub fn new(sink: S, clock: C) -> Self {
        Self {
            sink,
            clock,
            buffer: FrameBuffer::new(),
            state: PlaybackState::Idle,
            default_delay_ms: DEFAULT_FRAME_DELAY_MS,
        }
    }

    /// Set the delay used for stores without their own timing
    pub fn set_default_delay(&mut self, delay_ms: u16) {
        self.default_delay_ms = delay_ms;
    }

    /// Current default frame delay
    pub fn default_delay(&self) -> u16 {
        self.default_delay_ms
    }

    /// Current state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Contents of the working framebuffer (last reconstructed frame)
    pub fn frame(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// Access the display sink, e.g. to reinitialise it after a failure
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Access the clock
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Play `store` from frame 0 to its last frame
    ///
    /// Returns a report for completed and aborted sessions. Sink errors
    /// end the session immediately and are returned once; the driver never
    /// retries a frame.
    pub async fn play<A>(
        &mut self,
        store: &FrameStore<'_>,
        abort: &A,
    ) -> Result<PlaybackReport, PlaybackError<S::Error>>
    where
        A: AbortSignal + ?Sized,
    {
        if store.byte_len() != N {
            return Err(PlaybackError::Frame(FrameError::DimensionMismatch {
                expected: N,
                actual: store.byte_len(),
            }));
        }

        let (width, height) = store.dimensions();
        let frame_count = store.frame_count() as u16;
        let started = self.clock.now_ms();
        let mut frames_pushed = 0u16;

        self.state = self.state.transition(PlaybackEvent::Start);

        while let Some(index) = self.state.current_frame() {
            if abort.is_aborted() {
                self.state = self.state.transition(PlaybackEvent::AbortRequested);
                break;
            }

            if let Err(e) = self.render(store, index as usize) {
                self.state = self.state.transition(PlaybackEvent::DataFault);
                return Err(PlaybackError::Frame(e));
            }

            if let Err(e) = self.sink.push(self.buffer.as_slice(), width, height).await {
                self.state = self.state.transition(PlaybackEvent::SinkFailed);
                #[cfg(feature = "defmt")]
                defmt::warn!("display push failed at frame {}", index);
                return Err(PlaybackError::DisplayTransport(e));
            }
            frames_pushed += 1;

            let delay = store.delay_ms(index as usize, self.default_delay_ms);
            self.clock.wait_ms(delay as u32).await;

            self.state = self
                .state
                .transition(PlaybackEvent::FrameElapsed { frame_count });
        }

        let outcome = self.state.outcome().unwrap_or(PlaybackOutcome::Completed);
        let elapsed_ms = self.clock.now_ms().saturating_sub(started);

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "playback {}: {}/{} frames in {} ms",
            outcome,
            frames_pushed,
            frame_count,
            elapsed_ms
        );

        Ok(PlaybackReport {
            frames_pushed,
            outcome,
            elapsed_ms,
        })
    }

    /// Reconstruct frame `index` into the working buffer
    fn render(&mut self, store: &FrameStore<'_>, index: usize) -> Result<(), FrameError> {
        match store.frame(index)? {
            Frame::Base(base) => self.buffer.load_base(base),
            Frame::Delta(deltas) => self.buffer.apply(deltas),
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::frame::Delta;
    use crate::traits::NeverAbort;
    use core::sync::atomic::{AtomicBool, Ordering};
    use embassy_futures::{block_on, poll_once};
    use std::vec::Vec;

    const BYTES: usize = 128;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct SinkError;

    /// Records every pushed frame
    #[derive(Default)]
    struct MockSink {
        frames: Vec<Vec<u8>>,
        /// Fail when pushing this frame number (0-based)
        fail_at: Option<usize>,
        /// Set the flag after this many successful pushes
        trip: Option<(usize, &'static AtomicBool)>,
    }

    impl DisplaySink for MockSink {
        type Error = SinkError;

        async fn push(&mut self, buffer: &[u8], width: u16, height: u16) -> Result<(), SinkError> {
            assert_eq!(buffer.len(), width as usize * height as usize / 8);
            if self.fail_at == Some(self.frames.len()) {
                return Err(SinkError);
            }
            self.frames.push(buffer.to_vec());
            if let Some((after, flag)) = self.trip {
                if self.frames.len() == after {
                    flag.store(true, Ordering::Release);
                }
            }
            Ok(())
        }
    }

    /// Advances time only when waited on
    #[derive(Default)]
    struct MockClock {
        now: u64,
        waits: Vec<u32>,
        /// Never finish the wait with this number (1-based)
        stall_at: Option<usize>,
    }

    impl Clock for MockClock {
        fn now_ms(&self) -> u64 {
            self.now
        }

        async fn wait_ms(&mut self, ms: u32) {
            self.waits.push(ms);
            if self.stall_at == Some(self.waits.len()) {
                core::future::pending::<()>().await;
            }
            self.now += ms as u64;
        }
    }

    type Driver = PlaybackDriver<MockSink, MockClock, BYTES>;

    static ZERO_BASE: [u8; BYTES] = [0; BYTES];
    static SET_FIRST: [Delta; 1] = [Delta::new(0, 0xFF)];
    static NO_CHANGE: [Delta; 0] = [];

    fn three_frame_store() -> FrameStore<'static> {
        static TABLE: [&[Delta]; 2] = [&SET_FIRST, &NO_CHANGE];
        FrameStore::new(32, 32, &ZERO_BASE, &TABLE, None).unwrap()
    }

    static WALK: [[Delta; 1]; 4] = [
        [Delta::new(1, 0x01)],
        [Delta::new(2, 0x02)],
        [Delta::new(3, 0x03)],
        [Delta::new(4, 0x04)],
    ];

    fn five_frame_store() -> FrameStore<'static> {
        static TABLE: [&[Delta]; 4] = [&WALK[0], &WALK[1], &WALK[2], &WALK[3]];
        FrameStore::new(32, 32, &ZERO_BASE, &TABLE, None).unwrap()
    }

    #[test]
    fn test_three_frame_scenario() {
        let mut driver = Driver::new(MockSink::default(), MockClock::default());
        let report = block_on(driver.play(&three_frame_store(), &NeverAbort)).unwrap();

        assert_eq!(report.outcome, PlaybackOutcome::Completed);
        assert_eq!(report.frames_pushed, 3);

        let frames = &driver.sink_mut().frames;
        assert_eq!(frames.len(), 3);
        assert!(frames[0].iter().all(|&b| b == 0));
        assert_eq!(frames[1][0], 0xFF);
        assert!(frames[1][1..].iter().all(|&b| b == 0));
        assert_eq!(frames[2], frames[1]);
        assert_eq!(driver.state(), PlaybackState::Done(PlaybackOutcome::Completed));
    }

    #[test]
    fn test_delay_after_every_frame() {
        let mut driver = Driver::new(MockSink::default(), MockClock::default());
        driver.set_default_delay(40);
        let report = block_on(driver.play(&three_frame_store(), &NeverAbort)).unwrap();

        assert_eq!(driver.clock_mut().waits, [40, 40, 40]);
        assert_eq!(report.elapsed_ms, 120);
    }

    #[test]
    fn test_store_delay_table_wins() {
        static DELAYS: [u16; 3] = [10, 20, 30];
        static TABLE: [&[Delta]; 2] = [&SET_FIRST, &NO_CHANGE];
        let store = FrameStore::new(32, 32, &ZERO_BASE, &TABLE, Some(&DELAYS)).unwrap();

        let mut driver = Driver::new(MockSink::default(), MockClock::default());
        block_on(driver.play(&store, &NeverAbort)).unwrap();
        assert_eq!(driver.clock_mut().waits, [10, 20, 30]);
    }

    #[test]
    fn test_each_frame_is_previous_plus_deltas() {
        let store = five_frame_store();
        let mut driver = Driver::new(MockSink::default(), MockClock::default());
        block_on(driver.play(&store, &NeverAbort)).unwrap();

        let frames = &driver.sink_mut().frames;
        for i in 1..frames.len() {
            let mut expected = frames[i - 1].clone();
            for d in &WALK[i - 1] {
                expected[d.index as usize] = d.value;
            }
            assert_eq!(frames[i], expected, "frame {}", i);
        }
    }

    #[test]
    fn test_replay_is_deterministic() {
        let store = five_frame_store();
        let mut driver = Driver::new(MockSink::default(), MockClock::default());
        block_on(driver.play(&store, &NeverAbort)).unwrap();
        block_on(driver.play(&store, &NeverAbort)).unwrap();

        let frames = &driver.sink_mut().frames;
        assert_eq!(frames.len(), 10);
        assert_eq!(frames[..5], frames[5..]);
    }

    #[test]
    fn test_dropped_session_restarts_from_base() {
        static FIRST_BASE: [u8; BYTES] = [0xAA; BYTES];
        static FIRST_TABLE: [&[Delta]; 1] = [&SET_FIRST];
        static SECOND_BASE: [u8; BYTES] = [0x11; BYTES];
        static SECOND_DELTA: [Delta; 1] = [Delta::new(3, 0x22)];
        static SECOND_TABLE: [&[Delta]; 1] = [&SECOND_DELTA];

        let first = FrameStore::new(32, 32, &FIRST_BASE, &FIRST_TABLE, None).unwrap();
        let second = FrameStore::new(32, 32, &SECOND_BASE, &SECOND_TABLE, None).unwrap();

        let clock = MockClock {
            stall_at: Some(2),
            ..Default::default()
        };
        let mut driver = Driver::new(MockSink::default(), clock);

        // Cancelled while waiting after frame 1
        assert!(poll_once(driver.play(&first, &NeverAbort)).is_pending());
        assert_eq!(driver.state(), PlaybackState::Playing(1));

        driver.clock_mut().stall_at = None;
        let report = block_on(driver.play(&second, &NeverAbort)).unwrap();
        assert_eq!(report.outcome, PlaybackOutcome::Completed);
        assert_eq!(report.frames_pushed, 2);

        let frames = &driver.sink_mut().frames;
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[2], SECOND_BASE.to_vec());
        let mut expected = SECOND_BASE.to_vec();
        expected[3] = 0x22;
        assert_eq!(frames[3], expected);
    }

    #[test]
    fn test_display_error_stops_playback() {
        let sink = MockSink {
            fail_at: Some(2),
            ..Default::default()
        };
        let mut driver = Driver::new(sink, MockClock::default());
        let result = block_on(driver.play(&five_frame_store(), &NeverAbort));

        assert_eq!(result, Err(PlaybackError::DisplayTransport(SinkError)));
        assert_eq!(driver.state(), PlaybackState::Done(PlaybackOutcome::Failed));
        // Frames 0 and 1 shown, frames 2-4 never rendered
        assert_eq!(driver.sink_mut().frames.len(), 2);
        // No wait after the failed push
        assert_eq!(driver.clock_mut().waits.len(), 2);
    }

    #[test]
    fn test_abort_between_frames() {
        static ABORT: AtomicBool = AtomicBool::new(false);
        let sink = MockSink {
            trip: Some((2, &ABORT)),
            ..Default::default()
        };
        let mut driver = Driver::new(sink, MockClock::default());
        let report = block_on(driver.play(&five_frame_store(), &ABORT)).unwrap();

        assert_eq!(report.outcome, PlaybackOutcome::Aborted);
        assert_eq!(report.frames_pushed, 2);
        assert_eq!(driver.state(), PlaybackState::Done(PlaybackOutcome::Aborted));

        let frames = &driver.sink_mut().frames;
        assert_eq!(frames.len(), 2);
        // Last pushed frame is the complete frame 1
        assert_eq!(frames[1][1], 0x01);
        assert_eq!(frames[1][2], 0x00);
    }

    #[test]
    fn test_abort_before_start_pushes_nothing() {
        let abort = AtomicBool::new(true);
        let mut driver = Driver::new(MockSink::default(), MockClock::default());
        let report = block_on(driver.play(&three_frame_store(), &abort)).unwrap();
        assert_eq!(report.outcome, PlaybackOutcome::Aborted);
        assert_eq!(report.frames_pushed, 0);
    }

    #[test]
    fn test_dimension_mismatch_rejected_before_drawing() {
        let mut driver = PlaybackDriver::<MockSink, MockClock, 64>::new(
            MockSink::default(),
            MockClock::default(),
        );
        let result = block_on(driver.play(&three_frame_store(), &NeverAbort));
        assert_eq!(
            result,
            Err(PlaybackError::Frame(FrameError::DimensionMismatch {
                expected: 64,
                actual: 128
            }))
        );
        assert_eq!(driver.state(), PlaybackState::Idle);
        assert!(driver.sink_mut().frames.is_empty());
    }

    #[test]
    fn test_single_frame_store() {
        static TABLE: [&[Delta]; 0] = [];
        let store = FrameStore::new(32, 32, &ZERO_BASE, &TABLE, None).unwrap();
        let mut driver = Driver::new(MockSink::default(), MockClock::default());
        let report = block_on(driver.play(&store, &NeverAbort)).unwrap();
        assert_eq!(report.frames_pushed, 1);
        assert_eq!(report.outcome, PlaybackOutcome::Completed);
    }
}
