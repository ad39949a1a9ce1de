//! Playback state machine
//!
//! The driver's progress through one animation is a function of the
//! current state and an event, nothing else.

/// How a playback session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlaybackOutcome {
    /// Every frame was shown
    Completed,
    /// Stopped at a frame boundary by the abort signal
    Aborted,
    /// Display sink or frame data error
    Failed,
}

/// Playback states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlaybackState {
    /// No animation loaded yet
    Idle,
    /// Frame 0: base frame copied in full
    Loading,
    /// Frame i > 0: deltas applied on top of frame i-1
    Playing(u16),
    /// Session over
    Done(PlaybackOutcome),
}

/// Events that move playback forward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlaybackEvent {
    /// `play` was called
    Start,
    /// Current frame was pushed and its delay has elapsed
    FrameElapsed {
        /// Frame count of the animation being played
        frame_count: u16,
    },
    /// Abort signal seen at a frame boundary
    AbortRequested,
    /// Display sink reported an error
    SinkFailed,
    /// Frame data could not be reconstructed
    DataFault,
}

impl PlaybackState {
    /// Frame index being rendered, if a session is active
    pub fn current_frame(&self) -> Option<u16> {
        match self {
            PlaybackState::Loading => Some(0),
            PlaybackState::Playing(i) => Some(*i),
            PlaybackState::Idle | PlaybackState::Done(_) => None,
        }
    }

    /// Check if a session is in progress
    pub fn is_active(&self) -> bool {
        self.current_frame().is_some()
    }

    /// Outcome of the finished session, if any
    pub fn outcome(&self) -> Option<PlaybackOutcome> {
        match self {
            PlaybackState::Done(outcome) => Some(*outcome),
            _ => None,
        }
    }

    /// Process an event and return the next state
    pub fn transition(self, event: PlaybackEvent) -> Self {
        use PlaybackEvent::*;
        use PlaybackState::*;

        match (self, event) {
            // A session dropped mid-animation restarts from the base frame
            (_, Start) => Loading,

            (Loading, FrameElapsed { frame_count }) => {
                if frame_count > 1 {
                    Playing(1)
                } else {
                    Done(PlaybackOutcome::Completed)
                }
            }
            (Playing(i), FrameElapsed { frame_count }) => {
                if i + 1 < frame_count {
                    Playing(i + 1)
                } else {
                    Done(PlaybackOutcome::Completed)
                }
            }

            (Loading | Playing(_), AbortRequested) => Done(PlaybackOutcome::Aborted),
            (Loading | Playing(_), SinkFailed | DataFault) => Done(PlaybackOutcome::Failed),

            // Default: stay in current state
            _ => self,
        }
    }
}
