/// Whether the main surface is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisibilityState {
    #[default]
    Visible,
    Hidden, // capture in flight
}

/// Hides the surface for the duration of one capture attempt.
///
/// Each hide opens a numbered attempt; only the first completion for the open
/// attempt shows the surface again, so late or duplicate callbacks are
/// dropped.
#[derive(Debug, Default)]
pub struct VisibilityStateMachine {
    state: VisibilityState,
    attempt: u64,
}

impl VisibilityStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> VisibilityState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state == VisibilityState::Visible
    }

    /// Attempt number of the capture currently in flight, if any.
    pub fn pending_attempt(&self) -> Option<u64> {
        (self.state == VisibilityState::Hidden).then_some(self.attempt)
    }

    /// `Visible -> Hidden`. Returns the new attempt number, or `None` when a
    /// capture is already in flight.
    pub fn begin_capture(&mut self) -> Option<u64> {
        match self.state {
            VisibilityState::Visible => {
                self.attempt += 1;
                self.state = VisibilityState::Hidden;
                log::debug!("Hiding surface for capture attempt {}", self.attempt);
                Some(self.attempt)
            }
            VisibilityState::Hidden => {
                log::warn!(
                    "Capture requested while attempt {} is still in flight",
                    self.attempt
                );
                None
            }
        }
    }

    /// `Hidden -> Visible` for `attempt`. Returns whether a transition happened.
    pub fn finish_capture(&mut self, attempt: u64) -> bool {
        if self.pending_attempt() != Some(attempt) {
            log::debug!(
                "Ignoring completion for attempt {} (pending: {:?})",
                attempt,
                self.pending_attempt()
            );
            return false;
        }
        self.state = VisibilityState::Visible;
        log::debug!("Showing surface after capture attempt {}", attempt);
        true
    }

    /// User-initiated cancel of whatever capture is in flight.
    pub fn cancel(&mut self) -> bool {
        match self.pending_attempt() {
            Some(attempt) => self.finish_capture(attempt),
            None => false,
        }
    }
}
