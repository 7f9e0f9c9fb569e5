use crate::shared::constants::COUNTDOWN_START;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEvent {
    /// No sequence is running.
    Idle,
    /// Show this number.
    Show(u8),
    /// Count reached zero: take the picture now.
    Capture,
}

/// Linear capture countdown: 3, 2, 1, then a single capture trigger.
///
/// Starting while a sequence runs does nothing, so each sequence triggers
/// exactly one capture.
#[derive(Debug, Clone)]
pub struct Countdown {
    from: u8,
    remaining: Option<u8>,
}

impl Countdown {
    pub fn new() -> Self {
        Self::from(COUNTDOWN_START)
    }

    pub fn from(from: u8) -> Self {
        Self {
            from: from.max(1),
            remaining: None,
        }
    }

    /// Begin a sequence. Returns `false` (and changes nothing) if one is
    /// already running.
    pub fn start(&mut self) -> bool {
        if self.remaining.is_some() {
            return false;
        }
        self.remaining = Some(self.from);
        true
    }

    pub fn is_active(&self) -> bool {
        self.remaining.is_some()
    }

    /// Number currently displayed, if a sequence is running.
    pub fn current(&self) -> Option<u8> {
        self.remaining
    }

    /// Advance one step (one second in the UI).
    pub fn tick(&mut self) -> CountdownEvent {
        match self.remaining {
            None => CountdownEvent::Idle,
            Some(n) if n <= 1 => {
                self.remaining = None;
                CountdownEvent::Capture
            }
            Some(n) => {
                self.remaining = Some(n - 1);
                CountdownEvent::Show(n - 1)
            }
        }
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_counts_down_then_captures_once() {
        let mut countdown = Countdown::new();
        assert!(countdown.start());
        assert_eq!(countdown.current(), Some(3));

        let events: Vec<_> = (0..6).map(|_| countdown.tick()).collect();
        assert_eq!(
            events,
            [
                CountdownEvent::Show(2),
                CountdownEvent::Show(1),
                CountdownEvent::Capture,
                CountdownEvent::Idle,
                CountdownEvent::Idle,
                CountdownEvent::Idle,
            ]
        );
        assert!(!countdown.is_active());
    }

    #[test]
    fn test_start_mid_sequence_is_noop() {
        let mut countdown = Countdown::new();
        assert!(countdown.start());
        countdown.tick();
        assert!(!countdown.start());
        assert_eq!(countdown.current(), Some(2));

        let captures = (0..10)
            .map(|_| countdown.tick())
            .filter(|e| *e == CountdownEvent::Capture)
            .count();
        assert_eq!(captures, 1);
    }

    #[test]
    fn test_can_restart_after_completion() {
        let mut countdown = Countdown::from(1);
        assert!(countdown.start());
        assert_eq!(countdown.tick(), CountdownEvent::Capture);
        assert!(countdown.start());
        assert_eq!(countdown.tick(), CountdownEvent::Capture);
    }

    #[test]
    fn test_tick_without_start_is_idle() {
        let mut countdown = Countdown::new();
        assert_eq!(countdown.tick(), CountdownEvent::Idle);
        assert!(!countdown.is_active());
    }
}
