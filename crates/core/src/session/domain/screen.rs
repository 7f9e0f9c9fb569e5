use std::fmt;

/// The five screens of a session, in flow order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Splash,
    EraSelection,
    Capture,
    Processing,
    Result,
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Screen::Splash => "splash",
            Screen::EraSelection => "era selection",
            Screen::Capture => "capture",
            Screen::Processing => "processing",
            Screen::Result => "result",
        };
        f.write_str(name)
    }
}
