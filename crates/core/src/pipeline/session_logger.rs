use std::collections::HashMap;
use std::time::Instant;

use crate::session::domain::screen::Screen;

/// Cross-cutting logger for session orchestration events.
///
/// Decouples the controller from specific output mechanisms so each front-end
/// can observe the session without changing the orchestration code.
pub trait SessionLogger: Send {
    /// Record a screen change caused by a named action.
    fn transition(&mut self, action: &str, from: Screen, to: Screen);

    /// Record how long a named stage (detect, generate, edit) took.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-session summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullSessionLogger;

impl SessionLogger for NullSessionLogger {
    fn transition(&mut self, _action: &str, _from: Screen, _to: Screen) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Logger backed by the `log` facade that keeps per-stage timings and a
/// screen history for the summary.
pub struct LogSessionLogger {
    timings: HashMap<String, Vec<f64>>,
    screens: Vec<Screen>,
    start_time: Instant,
    messages: Vec<String>,
}

impl LogSessionLogger {
    pub fn new() -> Self {
        Self {
            timings: HashMap::new(),
            screens: vec![Screen::Splash],
            start_time: Instant::now(),
            messages: Vec::new(),
        }
    }

    /// Returns the formatted summary string, or `None` if nothing happened.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.screens.len() <= 1 {
            return None;
        }

        let elapsed = self.start_time.elapsed().as_secs_f64();
        let mut lines = vec![format!("Session summary ({elapsed:.1}s total):")];

        let path: Vec<String> = self.screens.iter().map(Screen::to_string).collect();
        lines.push(format!("  screens: {}", path.join(" -> ")));

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = total_ms / durations.len() as f64;
            lines.push(format!(
                "  {stage:10}: {} run(s), avg {avg_ms:7.0}ms",
                durations.len()
            ));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn screens(&self) -> &[Screen] {
        &self.screens
    }
}

impl Default for LogSessionLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionLogger for LogSessionLogger {
    fn transition(&mut self, action: &str, from: Screen, to: Screen) {
        log::info!("{action}: {from} -> {to}");
        self.screens.push(to);
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        log::debug!("{stage} took {duration_ms:.0}ms");
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
