//! Interactive sub-flows: breathing, countdown, checklist and reflection.
//!
//! Each flow is a plain value advanced by the engine. Nothing here owns a
//! timer; time only moves when `advance` is called.

use serde::Serialize;
use std::time::Duration;

use crate::error::{EngineError, EngineResult};

pub const INHALE: Duration = Duration::from_secs(4);
pub const EXHALE: Duration = Duration::from_secs(4);
pub const DEFAULT_HOLD_SECS: u64 = 3;
pub const DEFAULT_CYCLES: u32 = 3;
pub const DEFAULT_TIMER_SECS: u32 = 60;
pub const MIN_REFLECTION_WORDS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreathPhase {
    Inhale,
    Hold,
    Exhale,
}

/// Phase lengths and cycle count for a breathing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreathingPattern {
    pub inhale: Duration,
    pub hold: Duration,
    pub exhale: Duration,
    pub cycles: u32,
}

impl BreathingPattern {
    /// Hold is clamped to 2..=3 seconds; at least one cycle is run.
    pub fn new(hold_secs: u64, cycles: u32) -> Self {
        Self {
            inhale: INHALE,
            hold: Duration::from_secs(hold_secs.clamp(2, 3)),
            exhale: EXHALE,
            cycles: cycles.max(1),
        }
    }

    pub fn cycle_len(&self) -> Duration {
        self.inhale + self.hold + self.exhale
    }

    pub fn total(&self) -> Duration {
        self.cycle_len() * self.cycles
    }
}

impl Default for BreathingPattern {
    fn default() -> Self {
        Self::new(DEFAULT_HOLD_SECS, DEFAULT_CYCLES)
    }
}

/// Inhale, hold, exhale, repeated for the configured number of cycles.
#[derive(Debug, Clone, PartialEq)]
pub struct BreathingSession {
    pattern: BreathingPattern,
    elapsed: Duration,
}

impl BreathingSession {
    pub fn new(pattern: BreathingPattern) -> Self {
        Self {
            pattern,
            elapsed: Duration::ZERO,
        }
    }

    pub fn pattern(&self) -> &BreathingPattern {
        &self.pattern
    }

    /// Move time forward. Returns true only on the call that finishes the
    /// final exhale.
    pub fn advance(&mut self, dt: Duration) -> bool {
        if self.is_complete() {
            return false;
        }
        self.elapsed = (self.elapsed + dt).min(self.pattern.total());
        self.is_complete()
    }

    pub fn is_complete(&self) -> bool {
        self.elapsed >= self.pattern.total()
    }

    /// Zero-based cycle index and seconds into that cycle.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "index is a non-negative whole number below the cycle count"
    )]
    fn position(&self) -> Option<(u32, f64)> {
        if self.is_complete() {
            return None;
        }
        let cycle = self.pattern.cycle_len().as_secs_f64();
        let t = self.elapsed.as_secs_f64();
        let index = (t / cycle).floor();
        Some((index as u32, t - index * cycle))
    }

    /// Current phase and the fraction of it already done.
    fn phase_at(&self) -> Option<(BreathPhase, f64)> {
        let (_, within) = self.position()?;
        let inhale = self.pattern.inhale.as_secs_f64();
        let hold = self.pattern.hold.as_secs_f64();
        let exhale = self.pattern.exhale.as_secs_f64();

        Some(if within < inhale {
            (BreathPhase::Inhale, within / inhale)
        } else if within < inhale + hold {
            (BreathPhase::Hold, (within - inhale) / hold)
        } else {
            (BreathPhase::Exhale, ((within - inhale - hold) / exhale).min(1.0))
        })
    }

    /// `None` once every cycle has finished.
    pub fn phase(&self) -> Option<BreathPhase> {
        self.phase_at().map(|(phase, _)| phase)
    }

    /// Fraction of the current phase elapsed; 1.0 when finished.
    pub fn phase_progress(&self) -> f64 {
        self.phase_at().map_or(1.0, |(_, fraction)| fraction)
    }

    /// Fraction of the whole session elapsed.
    pub fn progress(&self) -> f64 {
        (self.elapsed.as_secs_f64() / self.pattern.total().as_secs_f64()).min(1.0)
    }

    /// One-based cycle number, capped at the last cycle.
    pub fn cycle(&self) -> u32 {
        self.position()
            .map_or(self.pattern.cycles, |(index, _)| index + 1)
    }
}

/// Single countdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownTimer {
    duration: Duration,
    remaining: Duration,
}

impl CountdownTimer {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            remaining: duration,
        }
    }

    pub fn from_secs(seconds: u32) -> Self {
        Self::new(Duration::from_secs(u64::from(seconds)))
    }

    /// Returns true only on the call that reaches zero.
    pub fn advance(&mut self, dt: Duration) -> bool {
        if self.is_complete() {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(dt);
        self.is_complete()
    }

    pub fn is_complete(&self) -> bool {
        self.remaining.is_zero()
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn progress(&self) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        1.0 - self.remaining.as_secs_f64() / self.duration.as_secs_f64()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecklistItem {
    pub label: String,
    pub checked: bool,
}

/// Fixed list of things to notice. Items toggle; they are not append-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checklist {
    items: Vec<ChecklistItem>,
}

impl Checklist {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            items: labels
                .into_iter()
                .map(|label| ChecklistItem {
                    label: label.into(),
                    checked: false,
                })
                .collect(),
        }
    }

    /// Flip one item. Returns true exactly when this toggle checked the
    /// last unchecked item.
    pub fn toggle(&mut self, index: usize) -> EngineResult<bool> {
        let len = self.items.len();
        let was_complete = self.is_complete();
        let item = self
            .items
            .get_mut(index)
            .ok_or(EngineError::InvalidItem { index, len })?;
        item.checked = !item.checked;
        Ok(!was_complete && self.is_complete())
    }

    pub fn items(&self) -> &[ChecklistItem] {
        &self.items
    }

    pub fn checked_count(&self) -> usize {
        self.items.iter().filter(|item| item.checked).count()
    }

    pub fn is_complete(&self) -> bool {
        self.items.iter().all(|item| item.checked)
    }
}

/// Free-text reflection gated on a minimum word count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReflectionDraft {
    text: String,
}

impl ReflectionDraft {
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    pub fn can_save(&self) -> bool {
        self.word_count() >= MIN_REFLECTION_WORDS
    }
}

/// The active sub-flow. Exactly one runs at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum Interaction {
    Breathing(BreathingSession),
    Timer(CountdownTimer),
    Checklist(Checklist),
    Reflection(ReflectionDraft),
}

impl Interaction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Breathing(_) => "breathing",
            Self::Timer(_) => "timer",
            Self::Checklist(_) => "checklist",
            Self::Reflection(_) => "reflection",
        }
    }

    /// Reflections complete on save, never by themselves.
    pub fn is_complete(&self) -> bool {
        match self {
            Self::Breathing(session) => session.is_complete(),
            Self::Timer(timer) => timer.is_complete(),
            Self::Checklist(list) => list.is_complete(),
            Self::Reflection(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn test_breathing_phase_sequence() {
        let mut session = BreathingSession::new(BreathingPattern::default());
        assert_eq!(session.pattern().total(), Duration::from_secs(33));
        assert_eq!(session.phase(), Some(BreathPhase::Inhale));
        assert_eq!(session.cycle(), 1);

        session.advance(secs(2.0));
        assert!((session.phase_progress() - 0.5).abs() < 1e-9);

        session.advance(secs(2.0));
        assert_eq!(session.phase(), Some(BreathPhase::Hold));

        session.advance(secs(3.0));
        assert_eq!(session.phase(), Some(BreathPhase::Exhale));

        session.advance(secs(4.0));
        assert_eq!(session.phase(), Some(BreathPhase::Inhale));
        assert_eq!(session.cycle(), 2);
    }

    #[test]
    fn test_breathing_completes_after_final_exhale() {
        let mut session = BreathingSession::new(BreathingPattern::new(2, 2));
        assert_eq!(session.pattern().total(), Duration::from_secs(20));

        assert!(!session.advance(secs(19.5)));
        assert_eq!(session.phase(), Some(BreathPhase::Exhale));
        assert!(session.advance(secs(1.0)));
        assert!(session.is_complete());
        assert_eq!(session.phase(), None);
        assert!((session.progress() - 1.0).abs() < f64::EPSILON);

        // Completion fires once.
        assert!(!session.advance(secs(1.0)));
    }

    #[test]
    fn test_breathing_hold_is_clamped() {
        assert_eq!(BreathingPattern::new(10, 3).hold, Duration::from_secs(3));
        assert_eq!(BreathingPattern::new(0, 3).hold, Duration::from_secs(2));
        assert_eq!(BreathingPattern::new(3, 0).cycles, 1);
    }

    #[test]
    fn test_countdown() {
        let mut timer = CountdownTimer::from_secs(DEFAULT_TIMER_SECS);
        assert!(!timer.advance(secs(59.0)));
        assert_eq!(timer.remaining(), Duration::from_secs(1));
        assert!(timer.advance(secs(5.0)));
        assert!(timer.is_complete());
        assert!(!timer.advance(secs(1.0)));
        assert!((timer.progress() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_checklist_completes_only_on_last_item() {
        let mut list = Checklist::new(["sky", "sound", "texture"]);

        assert!(!list.toggle(0).unwrap());
        assert!(!list.toggle(1).unwrap());
        // Unchecking keeps it incomplete.
        assert!(!list.toggle(1).unwrap());
        assert_eq!(list.checked_count(), 1);
        assert!(!list.toggle(1).unwrap());
        assert!(list.toggle(2).unwrap());
        assert!(list.is_complete());
    }

    #[test]
    fn test_checklist_rejects_bad_index() {
        let mut list = Checklist::new(["only"]);
        assert!(matches!(
            list.toggle(3),
            Err(EngineError::InvalidItem { index: 3, len: 1 })
        ));
    }

    #[test]
    fn test_reflection_word_gate() {
        let mut draft = ReflectionDraft::default();
        draft.set_text("one two three four five six seven eight nine");
        assert_eq!(draft.word_count(), 9);
        assert!(!draft.can_save());

        draft.set_text("one two three four five six seven eight nine   ten");
        assert_eq!(draft.word_count(), 10);
        assert!(draft.can_save());
    }
}
