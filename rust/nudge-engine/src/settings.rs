//! Audio preferences shared between the engine and the host UI.
//!
//! One hub owns the value; every consumer holds a `watch` receiver and sees
//! each change. There is exactly one way to write: [`AudioSettingsHub::update`].

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioPreferences {
    /// 0.0 to 1.0.
    pub master_volume: f32,
    pub sounds_enabled: bool,
    pub breathing_cues_enabled: bool,
    pub completion_chime_enabled: bool,
}

impl Default for AudioPreferences {
    fn default() -> Self {
        Self {
            master_volume: 0.7,
            sounds_enabled: true,
            breathing_cues_enabled: true,
            completion_chime_enabled: true,
        }
    }
}

/// Sounds the engine asks the host to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    BreathingPhase,
    CompletionChime,
}

impl AudioPreferences {
    /// Volume to play `cue` at; zero when muted.
    pub fn volume_for(&self, cue: Cue) -> f32 {
        let enabled = self.sounds_enabled
            && match cue {
                Cue::BreathingPhase => self.breathing_cues_enabled,
                Cue::CompletionChime => self.completion_chime_enabled,
            };
        if enabled { self.master_volume } else { 0.0 }
    }
}

#[derive(Debug)]
pub struct AudioSettingsHub {
    tx: watch::Sender<AudioPreferences>,
}

impl AudioSettingsHub {
    pub fn new(initial: AudioPreferences) -> Self {
        let (tx, _rx) = watch::channel(Self::normalized(initial));
        Self { tx }
    }

    fn normalized(mut prefs: AudioPreferences) -> AudioPreferences {
        prefs.master_volume = prefs.master_volume.clamp(0.0, 1.0);
        prefs
    }

    pub fn current(&self) -> AudioPreferences {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<AudioPreferences> {
        self.tx.subscribe()
    }

    /// Apply `change` and notify subscribers if anything actually changed.
    /// Volume is clamped into range.
    pub fn update(&self, change: impl FnOnce(&mut AudioPreferences)) -> bool {
        self.tx.send_if_modified(|prefs| {
            let before = *prefs;
            change(prefs);
            *prefs = Self::normalized(*prefs);
            *prefs != before
        })
    }

    /// Replace everything, e.g. with settings fetched from the server.
    pub fn replace(&self, prefs: AudioPreferences) -> bool {
        self.update(|current| *current = prefs)
    }
}

impl Default for AudioSettingsHub {
    fn default() -> Self {
        Self::new(AudioPreferences::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let hub = AudioSettingsHub::default();
        let mut rx = hub.subscribe();

        assert!(hub.update(|p| p.master_volume = 1.4));
        rx.changed().await.unwrap();
        assert!((rx.borrow_and_update().master_volume - 1.0).abs() < f32::EPSILON);

        // No-op writes do not wake subscribers.
        assert!(!hub.update(|p| p.sounds_enabled = true));
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_volume_for_respects_toggles() {
        let mut prefs = AudioPreferences::default();
        assert!((prefs.volume_for(Cue::BreathingPhase) - 0.7).abs() < f32::EPSILON);

        prefs.breathing_cues_enabled = false;
        assert!(prefs.volume_for(Cue::BreathingPhase).abs() < f32::EPSILON);
        assert!(prefs.volume_for(Cue::CompletionChime) > 0.0);

        prefs.sounds_enabled = false;
        assert!(prefs.volume_for(Cue::CompletionChime).abs() < f32::EPSILON);
    }

    #[test]
    fn test_replace() {
        let hub = AudioSettingsHub::default();
        let prefs = AudioPreferences {
            master_volume: 0.2,
            ..AudioPreferences::default()
        };
        assert!(hub.replace(prefs));
        assert_eq!(hub.current(), prefs);
    }
}
