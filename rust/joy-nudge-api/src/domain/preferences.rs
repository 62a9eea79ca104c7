//! Per-user mutable preferences: audio settings and likes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Audio preferences. The only record that is updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSettings {
    pub user_id: String,
    /// 0.0 to 1.0.
    pub master_volume: f32,
    pub sounds_enabled: bool,
    pub breathing_cues_enabled: bool,
    pub completion_chime_enabled: bool,
    pub updated_at: DateTime<Utc>,
}

impl AudioSettings {
    /// Defaults used until the user saves anything.
    pub fn defaults_for(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            master_volume: 0.7,
            sounds_enabled: true,
            breathing_cues_enabled: true,
            completion_chime_enabled: true,
            updated_at: now,
        }
    }

    /// Apply a partial update. Volume is clamped into range.
    pub fn apply(&mut self, patch: &AudioSettingsPatch, now: DateTime<Utc>) {
        if let Some(volume) = patch.master_volume {
            self.master_volume = volume.clamp(0.0, 1.0);
        }
        if let Some(enabled) = patch.sounds_enabled {
            self.sounds_enabled = enabled;
        }
        if let Some(enabled) = patch.breathing_cues_enabled {
            self.breathing_cues_enabled = enabled;
        }
        if let Some(enabled) = patch.completion_chime_enabled {
            self.completion_chime_enabled = enabled;
        }
        self.updated_at = now;
    }
}

/// Partial audio settings update; absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioSettingsPatch {
    #[serde(default)]
    pub master_volume: Option<f32>,
    #[serde(default)]
    pub sounds_enabled: Option<bool>,
    #[serde(default)]
    pub breathing_cues_enabled: Option<bool>,
    #[serde(default)]
    pub completion_chime_enabled: Option<bool>,
}

/// A user liking a nudge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NudgeLike {
    pub user_id: String,
    pub nudge_id: String,
    pub created_at: DateTime<Utc>,
}
