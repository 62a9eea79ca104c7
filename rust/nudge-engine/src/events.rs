//! Events the engine publishes for the host UI.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::interaction::BreathPhase;
use crate::prompt::{InteractiveType, Prompt};
use crate::settings::Cue;

/// Buffered events per subscriber before the oldest are dropped.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// A new prompt is showing in the idle state.
    PromptChanged { prompt: Prompt },
    InteractionStarted {
        prompt_key: String,
        interactive_type: InteractiveType,
    },
    BreathPhaseChanged { phase: BreathPhase, cycle: u32 },
    Completed { prompt_key: String, category: String },
    Skipped { prompt_key: String, category: String },
    StreakUpdated {
        current_streak_days: u32,
        longest_streak_days: u32,
        is_new_record: bool,
    },
    LikeChanged { prompt_key: String, liked: bool },
    /// Ask the host to play a sound.
    PlayCue { cue: Cue, volume: f32 },
    /// Toast-style message; never blocks the flow.
    Notice { message: String },
}

/// Fan-out of [`EngineEvent`]s. Sending never fails the caller.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: EngineEvent) {
        // No subscribers is fine.
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_subscribers() {
        EventBus::new().emit(EngineEvent::Notice {
            message: "nobody listening".into(),
        });
    }

    #[test]
    fn test_event_wire_shape() {
        let event = EngineEvent::LikeChanged {
            prompt_key: "n-1".into(),
            liked: true,
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            serde_json::json!({ "type": "like_changed", "prompt_key": "n-1", "liked": true })
        );
    }

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        bus.emit(EngineEvent::Notice {
            message: "saved".into(),
        });
        assert_eq!(
            rx.recv().await.unwrap(),
            EngineEvent::Notice {
                message: "saved".into()
            }
        );
    }
}
