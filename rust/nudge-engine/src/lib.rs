//! Nudge Engine
//!
//! Client-side engine behind the Joy Nudge prompt screen. It decides which
//! prompt to show, runs the interactive flow for it and keeps local history,
//! syncing with the Joy Nudge API on a best-effort basis.
//!
//! # Architecture
//!
//! - [`engine`]: the `Idle` / `Active` / `Celebrating` state machine
//! - [`interaction`]: breathing, countdown, checklist and reflection flows
//! - [`playlist`]: queue plus cyclic rotation
//! - [`store`]: local persisted state (JSON file or memory)
//! - [`backend`]: remote seams and the `reqwest` client for the API
//! - [`settings`]: audio preferences hub
//! - [`events`]: broadcast events for the host UI
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use nudge_engine::prelude::*;
//!
//! let backend = Arc::new(HttpBackend::new("http://localhost:8080", token)?);
//! let deps = EngineDeps {
//!     store: Arc::new(JsonFileStore::new("joy-nudge-state.json")),
//!     backend: backend.clone(),
//!     source: backend,
//! };
//! let audio = AudioSettingsHub::default();
//! let mut engine = NudgeEngine::new(prompts, deps, &audio, EngineConfig::default())?;
//!
//! engine.engage().await?;
//! loop {
//!     engine.tick(Duration::from_millis(100)).await;
//! }
//! ```

pub mod backend;
pub mod engine;
pub mod error;
pub mod events;
pub mod interaction;
pub mod playlist;
pub mod prompt;
pub mod settings;
pub mod store;

pub use engine::{EngineConfig, EngineDeps, EngineState, NudgeEngine};
pub use error::{EngineError, EngineResult};
pub use prompt::{InteractiveType, Prompt};

/// Common imports for hosts.
pub mod prelude {
    pub use crate::backend::{BackendSink, GenerateRequest, HttpBackend, NudgeSource};
    pub use crate::engine::{EngineConfig, EngineDeps, EngineState, NudgeEngine};
    pub use crate::events::EngineEvent;
    pub use crate::interaction::Interaction;
    pub use crate::prompt::{InteractiveType, Prompt};
    pub use crate::settings::{AudioPreferences, AudioSettingsHub};
    pub use crate::store::{JsonFileStore, LocalStore, MemoryStore};
}
