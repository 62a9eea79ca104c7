//! Prompt ordering.
//!
//! Upcoming items are served first, in queue order; once the queue is
//! drained the static rotation resumes where it left off and wraps around.

use std::collections::VecDeque;

use crate::prompt::{InteractiveType, Prompt};

#[derive(Debug, Clone, Default)]
pub struct Playlist {
    rotation: Vec<Prompt>,
    /// Index of the next rotation item to serve.
    cursor: usize,
    upcoming: VecDeque<Prompt>,
}

impl Playlist {
    pub fn new(rotation: Vec<Prompt>) -> Self {
        Self {
            rotation,
            cursor: 0,
            upcoming: VecDeque::new(),
        }
    }

    /// Serve `prompt` before anything else (liked items, skip replacements).
    pub fn queue_front(&mut self, prompt: Prompt) {
        self.upcoming.push_front(prompt);
    }

    /// Serve `prompt` after everything already queued (restored queue).
    pub fn append(&mut self, prompt: Prompt) {
        self.upcoming.push_back(prompt);
    }

    /// Next prompt to show. `None` only when both queue and rotation are
    /// empty.
    pub fn advance(&mut self) -> Option<Prompt> {
        if let Some(prompt) = self.upcoming.pop_front() {
            return Some(prompt);
        }
        if self.rotation.is_empty() {
            return None;
        }
        let prompt = self.rotation[self.cursor % self.rotation.len()].clone();
        self.cursor = (self.cursor + 1) % self.rotation.len();
        Some(prompt)
    }

    pub fn upcoming(&self) -> impl Iterator<Item = &Prompt> {
        self.upcoming.iter()
    }

    pub fn rotation(&self) -> &[Prompt] {
        &self.rotation
    }

    /// First breathing prompt in the rotation, if any.
    pub fn find_breathing(&self) -> Option<&Prompt> {
        self.rotation
            .iter()
            .find(|p| p.interactive_type == InteractiveType::Breathing)
    }

    pub fn is_empty(&self) -> bool {
        self.rotation.is_empty() && self.upcoming.is_empty()
    }
}
