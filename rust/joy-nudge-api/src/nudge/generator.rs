//! End-to-end nudge generation for one user.

use anyhow::Context;
use chrono::{DateTime, Duration, Timelike, Utc};
use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::sync::Arc;

use super::parse::{self, DraftError};
use super::validate::{
    MAX_DESCRIPTION_CHARS, MAX_TITLE_CHARS, coerce_category, coerce_interactive_type,
    truncate_chars,
};
use super::{GenerateNudgeRequest, fallback, prompt};
use crate::database::{ActivityRepository, Database, NudgeRepository, UserRepository};
use crate::domain::personalization::{EngagementTier, PersonalizationContext, TimeOfDay};
use crate::domain::{Category, InteractiveType, NewNudge, Nudge};
use crate::llm::LlmDriver;

/// How many recent completions feed the personalization context.
pub const RECENT_COMPLETIONS_LIMIT: usize = 10;

/// Signals reported back to the client alongside the nudge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonalizationUsed {
    pub engagement_level: EngagementTier,
    pub time_of_day: TimeOfDay,
    pub streak_days: u32,
    pub avoided_categories: Vec<Category>,
    pub avoided_types: Vec<InteractiveType>,
    pub mood: String,
    pub context: Option<String>,
    pub used_fallback: bool,
}

/// Result of one successful generation.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedNudge {
    pub nudge: Nudge,
    pub message: String,
    pub personalization_used: PersonalizationUsed,
}

/// Validated values ready to persist.
struct Candidate {
    title: String,
    description: String,
    category: Category,
    interactive_type: InteractiveType,
    duration_seconds: Option<u32>,
    used_fallback: bool,
}

/// Generates and stores personalized nudges.
pub struct NudgeGenerator {
    driver: Arc<dyn LlmDriver>,
    rng: Mutex<StdRng>,
}

impl std::fmt::Debug for NudgeGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NudgeGenerator")
            .field("provider", &self.driver.provider())
            .field("model", &self.driver.settings().model)
            .finish_non_exhaustive()
    }
}

impl NudgeGenerator {
    pub fn new(driver: Arc<dyn LlmDriver>) -> Self {
        Self {
            driver,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Deterministic random choices, for tests.
    pub fn with_seed(driver: Arc<dyn LlmDriver>, seed: u64) -> Self {
        Self {
            driver,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Settings of the underlying driver.
    pub fn settings(&self) -> &crate::llm::LlmSettings {
        self.driver.settings()
    }

    /// Turn raw model text into validated values.
    fn candidate_from(
        &self,
        text: &str,
        ctx: &PersonalizationContext,
        avoid_categories: &[Category],
        avoid_types: &[InteractiveType],
        skipped: Option<Category>,
        user_id: &str,
    ) -> Result<Candidate, DraftError> {
        let mut rng = self.rng.lock();
        match parse::parse_draft(text) {
            Ok(draft) => {
                let fields = draft.into_fields()?;
                let interactive_type = coerce_interactive_type(
                    fields.interactive_type.as_deref(),
                    avoid_types,
                    &mut *rng,
                );
                let category = coerce_category(
                    Some(fields.category.as_str()),
                    avoid_categories,
                    skipped,
                    &mut *rng,
                );
                Ok(Candidate {
                    title: fields.title,
                    description: fields.description,
                    category,
                    interactive_type,
                    duration_seconds: fields.duration_seconds,
                    used_fallback: false,
                })
            }
            Err(err @ DraftError::InvalidUpstreamResponse(_)) => {
                tracing::warn!("⚠️ Falling back to template nudge - user_id={}: {}", user_id, err);
                let template = fallback::pick(ctx, &mut *rng);
                Ok(Candidate {
                    title: template.title,
                    description: template.description,
                    category: template.category,
                    interactive_type: template.interactive_type,
                    duration_seconds: template.duration_seconds,
                    used_fallback: true,
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Generate, validate and persist one nudge for `user_id`.
    ///
    /// # Errors
    ///
    /// Store failures, LLM transport failures and drafts missing required
    /// fields. Unparseable model output is not an error.
    pub async fn generate(
        &self,
        database: &Database,
        user_id: &str,
        req: &GenerateNudgeRequest,
        now: DateTime<Utc>,
    ) -> anyhow::Result<GeneratedNudge> {
        let profile = database
            .get_user(user_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User profile not found"))?;
        let recent = database
            .recent_completions(user_id, RECENT_COMPLETIONS_LIMIT)
            .await?;
        let total = database.count_completions(user_id).await?;

        let local_now = now + Duration::minutes(i64::from(req.utc_offset_minutes.unwrap_or(0)));
        let ctx = PersonalizationContext::build(&profile, &recent, total, local_now.hour());

        let skipped = req
            .skip_category
            .as_deref()
            .and_then(|s| s.parse::<Category>().ok());
        let mut avoid_categories = ctx.avoid_categories().to_vec();
        if let Some(skipped) = skipped {
            if !avoid_categories.contains(&skipped) {
                avoid_categories.push(skipped);
            }
        }
        let avoid_types = ctx.avoid_types().to_vec();

        let response = self
            .driver
            .complete(prompt::build_prompt(&ctx, req))
            .await
            .context("Nudge generation request failed")?;

        let candidate = self.candidate_from(
            &response.text,
            &ctx,
            &avoid_categories,
            &avoid_types,
            skipped,
            user_id,
        )?;

        let nudge = database
            .insert_nudge(&NewNudge {
                title: truncate_chars(&candidate.title, MAX_TITLE_CHARS),
                description: truncate_chars(&candidate.description, MAX_DESCRIPTION_CHARS),
                category: candidate.category,
                interactive_type: candidate.interactive_type,
                is_ai_generated: true,
                duration_seconds: candidate.duration_seconds,
                created_by: Some(user_id.to_string()),
            })
            .await
            .context("Failed to store generated nudge")?;

        let message = if candidate.used_fallback {
            format!("Here's a little {} moment picked just for you", nudge.category)
        } else {
            format!("Here's a fresh {} nudge for your {}", nudge.category, ctx.time_of_day)
        };

        tracing::info!(
            "✨ Generated nudge - user_id={}, category={}, type={}, fallback={}",
            user_id,
            nudge.category,
            nudge.interactive_type,
            candidate.used_fallback
        );

        Ok(GeneratedNudge {
            nudge,
            message,
            personalization_used: PersonalizationUsed {
                engagement_level: ctx.engagement,
                time_of_day: ctx.time_of_day,
                streak_days: ctx.current_streak_days,
                avoided_categories: avoid_categories,
                avoided_types: avoid_types,
                mood: req.mood().to_string(),
                context: req.context.clone(),
                used_fallback: candidate.used_fallback,
            },
        })
    }
}
