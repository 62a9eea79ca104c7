//! Prompt construction.

use std::fmt::Write;

use super::GenerateNudgeRequest;
use crate::domain::personalization::{EngagementTier, PersonalizationContext, TimeOfDay};
use crate::domain::{Category, InteractiveType};
use crate::llm::LlmRequest;

const PERSONA: &str = "You are Joy, a warm and encouraging wellness companion. \
You write tiny, doable self-care activities (\"nudges\") that take one to five minutes. \
Your tone is gentle, playful and never preachy. You never give medical advice.";

/// Guidance for a free-form mood string.
pub fn mood_guidance(mood: &str) -> &'static str {
    let mood = mood.to_ascii_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| mood.contains(w));

    if has(&["stress", "anxious", "anxiety", "overwhelm", "nervous", "worried"]) {
        "The user feels stressed. Offer something calming and grounding, such as slow breathing or a body scan."
    } else if has(&["tired", "exhausted", "sleepy", "drained", "low energy"]) {
        "The user feels tired. Offer something gentle that restores energy without demanding effort."
    } else if has(&["sad", "down", "lonely", "blue", "upset"]) {
        "The user feels low. Offer something comforting and self-compassionate, or a small way to connect with someone."
    } else if has(&["happy", "joy", "great", "excited", "good"]) {
        "The user feels good. Help them savour the moment, perhaps through gratitude or creativity."
    } else if has(&["restless", "bored", "fidget", "antsy"]) {
        "The user feels restless. Offer something active or creative to channel that energy."
    } else {
        "The user is open to anything. Surprise them with something delightful."
    }
}

fn engagement_guidance(tier: EngagementTier) -> &'static str {
    match tier {
        EngagementTier::NewUser => {
            "They are new to Joy Nudge: keep it very simple, short and welcoming."
        }
        EngagementTier::Developing => {
            "They are building a habit: offer a little more depth than a beginner activity."
        }
        EngagementTier::Consistent => {
            "They practise regularly: offer something fresh and slightly more challenging."
        }
    }
}

fn time_guidance(time_of_day: TimeOfDay) -> &'static str {
    match time_of_day {
        TimeOfDay::Morning => "It is morning: favour activities that set a positive tone for the day.",
        TimeOfDay::Afternoon => "It is afternoon: favour a refreshing mid-day reset.",
        TimeOfDay::Evening => "It is evening: favour winding down and reflecting on the day.",
        TimeOfDay::Night => "It is night: favour calm, screen-light activities that prepare for sleep.",
        TimeOfDay::LateNight => {
            "It is very late: keep it extremely gentle and restful, nothing energising."
        }
    }
}

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Build the single-turn request for one generation.
pub fn build_prompt(ctx: &PersonalizationContext, req: &GenerateNudgeRequest) -> LlmRequest {
    let mut prompt = String::with_capacity(2048);

    let _ = writeln!(prompt, "## About the user");
    if let Some(ref name) = ctx.display_name {
        let _ = writeln!(prompt, "- Name: {name}");
    }
    let _ = writeln!(
        prompt,
        "- Current streak: {} day(s) (longest {})",
        ctx.current_streak_days, ctx.longest_streak_days
    );
    let _ = writeln!(
        prompt,
        "- Completed nudges: {} ({})",
        ctx.total_completions, ctx.engagement
    );
    let _ = writeln!(prompt, "- Time of day: {}", ctx.time_of_day);
    let _ = writeln!(prompt, "- Current mood: {}", req.mood());
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "## Guidance");
    let _ = writeln!(prompt, "- {}", engagement_guidance(ctx.engagement));
    let _ = writeln!(prompt, "- {}", time_guidance(ctx.time_of_day));
    let _ = writeln!(prompt, "- {}", mood_guidance(req.mood()));

    let avoid_categories = ctx.avoid_categories();
    let avoid_types = ctx.avoid_types();
    if !avoid_categories.is_empty() || !avoid_types.is_empty() {
        let _ = writeln!(prompt);
        let _ = writeln!(prompt, "## Variety");
        if !avoid_categories.is_empty() {
            let _ = writeln!(
                prompt,
                "- They recently did {} nudges; choose a different category.",
                join(avoid_categories)
            );
        }
        if !avoid_types.is_empty() {
            let _ = writeln!(
                prompt,
                "- They recently did {} activities; choose a different interactive_type.",
                join(avoid_types)
            );
        }
    }

    let mut hints = Vec::new();
    if let Some(category) = req.requested_category.as_deref().filter(|s| !s.trim().is_empty()) {
        hints.push(format!("They asked for the category \"{}\".", category.trim()));
    }
    if let Some(kind) = req
        .requested_interactive_type
        .as_deref()
        .filter(|s| !s.trim().is_empty())
    {
        hints.push(format!("They asked for the interactive_type \"{}\".", kind.trim()));
    }
    if req.is_skip() {
        match req.skip_category.as_deref() {
            Some(skipped) => hints.push(format!(
                "They just skipped a {skipped} nudge. Offer something clearly different."
            )),
            None => hints.push("They just skipped a nudge. Offer something clearly different.".into()),
        }
    } else if let Some(context) = req.context.as_deref().filter(|s| !s.trim().is_empty()) {
        hints.push(format!("Additional context: {}", context.trim()));
    }
    if !hints.is_empty() {
        let _ = writeln!(prompt);
        let _ = writeln!(prompt, "## Request");
        for hint in hints {
            let _ = writeln!(prompt, "- {hint}");
        }
    }

    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "## Output");
    let _ = writeln!(
        prompt,
        "Respond with ONLY a JSON object, no prose and no markdown, with these fields:"
    );
    let _ = writeln!(prompt, "- \"title\": string, at most 40 characters");
    let _ = writeln!(prompt, "- \"description\": string, at most 160 characters, one or two sentences");
    let _ = writeln!(prompt, "- \"category\": one of {}", join(&Category::ALL));
    let _ = writeln!(
        prompt,
        "- \"interactive_type\": one of {}",
        join(&InteractiveType::GENERATABLE)
    );
    let _ = writeln!(
        prompt,
        "- \"duration_seconds\": optional integer, only for TIMED activities"
    );

    LlmRequest::new(prompt).with_system(PERSONA)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::personalization::PersonalizationContext;

    fn ctx() -> PersonalizationContext {
        PersonalizationContext {
            display_name: Some("Ada".into()),
            current_streak_days: 4,
            longest_streak_days: 9,
            total_completions: 12,
            engagement: EngagementTier::Developing,
            time_of_day: TimeOfDay::Evening,
            recent_categories: vec![Category::Movement, Category::Gratitude, Category::Creativity],
            recent_types: vec![InteractiveType::Timed],
        }
    }

    #[test]
    fn test_prompt_carries_personalization_and_variety() {
        let req = GenerateNudgeRequest {
            current_mood: "Stressed out".into(),
            ..Default::default()
        };
        let llm = build_prompt(&ctx(), &req);

        assert!(llm.system.as_deref().unwrap().contains("Joy"));
        assert!(llm.prompt.contains("Name: Ada"));
        assert!(llm.prompt.contains("4 day(s)"));
        assert!(llm.prompt.contains("developing"));
        assert!(llm.prompt.contains("evening"));
        assert!(llm.prompt.contains("Movement, Gratitude nudges"));
        assert!(!llm.prompt.contains("Creativity nudges"));
        assert!(llm.prompt.contains("TIMED activities"));
        assert!(llm.prompt.contains("calming"));
        assert!(llm.prompt.contains("Self-Care"));
    }

    #[test]
    fn test_skip_context_mentions_skipped_category() {
        let req = GenerateNudgeRequest {
            context: Some(super::super::SKIPPED_CONTEXT.into()),
            skip_category: Some("Movement".into()),
            ..Default::default()
        };
        let llm = build_prompt(&ctx(), &req);
        assert!(llm.prompt.contains("just skipped a Movement nudge"));
    }

    #[test]
    fn test_mood_guidance_defaults_to_open() {
        assert!(mood_guidance("open").contains("open to anything"));
        assert!(mood_guidance("TIRED").contains("tired"));
    }
}
