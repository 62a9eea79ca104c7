//! Fallback nudges used when the model's output cannot be parsed.

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::domain::personalization::{PersonalizationContext, TimeOfDay};
use crate::domain::{Category, InteractiveType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackKind {
    Breathing,
    Movement,
    Gratitude,
    Reflection,
}

impl FallbackKind {
    pub const ALL: [Self; 4] = [Self::Breathing, Self::Movement, Self::Gratitude, Self::Reflection];
}

/// A complete nudge ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackNudge {
    pub kind: FallbackKind,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub interactive_type: InteractiveType,
    pub duration_seconds: Option<u32>,
}

fn greeting(ctx: &PersonalizationContext) -> String {
    match ctx.display_name {
        Some(ref name) => format!("{name}, "),
        None => String::new(),
    }
}

fn moment(time_of_day: TimeOfDay) -> &'static str {
    match time_of_day {
        TimeOfDay::Morning => "this morning",
        TimeOfDay::Afternoon => "this afternoon",
        TimeOfDay::Evening => "this evening",
        TimeOfDay::Night | TimeOfDay::LateNight => "tonight",
    }
}

/// Fill one template for this user.
pub fn render(kind: FallbackKind, ctx: &PersonalizationContext) -> FallbackNudge {
    let hi = greeting(ctx);
    let when = moment(ctx.time_of_day);

    match kind {
        FallbackKind::Breathing => FallbackNudge {
            kind,
            title: "A Calming Breath".into(),
            description: format!(
                "{hi}let's slow down together {when}. Breathe in for four, hold, and breathe out for four."
            ),
            category: Category::Mindfulness,
            interactive_type: InteractiveType::Breathing,
            duration_seconds: None,
        },
        FallbackKind::Movement => FallbackNudge {
            kind,
            title: "Gentle Stretch".into(),
            description: format!(
                "{hi}stand up, roll your shoulders and reach up high. One easy minute of movement {when}."
            ),
            category: Category::Movement,
            interactive_type: InteractiveType::Timed,
            duration_seconds: Some(60),
        },
        FallbackKind::Gratitude => FallbackNudge {
            kind,
            title: "Tiny Gratitude".into(),
            description: format!(
                "{hi}notice three small things around you {when} that you are glad are there."
            ),
            category: Category::Gratitude,
            interactive_type: InteractiveType::Observational,
            duration_seconds: None,
        },
        FallbackKind::Reflection => FallbackNudge {
            kind,
            title: "Check In With Yourself".into(),
            description: format!(
                "{hi}how are you really feeling {when}? Write a few honest words about it."
            ),
            category: Category::Reflection,
            interactive_type: InteractiveType::Reflective,
            duration_seconds: None,
        },
    }
}

/// Pick one of the templates at random.
pub fn pick<R: Rng + ?Sized>(ctx: &PersonalizationContext, rng: &mut R) -> FallbackNudge {
    let kind = FallbackKind::ALL
        .choose(rng)
        .copied()
        .unwrap_or(FallbackKind::Breathing);
    render(kind, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::personalization::EngagementTier;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn ctx(name: Option<&str>) -> PersonalizationContext {
        PersonalizationContext {
            display_name: name.map(str::to_string),
            current_streak_days: 0,
            longest_streak_days: 0,
            total_completions: 0,
            engagement: EngagementTier::NewUser,
            time_of_day: TimeOfDay::Night,
            recent_categories: Vec::new(),
            recent_types: Vec::new(),
        }
    }

    #[test]
    fn test_templates_are_personalized() {
        let nudge = render(FallbackKind::Gratitude, &ctx(Some("Mo")));
        assert!(nudge.description.starts_with("Mo, notice"));
        assert!(nudge.description.contains("tonight"));

        let anonymous = render(FallbackKind::Breathing, &ctx(None));
        assert!(anonymous.description.starts_with("let's slow down"));
    }

    #[test]
    fn test_every_template_is_generatable_and_short() {
        for kind in FallbackKind::ALL {
            let nudge = render(kind, &ctx(Some("A Very Long Display Name Indeed")));
            assert!(nudge.interactive_type.is_generatable());
            assert!(nudge.title.chars().count() <= 40);
            assert!(nudge.description.chars().count() <= 500);
        }
    }

    #[test]
    fn test_pick_covers_all_templates() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = Vec::new();
        for _ in 0..200 {
            let kind = pick(&ctx(None), &mut rng).kind;
            if !seen.contains(&kind) {
                seen.push(kind);
            }
        }
        assert_eq!(seen.len(), 4);
    }
}
