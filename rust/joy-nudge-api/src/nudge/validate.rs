//! Coercion of draft values into the valid enum sets, and length limits.

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::domain::{Category, InteractiveType};

pub const MAX_TITLE_CHARS: usize = 100;
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// Used when every generatable type is on the avoid list.
const DEFAULT_INTERACTIVE_TYPE: InteractiveType = InteractiveType::Observational;
/// Used when every category is on the avoid list.
const DEFAULT_CATEGORY: Category = Category::Mindfulness;

/// A generatable type from `raw`, else a random one not in `avoid`.
pub fn coerce_interactive_type<R: Rng + ?Sized>(
    raw: Option<&str>,
    avoid: &[InteractiveType],
    rng: &mut R,
) -> InteractiveType {
    if let Some(kind) = raw
        .and_then(|s| s.parse::<InteractiveType>().ok())
        .filter(InteractiveType::is_generatable)
    {
        return kind;
    }

    let candidates: Vec<_> = InteractiveType::GENERATABLE
        .into_iter()
        .filter(|t| !avoid.contains(t))
        .collect();
    candidates
        .choose(rng)
        .copied()
        .unwrap_or(DEFAULT_INTERACTIVE_TYPE)
}

/// A category from `raw` unless it was just skipped; otherwise a random one
/// outside `avoid`.
pub fn coerce_category<R: Rng + ?Sized>(
    raw: Option<&str>,
    avoid: &[Category],
    skipped: Option<Category>,
    rng: &mut R,
) -> Category {
    if let Some(category) = raw
        .and_then(|s| s.parse::<Category>().ok())
        .filter(|c| Some(*c) != skipped)
    {
        return category;
    }

    let candidates: Vec<_> = Category::ALL
        .into_iter()
        .filter(|c| !avoid.contains(c) && Some(*c) != skipped)
        .collect();
    candidates.choose(rng).copied().unwrap_or(DEFAULT_CATEGORY)
}

/// Trim and cut to at most `max` characters.
pub fn truncate_chars(value: &str, max: usize) -> String {
    let trimmed = value.trim();
    match trimmed.char_indices().nth(max) {
        Some((byte_idx, _)) => trimmed[..byte_idx].trim_end().to_string(),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_valid_type_is_kept_case_insensitively() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            coerce_interactive_type(Some("reflective"), &[InteractiveType::Reflective], &mut rng),
            InteractiveType::Reflective
        );
    }

    #[test]
    fn test_invalid_type_avoids_recent() {
        let mut rng = StdRng::seed_from_u64(2);
        let avoid = [InteractiveType::Breathing, InteractiveType::Timed];
        for raw in [Some("DANCE"), Some("NONE"), None] {
            for _ in 0..50 {
                let kind = coerce_interactive_type(raw, &avoid, &mut rng);
                assert!(kind.is_generatable());
                assert!(!avoid.contains(&kind));
            }
        }
    }

    #[test]
    fn test_invalid_type_with_everything_avoided_is_observational() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(
            coerce_interactive_type(Some("juggling"), &InteractiveType::GENERATABLE, &mut rng),
            InteractiveType::Observational
        );
    }

    #[test]
    fn test_category_coercion() {
        let mut rng = StdRng::seed_from_u64(4);
        assert_eq!(
            coerce_category(Some("self care"), &[], None, &mut rng),
            Category::SelfCare
        );

        for _ in 0..50 {
            let c = coerce_category(
                Some("Productivity"),
                &[Category::Movement, Category::Gratitude],
                Some(Category::Connection),
                &mut rng,
            );
            assert!(![Category::Movement, Category::Gratitude, Category::Connection].contains(&c));
        }

        assert_ne!(
            coerce_category(Some("Movement"), &[], Some(Category::Movement), &mut rng),
            Category::Movement
        );
        assert_eq!(
            coerce_category(None, &Category::ALL, None, &mut rng),
            Category::Mindfulness
        );
    }

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate_chars("  hello  ", 10), "hello");
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo");
        let long = "🌱".repeat(150);
        assert_eq!(truncate_chars(&long, MAX_TITLE_CHARS).chars().count(), 100);
    }
}
