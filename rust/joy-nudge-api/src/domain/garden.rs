//! Garden plants and achievements derived from activity counters.

use serde::Serialize;

use super::activity::ActivityStats;

/// A plant that grows in the garden once enough nudges are completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlantSpec {
    pub key: &'static str,
    pub name: &'static str,
    pub required_completions: u64,
}

/// Plants in unlock order.
pub const PLANTS: [PlantSpec; 9] = [
    PlantSpec { key: "seedling", name: "Seedling", required_completions: 1 },
    PlantSpec { key: "sprout", name: "Sprout", required_completions: 3 },
    PlantSpec { key: "clover", name: "Clover", required_completions: 7 },
    PlantSpec { key: "tulip", name: "Tulip", required_completions: 14 },
    PlantSpec { key: "sunflower", name: "Sunflower", required_completions: 21 },
    PlantSpec { key: "rose", name: "Rose", required_completions: 30 },
    PlantSpec { key: "cherry_blossom", name: "Cherry Blossom", required_completions: 50 },
    PlantSpec { key: "bonsai", name: "Bonsai", required_completions: 75 },
    PlantSpec { key: "tree", name: "Tree", required_completions: 100 },
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlantStatus {
    pub key: &'static str,
    pub name: &'static str,
    pub required_completions: u64,
    pub unlocked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GardenView {
    pub total_completions: u64,
    pub plants: Vec<PlantStatus>,
    /// Completions still needed for the next locked plant, if any.
    pub next_unlock_in: Option<u64>,
}

/// Unlock status of every plant for the given completion count.
pub fn garden_for(total_completions: u64) -> GardenView {
    let plants = PLANTS
        .iter()
        .map(|plant| PlantStatus {
            key: plant.key,
            name: plant.name,
            required_completions: plant.required_completions,
            unlocked: total_completions >= plant.required_completions,
        })
        .collect();

    let next_unlock_in = PLANTS
        .iter()
        .find(|plant| plant.required_completions > total_completions)
        .map(|plant| plant.required_completions - total_completions);

    GardenView {
        total_completions,
        plants,
        next_unlock_in,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Achievement {
    pub key: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub unlocked: bool,
    pub progress: u64,
    pub target: u64,
}

/// Evaluate every achievement against current counters.
pub fn achievements_for(stats: &ActivityStats, longest_streak_days: u32) -> Vec<Achievement> {
    let streak = u64::from(longest_streak_days);
    let rules: [(&str, &str, &str, u64, u64); 8] = [
        ("first_nudge", "First Step", "Complete your first nudge", stats.total_completions, 1),
        ("streak_3", "Warming Up", "Reach a 3-day streak", streak, 3),
        ("streak_7", "One Week Strong", "Reach a 7-day streak", streak, 7),
        ("streak_30", "Habit Formed", "Reach a 30-day streak", streak, 30),
        ("reflective_soul", "Reflective Soul", "Write 5 reflections", stats.reflections, 5),
        ("focus_master", "Focus Master", "Finish 10 focus sessions", stats.focus_sessions, 10),
        ("explorer", "Explorer", "Try nudges from 5 categories", stats.distinct_categories, 5),
        ("century", "Century", "Complete 100 nudges", stats.total_completions, 100),
    ];

    rules
        .into_iter()
        .map(|(key, title, description, progress, target)| Achievement {
            key,
            title,
            description,
            unlocked: progress >= target,
            progress: progress.min(target),
            target,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garden_unlocks_by_threshold() {
        let garden = garden_for(7);
        let unlocked: Vec<_> = garden
            .plants
            .iter()
            .filter(|p| p.unlocked)
            .map(|p| p.key)
            .collect();
        assert_eq!(unlocked, vec!["seedling", "sprout", "clover"]);
        assert_eq!(garden.next_unlock_in, Some(7));
    }

    #[test]
    fn test_empty_and_full_garden() {
        assert!(garden_for(0).plants.iter().all(|p| !p.unlocked));
        assert_eq!(garden_for(0).next_unlock_in, Some(1));

        let full = garden_for(250);
        assert!(full.plants.iter().all(|p| p.unlocked));
        assert_eq!(full.next_unlock_in, None);
    }

    #[test]
    fn test_achievements_progress_is_capped() {
        let stats = ActivityStats {
            total_completions: 12,
            reflections: 2,
            focus_sessions: 10,
            distinct_categories: 6,
        };
        let list = achievements_for(&stats, 8);
        let get = |key: &str| list.iter().find(|a| a.key == key).copied().unwrap();

        assert!(get("first_nudge").unlocked);
        assert!(get("streak_7").unlocked);
        assert!(!get("streak_30").unlocked);
        assert_eq!(get("reflective_soul").progress, 2);
        assert!(get("focus_master").unlocked);
        assert_eq!(get("explorer").progress, 5);
        assert!(!get("century").unlocked);
    }
}
