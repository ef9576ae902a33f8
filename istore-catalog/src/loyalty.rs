use istore_shared::{LevelRule, Profile};
use serde::{Deserialize, Serialize};

/// The loyalty tiers, ordered by ascending level.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LevelTable {
    rules: Vec<LevelRule>,
}

/// Whether a viewer gets to see prices, and at which discount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriceVisibility {
    /// Anonymous visitor: no price is shown at all.
    Hidden,
    Visible { discount_percent: f64 },
}

impl PriceVisibility {
    pub fn is_visible(&self) -> bool {
        matches!(self, PriceVisibility::Visible { .. })
    }

    /// Discount applied to messages that are built even when prices are hidden.
    pub fn discount_or_zero(&self) -> f64 {
        match self {
            PriceVisibility::Hidden => 0.0,
            PriceVisibility::Visible { discount_percent } => *discount_percent,
        }
    }
}

/// Where a customer stands relative to the next tier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LevelProgress {
    pub current: Option<LevelRule>,
    pub next: Option<LevelRule>,
    /// Widened so thresholds and balances at the ends of `i32` cannot overflow.
    pub points_to_next: i64,
    pub progress_percent: f64,
}

impl LevelTable {
    pub fn new(mut rules: Vec<LevelRule>) -> Self {
        rules.sort_by_key(|r| r.level);
        Self { rules }
    }

    pub fn rules(&self) -> &[LevelRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rule_for(&self, level: i32) -> Option<&LevelRule> {
        self.rules.iter().find(|r| r.level == level)
    }

    pub fn next_rule(&self, level: i32) -> Option<&LevelRule> {
        self.rule_for(level + 1)
    }

    /// Discount of `level`, or 0 when no rule is configured for it.
    pub fn discount_for(&self, level: i32) -> f64 {
        self.rule_for(level).map(|r| r.discount_percent).unwrap_or(0.0)
    }

    /// Resolves the discount for a viewer. An admin's simulated level wins over
    /// the viewer's own; with neither, prices stay hidden.
    pub fn resolve(&self, user_level: Option<i32>, view_as_level: Option<i32>) -> PriceVisibility {
        match view_as_level.or(user_level) {
            Some(level) => PriceVisibility::Visible { discount_percent: self.discount_for(level) },
            None => PriceVisibility::Hidden,
        }
    }

    /// Level earned by `points`: the highest level whose threshold is reached,
    /// or the lowest configured level when none is. `None` with an empty table.
    pub fn level_for_points(&self, points: i32) -> Option<i32> {
        let reached = self
            .rules
            .iter()
            .filter(|r| r.min_points <= points)
            .map(|r| r.level)
            .max();

        reached.or_else(|| self.rules.first().map(|r| r.level))
    }

    pub fn progress(&self, profile: &Profile) -> LevelProgress {
        let current = self.rule_for(profile.level).cloned();
        let next = self.next_rule(profile.level).cloned();

        let (points_to_next, progress_percent) = match &next {
            Some(next) => {
                let ratio = if next.min_points > 0 {
                    profile.points as f64 / next.min_points as f64 * 100.0
                } else {
                    100.0
                };
                (
                    i64::from(next.min_points) - i64::from(profile.points),
                    ratio.clamp(0.0, 100.0),
                )
            }
            None => (0, 100.0),
        };

        LevelProgress { current, next, points_to_next, progress_percent }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use istore_shared::UserRole;
    use uuid::Uuid;

    fn rule(level: i32, min_points: i32, discount_percent: f64) -> LevelRule {
        LevelRule {
            level,
            min_points,
            discount_percent,
            benefits_text: format!("Nivel {}", level),
        }
    }

    fn table() -> LevelTable {
        LevelTable::new(vec![rule(3, 1500, 10.0), rule(1, 0, 0.0), rule(2, 500, 5.0)])
    }

    fn profile(points: i32, level: i32) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            full_name: "ana".to_string(),
            email: "ana@example.com".to_string(),
            points,
            level,
            role: UserRole::User,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_rules_sorted_by_level() {
        let levels: Vec<i32> = table().rules().iter().map(|r| r.level).collect();
        assert_eq!(levels, vec![1, 2, 3]);
    }

    #[test]
    fn test_anonymous_viewer_sees_no_price() {
        let table = table();
        assert_eq!(table.resolve(None, None), PriceVisibility::Hidden);
        assert!(!table.resolve(None, None).is_visible());
        assert_eq!(table.resolve(None, None).discount_or_zero(), 0.0);
    }

    #[test]
    fn test_override_wins_over_user_level() {
        let table = table();
        assert_eq!(table.resolve(Some(1), Some(3)), PriceVisibility::Visible { discount_percent: 10.0 });
        assert_eq!(table.resolve(None, Some(2)), PriceVisibility::Visible { discount_percent: 5.0 });
        assert_eq!(table.resolve(Some(2), None), PriceVisibility::Visible { discount_percent: 5.0 });
    }

    #[test]
    fn test_unknown_level_is_visible_at_zero() {
        assert_eq!(table().resolve(Some(9), None), PriceVisibility::Visible { discount_percent: 0.0 });
    }

    #[test]
    fn test_level_for_points() {
        let table = table();
        assert_eq!(table.level_for_points(0), Some(1));
        assert_eq!(table.level_for_points(499), Some(1));
        assert_eq!(table.level_for_points(500), Some(2));
        assert_eq!(table.level_for_points(10_000), Some(3));
        assert_eq!(table.level_for_points(-20), Some(1));
        assert_eq!(LevelTable::default().level_for_points(100), None);
    }

    #[test]
    fn test_progress_towards_next_level() {
        let progress = table().progress(&profile(250, 1));
        assert_eq!(progress.current.as_ref().map(|r| r.level), Some(1));
        assert_eq!(progress.next.as_ref().map(|r| r.level), Some(2));
        assert_eq!(progress.points_to_next, 250);
        assert!((progress.progress_percent - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_progress_at_top_level() {
        let progress = table().progress(&profile(4000, 3));
        assert!(progress.next.is_none());
        assert_eq!(progress.points_to_next, 0);
        assert_eq!(progress.progress_percent, 100.0);
    }

    #[test]
    fn test_progress_is_capped() {
        // Points above the next threshold while the stored level lags behind.
        let progress = table().progress(&profile(900, 1));
        assert_eq!(progress.progress_percent, 100.0);
        assert_eq!(progress.points_to_next, -400);
    }

    #[test]
    fn test_progress_with_extreme_balances() {
        let table = LevelTable::new(vec![rule(1, 0, 0.0), rule(2, 2_000_000_000, 10.0)]);

        let progress = table.progress(&profile(-200_000_000, 1));
        assert_eq!(progress.points_to_next, 2_200_000_000);
        assert_eq!(progress.progress_percent, 0.0);

        let table = LevelTable::new(vec![rule(1, 0, 0.0), rule(2, i32::MAX, 10.0)]);
        let progress = table.progress(&profile(i32::MIN, 1));
        assert_eq!(progress.points_to_next, i64::from(i32::MAX) - i64::from(i32::MIN));
    }
}
