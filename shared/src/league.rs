use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

pub type Points = u32;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    Default,
)]
#[cfg_attr(feature = "schema", derive(utoipa::ToSchema))]
pub enum League {
    #[default]
    Bronze,
    Silver,
    Gold,
    Platinum,
    Titanium,
    Diamond,
    Ruby,
    Wisdom,
}

impl League {
    /// Minimum amount of lifetime points required to be placed in the league.
    pub const fn threshold(&self) -> Points {
        match self {
            Self::Bronze => 0,
            Self::Silver => 100,
            Self::Gold => 250,
            Self::Platinum => 500,
            Self::Titanium => 750,
            Self::Diamond => 1000,
            Self::Ruby => 1500,
            Self::Wisdom => 2000,
        }
    }

    pub const fn next(&self) -> Option<Self> {
        match self {
            Self::Bronze => Some(Self::Silver),
            Self::Silver => Some(Self::Gold),
            Self::Gold => Some(Self::Platinum),
            Self::Platinum => Some(Self::Titanium),
            Self::Titanium => Some(Self::Diamond),
            Self::Diamond => Some(Self::Ruby),
            Self::Ruby => Some(Self::Wisdom),
            Self::Wisdom => None,
        }
    }

    /// Ascending ladder, lowest league first.
    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }

    /// Points still missing to reach the next league, `None` at the top of the ladder.
    pub fn points_to_next(&self, points: Points) -> Option<Points> {
        self.next()
            .map(|next| next.threshold().saturating_sub(points))
    }

    /// Progress inside the current league in percent (0..=100).
    pub fn progress(&self, points: Points) -> u32 {
        let Some(next) = self.next() else {
            return 100;
        };
        let span = next.threshold() - self.threshold();
        let done = points.saturating_sub(self.threshold()).min(span);
        done * 100 / span
    }
}

/// Resolves the league for a cumulative point total.
pub fn league_for(points: Points) -> League {
    League::iter()
        .rev()
        .find(|league| points >= league.threshold())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(utoipa::ToSchema))]
pub struct Promotion {
    pub from: League,
    pub to: League,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsChange {
    pub old_points: Points,
    pub new_points: Points,
    pub old_league: League,
    pub new_league: League,
}

impl PointsChange {
    pub fn apply(old_points: Points, delta: Points) -> Self {
        let new_points = old_points.saturating_add(delta);
        Self {
            old_points,
            new_points,
            old_league: league_for(old_points),
            new_league: league_for(new_points),
        }
    }

    pub fn promotion(&self) -> Option<Promotion> {
        (self.old_league != self.new_league).then_some(Promotion {
            from: self.old_league,
            to: self.new_league,
        })
    }
}

pub fn detect_promotion(old_points: Points, new_points: Points) -> Option<Promotion> {
    let from = league_for(old_points);
    let to = league_for(new_points);
    (from != to).then_some(Promotion { from, to })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_match_threshold_table() {
        assert_eq!(league_for(0), League::Bronze);
        assert_eq!(league_for(99), League::Bronze);
        assert_eq!(league_for(100), League::Silver);
        assert_eq!(league_for(249), League::Silver);
        assert_eq!(league_for(250), League::Gold);
        assert_eq!(league_for(500), League::Platinum);
        assert_eq!(league_for(750), League::Titanium);
        assert_eq!(league_for(999), League::Titanium);
        assert_eq!(league_for(1000), League::Diamond);
        assert_eq!(league_for(1500), League::Ruby);
        assert_eq!(league_for(1999), League::Ruby);
        assert_eq!(league_for(2000), League::Wisdom);
        assert_eq!(league_for(Points::MAX), League::Wisdom);
    }

    #[test]
    fn league_is_monotonic() {
        let mut previous = league_for(0);
        for points in 0..=2500 {
            let current = league_for(points);
            assert!(current >= previous, "{points} dropped to {current}");
            assert_eq!(current, league_for(points));
            previous = current;
        }
    }

    #[test]
    fn every_threshold_resolves_to_its_own_league() {
        for league in League::all() {
            assert_eq!(league_for(league.threshold()), league);
        }
    }

    #[test]
    fn promotion_bronze_to_silver() {
        let change = PointsChange::apply(95, 10);
        assert_eq!(change.new_points, 105);
        assert_eq!(
            change.promotion(),
            Some(Promotion {
                from: League::Bronze,
                to: League::Silver
            })
        );
    }

    #[test]
    fn no_promotion_at_the_top() {
        let change = PointsChange::apply(2000, 20);
        assert_eq!(change.new_league, League::Wisdom);
        assert_eq!(change.promotion(), None);
        assert_eq!(detect_promotion(2000, 5000), None);
    }

    #[test]
    fn promotion_iff_league_differs() {
        for old in (0..2100).step_by(7) {
            for delta in [1, 5, 8, 10, 12, 15, 20, 300] {
                let change = PointsChange::apply(old, delta);
                assert_eq!(
                    change.promotion().is_some(),
                    league_for(old) != league_for(old + delta)
                );
                assert_eq!(change.promotion(), detect_promotion(old, old + delta));
            }
        }
    }

    #[test]
    fn can_skip_several_leagues() {
        let change = PointsChange::apply(90, 500);
        assert_eq!(
            change.promotion(),
            Some(Promotion {
                from: League::Bronze,
                to: League::Platinum
            })
        );
    }

    #[test]
    fn progress_and_remaining_points() {
        assert_eq!(League::Bronze.points_to_next(95), Some(5));
        assert_eq!(League::Silver.progress(175), 50);
        assert_eq!(League::Bronze.progress(0), 0);
        assert_eq!(League::Wisdom.points_to_next(4000), None);
        assert_eq!(League::Wisdom.progress(2000), 100);
    }

    #[test]
    fn label_round_trips_through_strings() {
        assert_eq!(League::Titanium.to_string(), "Titanium");
        assert_eq!("Ruby".parse::<League>(), Ok(League::Ruby));
        assert!("Copper".parse::<League>().is_err());
    }
}
