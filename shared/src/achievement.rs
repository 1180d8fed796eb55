use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::*;

pub type AchievementId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Requirement {
    Points(Points),
    League(League),
    ActionCount(u32),
}

impl Requirement {
    pub fn is_satisfied(&self, snapshot: &ProgressSnapshot) -> bool {
        match self {
            Self::Points(points) => snapshot.points >= *points,
            Self::League(league) => snapshot.league >= *league,
            Self::ActionCount(count) => snapshot.actions_count >= *count,
        }
    }

    // Order in which requirement kinds are scanned when only the first match is awarded.
    const fn scan_order(&self) -> u8 {
        match self {
            Self::League(_) => 0,
            Self::Points(_) => 1,
            Self::ActionCount(_) => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AchievementDefinition {
    pub id: AchievementId,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub requirement: Requirement,
    pub points_reward: Points,
}

pub const ACHIEVEMENTS: [AchievementDefinition; 6] = [
    AchievementDefinition {
        id: 1,
        name: "First Steps",
        description: "Complete your first green action",
        icon: "Leaf",
        requirement: Requirement::ActionCount(1),
        points_reward: 10,
    },
    AchievementDefinition {
        id: 2,
        name: "League Climber",
        description: "Reach Silver League",
        icon: "Trophy",
        requirement: Requirement::League(League::Silver),
        points_reward: 25,
    },
    AchievementDefinition {
        id: 3,
        name: "Point Master",
        description: "Earn 100 total points",
        icon: "Trophy",
        requirement: Requirement::Points(100),
        points_reward: 20,
    },
    AchievementDefinition {
        id: 4,
        name: "Gold Standard",
        description: "Reach Gold League",
        icon: "Trophy",
        requirement: Requirement::League(League::Gold),
        points_reward: 50,
    },
    AchievementDefinition {
        id: 5,
        name: "Eco Warrior",
        description: "Earn 500 total points",
        icon: "Trophy",
        requirement: Requirement::Points(500),
        points_reward: 75,
    },
    AchievementDefinition {
        id: 6,
        name: "Platinum Elite",
        description: "Reach Platinum League",
        icon: "Trophy",
        requirement: Requirement::League(League::Platinum),
        points_reward: 100,
    },
];

pub fn achievement(id: AchievementId) -> Option<&'static AchievementDefinition> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}

/// Counters an achievement requirement is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressSnapshot {
    pub points: Points,
    pub league: League,
    pub actions_count: u32,
}

impl ProgressSnapshot {
    pub fn new(points: Points, actions_count: u32) -> Self {
        Self {
            points,
            league: league_for(points),
            actions_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AwardPolicy {
    /// Award only the first newly satisfied achievement per triggering action.
    FirstMatch,
    /// Award every newly satisfied achievement at once.
    #[default]
    AllEligible,
}

/// Selects the definitions that are satisfied by `snapshot` and not yet earned.
pub fn newly_eligible<'a>(
    catalog: &'a [AchievementDefinition],
    snapshot: &ProgressSnapshot,
    earned: &HashSet<AchievementId>,
    policy: AwardPolicy,
) -> Vec<&'a AchievementDefinition> {
    let mut eligible: Vec<_> = catalog
        .iter()
        .filter(|a| !earned.contains(&a.id))
        .filter(|a| a.requirement.is_satisfied(snapshot))
        .collect();

    match policy {
        AwardPolicy::AllEligible => eligible,
        AwardPolicy::FirstMatch => {
            // Stable sort keeps catalog order inside each requirement kind.
            eligible.sort_by_key(|a| a.requirement.scan_order());
            eligible.truncate(1);
            eligible
        }
    }
}
