use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Consecutive days with at least one green action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "schema", derive(utoipa::ToSchema))]
pub struct DailyStreak {
    pub current: u32,
    pub best: u32,
}

impl DailyStreak {
    /// An empty `today` does not break the current streak until the day is over.
    pub fn from_dates(dates: impl IntoIterator<Item = NaiveDate>, today: NaiveDate) -> Self {
        let days: BTreeSet<NaiveDate> = dates.into_iter().filter(|d| *d <= today).collect();

        let mut current = 0;
        let mut day = if days.contains(&today) {
            Some(today)
        } else {
            today.pred_opt()
        };
        while let Some(d) = day.filter(|d| days.contains(d)) {
            current += 1;
            day = d.pred_opt();
        }

        let mut best = 0;
        let mut run = 0;
        let mut previous: Option<NaiveDate> = None;
        for day in &days {
            run = match previous.and_then(|p| p.succ_opt()) {
                Some(expected) if expected == *day => run + 1,
                _ => 1,
            };
            best = best.max(run);
            previous = Some(*day);
        }

        Self { current, best }
    }

    pub fn is_weekly(&self) -> bool {
        self.current >= 7
    }
}
