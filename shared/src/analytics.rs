use std::collections::HashMap;

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use super::*;

pub const DAILY_WINDOW_DAYS: u64 = 30;
pub const MONTHLY_WINDOW_MONTHS: u32 = 6;

pub const CO2_KG_PER_POINT: f64 = 0.1;
pub const WATER_LITERS_PER_POINT: f64 = 2.0;
pub const WASTE_KG_PER_POINT: f64 = 0.5;

/// Minimal view of a recorded action needed for aggregation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionEntry {
    pub kind: GreenAction,
    pub points: Points,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(utoipa::ToSchema))]
pub struct DailyProgress {
    pub date: NaiveDate,
    pub points: Points,
    pub actions: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(utoipa::ToSchema))]
pub struct ActionBreakdown {
    pub action: GreenAction,
    pub title: String,
    pub count: u32,
    pub points: Points,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(utoipa::ToSchema))]
pub struct MonthlyProgress {
    pub year: i32,
    pub month: u32,
    pub points: Points,
    pub actions: u32,
    pub co2_saved_kg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "schema", derive(utoipa::ToSchema))]
pub struct Impact {
    pub co2_saved_kg: f64,
    pub water_saved_liters: f64,
    pub waste_diverted_kg: f64,
}

impl Impact {
    pub fn from_points(points: Points) -> Self {
        let points = points as f64;
        Self {
            co2_saved_kg: points * CO2_KG_PER_POINT,
            water_saved_liters: points * WATER_LITERS_PER_POINT,
            waste_diverted_kg: points * WASTE_KG_PER_POINT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(utoipa::ToSchema))]
pub struct Analytics {
    pub total_actions: u32,
    pub total_points: Points,
    pub average_points_per_action: f64,
    pub streak: DailyStreak,
    /// Seven or more days in a row, counting today.
    pub weekly_streak: bool,
    pub impact: Impact,
    pub daily: Vec<DailyProgress>,
    pub breakdown: Vec<ActionBreakdown>,
    pub monthly: Vec<MonthlyProgress>,
}

impl Analytics {
    pub fn build(lifetime_points: Points, actions: &[ActionEntry], today: NaiveDate) -> Self {
        let total_actions = actions.len() as u32;
        let average_points_per_action = if total_actions > 0 {
            lifetime_points as f64 / total_actions as f64
        } else {
            0.0
        };

        let streak =
            DailyStreak::from_dates(actions.iter().map(|a| a.completed_at.date_naive()), today);

        Self {
            total_actions,
            total_points: lifetime_points,
            average_points_per_action,
            streak,
            weekly_streak: streak.is_weekly(),
            impact: Impact::from_points(lifetime_points),
            daily: daily_progress(actions, today),
            breakdown: breakdown(actions),
            monthly: monthly_progress(actions, today),
        }
    }
}

fn daily_progress(actions: &[ActionEntry], today: NaiveDate) -> Vec<DailyProgress> {
    let per_day: HashMap<NaiveDate, (Points, u32)> = actions
        .iter()
        .map(|a| (a.completed_at.date_naive(), a.points))
        .into_grouping_map()
        .fold((0, 0), |(points, count), _, p| (points + p, count + 1));

    (0..DAILY_WINDOW_DAYS)
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(back)))
        .map(|date| {
            let (points, actions) = per_day.get(&date).copied().unwrap_or_default();
            DailyProgress {
                date,
                points,
                actions,
            }
        })
        .collect()
}

fn breakdown(actions: &[ActionEntry]) -> Vec<ActionBreakdown> {
    let per_kind = actions.iter().into_group_map_by(|a| a.kind);

    GreenAction::iter()
        .filter_map(|kind| {
            let entries = per_kind.get(&kind)?;
            Some(ActionBreakdown {
                action: kind,
                title: kind.title().to_string(),
                count: entries.len() as u32,
                points: entries.iter().map(|a| a.points).sum(),
            })
        })
        .collect()
}

fn monthly_progress(actions: &[ActionEntry], today: NaiveDate) -> Vec<MonthlyProgress> {
    (0..MONTHLY_WINDOW_MONTHS)
        .rev()
        .filter_map(|back| today.checked_sub_months(Months::new(back)))
        .map(|date| {
            let (year, month) = (date.year(), date.month());
            let (points, count) = actions
                .iter()
                .filter(|a| {
                    let day = a.completed_at.date_naive();
                    day.year() == year && day.month() == month
                })
                .fold((0, 0), |(points, count), a| (points + a.points, count + 1));
            MonthlyProgress {
                year,
                month,
                points,
                actions: count,
                co2_saved_kg: points as f64 * CO2_KG_PER_POINT,
            }
        })
        .collect()
}
