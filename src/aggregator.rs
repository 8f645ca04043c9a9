use crate::models::{CleanRecord, DailyAggregate, RollingPoint, WeeklyAggregate};
use crate::normalizer::week_start;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn daily(records: &[CleanRecord]) -> Vec<DailyAggregate> {
    let mut buckets: BTreeMap<(NaiveDate, &str), Vec<f64>> = BTreeMap::new();
    for record in records {
        buckets
            .entry((record.date, record.name.as_str()))
            .or_default()
            .push(record.quantity);
    }

    buckets
        .into_iter()
        .map(|((date, name), values)| DailyAggregate {
            date,
            name: name.to_string(),
            quantity: mean(&values),
        })
        .collect()
}

pub fn weekly(days: &[DailyAggregate]) -> Vec<WeeklyAggregate> {
    let mut buckets: BTreeMap<(NaiveDate, &str), Vec<f64>> = BTreeMap::new();
    for day in days {
        buckets
            .entry((week_start(day.date), day.name.as_str()))
            .or_default()
            .push(day.quantity);
    }

    buckets
        .into_iter()
        .map(|((week, name), values)| WeeklyAggregate {
            week,
            name: name.to_string(),
            quantity_avg: round2(mean(&values)),
        })
        .collect()
}

pub fn habits_descending(weeks: &[WeeklyAggregate]) -> Vec<String> {
    let names: BTreeSet<&str> = weeks.iter().map(|row| row.name.as_str()).collect();
    names.into_iter().rev().map(ToString::to_string).collect()
}

pub fn trailing_weeks(weeks: &[WeeklyAggregate], habit: &str, limit: usize) -> Vec<(NaiveDate, f64)> {
    let series: Vec<(NaiveDate, f64)> = weeks
        .iter()
        .filter(|row| row.name == habit)
        .map(|row| (row.week, row.quantity_avg))
        .collect();
    let skip = series.len().saturating_sub(limit);
    series.into_iter().skip(skip).collect()
}

// Trailing moving average over `window_weeks * 7` rows (current row included),
// computed per habit in date order. Early rows use whatever history exists.
pub fn rolling(records: &[CleanRecord], habit: &str, window_weeks: usize) -> Vec<RollingPoint> {
    let window = (window_weeks * 7).max(1);
    let mut rows: Vec<&CleanRecord> = records.iter().filter(|r| r.name == habit).collect();
    rows.sort_by_key(|r| r.date);

    let mut points = Vec::with_capacity(rows.len());
    let mut running = 0.0;
    for (index, row) in rows.iter().enumerate() {
        running += row.quantity;
        if index >= window {
            running -= rows[index - window].quantity;
        }
        let taken = (index + 1).min(window);
        points.push(RollingPoint {
            date: row.date,
            day: row.day.clone(),
            quantity: round2(row.quantity),
            moving_avg: round2(running / taken as f64),
        });
    }
    points
}

#[derive(Debug, Clone, PartialEq)]
pub struct HabitStats {
    pub habit: String,
    pub window_weeks: usize,
    pub latest_moving_avg: f64,
    pub overall_mean: f64,
    pub recent_mean: f64,
}

pub fn habit_stats(records: &[CleanRecord], habit: &str, window_weeks: usize) -> Option<HabitStats> {
    let points = rolling(records, habit, window_weeks);
    let latest = points.last()?;
    let quantities: Vec<f64> = points.iter().map(|p| p.quantity).collect();
    let recent_from = quantities.len().saturating_sub(window_weeks * 7);
    Some(HabitStats {
        habit: habit.to_string(),
        window_weeks,
        latest_moving_avg: latest.moving_avg,
        overall_mean: round2(mean(&quantities)),
        recent_mean: round2(mean(&quantities[recent_from..])),
    })
}
