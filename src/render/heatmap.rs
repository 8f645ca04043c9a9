use crate::models::DailyAggregate;
use crate::normalizer::week_start;
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};

pub const HEATMAP_FILE: &str = "heatmap.png";
pub const HEATMAP_WEEKS: usize = 8;

const EXCLUDED_TOKEN: &str = "Track";
const COMPLETION_RANGE: std::ops::RangeInclusive<f64> = 0.0..=1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct HeatCell {
    pub week: usize,
    pub weekday: u32,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap {
    pub weeks: Vec<NaiveDate>,
    pub cells: Vec<HeatCell>,
}

pub fn build_heatmap(days: &[DailyAggregate], last_week: NaiveDate, weeks: usize) -> Option<Heatmap> {
    let last_week = week_start(last_week);
    let first_week = last_week - Duration::weeks(weeks.saturating_sub(1) as i64);

    // Any value outside 0..=1 anywhere in the history (mood scores, counts) marks a scaled habit.
    let scaled: BTreeSet<&str> = days
        .iter()
        .filter(|day| !COMPLETION_RANGE.contains(&day.quantity))
        .map(|day| day.name.as_str())
        .collect();

    let mut per_day: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for day in days {
        let token = day.name.split_whitespace().next().unwrap_or_default();
        if token == EXCLUDED_TOKEN || scaled.contains(day.name.as_str()) {
            continue;
        }
        if day.date < first_week || week_start(day.date) > last_week {
            continue;
        }
        per_day.entry(day.date).or_default().push(day.quantity);
    }
    if per_day.is_empty() {
        return None;
    }

    let cells = per_day
        .into_iter()
        .map(|(date, values)| {
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            HeatCell {
                week: ((week_start(date) - first_week).num_days() / 7) as usize,
                weekday: date.weekday().num_days_from_monday(),
                value: mean,
            }
        })
        .collect();

    Some(Heatmap {
        weeks: (0..weeks).map(|i| first_week + Duration::weeks(i as i64)).collect(),
        cells,
    })
}

#[cfg(test)]
mod tests {
    use super::build_heatmap;
    use crate::models::DailyAggregate;
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32, name: &str, quantity: f64) -> DailyAggregate {
        DailyAggregate {
            date: NaiveDate::from_ymd_opt(y, m, d).expect("date"),
            name: name.to_string(),
            quantity,
        }
    }

    #[test]
    fn averages_binary_habits_per_day() {
        let days = vec![
            day(2024, 1, 15, "Read", 1.0),
            day(2024, 1, 15, "No alcohol", 0.0),
            day(2024, 1, 15, "Track sleep", 7.5),
            day(2024, 1, 21, "Read", 1.0),
            day(2023, 10, 2, "Read", 1.0),
        ];
        let last_week = NaiveDate::from_ymd_opt(2024, 1, 15).expect("date");
        let heatmap = build_heatmap(&days, last_week, 2).expect("heatmap");

        assert_eq!(heatmap.weeks.len(), 2);
        assert_eq!(heatmap.cells.len(), 2);
        assert_eq!(heatmap.cells[0].week, 1);
        assert_eq!(heatmap.cells[0].weekday, 0);
        assert_eq!(heatmap.cells[0].value, 0.5);
        assert_eq!(heatmap.cells[1].weekday, 6);
    }

    #[test]
    fn only_track_habits_yield_nothing() {
        let days = vec![day(2024, 1, 15, "Track sleep", 7.5)];
        let last_week = NaiveDate::from_ymd_opt(2024, 1, 15).expect("date");
        assert!(build_heatmap(&days, last_week, 8).is_none());
    }

    #[test]
    fn mood_scores_are_not_completion() {
        let days = vec![
            day(2024, 1, 8, "Daily mood", -1.0),
            day(2024, 1, 15, "Daily mood", 1.0),
            day(2024, 1, 15, "Read", 0.0),
            day(2024, 1, 16, "Daily mood", 1.0),
        ];
        let last_week = NaiveDate::from_ymd_opt(2024, 1, 15).expect("date");
        let heatmap = build_heatmap(&days, last_week, 2).expect("heatmap");

        assert_eq!(heatmap.cells.len(), 1);
        assert_eq!(heatmap.cells[0].weekday, 0);
        assert_eq!(heatmap.cells[0].value, 0.0);
    }
}
