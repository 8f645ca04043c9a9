use crate::errors::{AppError, AppResult};
use crate::models::{CleanRecord, RawRow};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

const DATE_FORMAT: &str = "%d %b %Y";

const MOOD_SCALE: &[(&str, i32)] = &[
    ("Very unpleasant", -3),
    ("Unpleasant", -2),
    ("Slightly unpleasant", -1),
    ("Neutral", 0),
    ("Slightly pleasant", 1),
    ("Pleasant", 2),
    ("Very pleasant", 3),
];

const ADMIN_HABITS: &[&str] = &["Mark habits", "Export habits"];

const UNIT_DIVISORS: &[(&str, f64)] = &[
    ("Track sleep", 60.0),
    ("Track screen", 60.0),
    ("Track steps", 1000.0),
];

pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

pub fn week_boundary(run_at: NaiveDateTime) -> NaiveDateTime {
    week_start(run_at.date()).and_time(NaiveTime::MIN)
}

pub fn mood_value(label: &str) -> Option<i32> {
    MOOD_SCALE
        .iter()
        .find(|(candidate, _)| *candidate == label)
        .map(|(_, value)| *value)
}

pub fn ensure_fresh(modified: NaiveDateTime, run_at: NaiveDateTime) -> AppResult<()> {
    let boundary = week_boundary(run_at);
    if modified < boundary {
        return Err(AppError::Stale {
            modified,
            week_start: boundary,
        });
    }
    Ok(())
}

pub fn normalize(rows: &[RawRow], run_at: NaiveDateTime) -> AppResult<Vec<CleanRecord>> {
    let cutoff = week_start(run_at.date());
    let mut records = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        let name = row.name.trim();
        if ADMIN_HABITS.contains(&name) {
            continue;
        }

        let date = NaiveDate::parse_from_str(row.date.trim(), DATE_FORMAT).map_err(|err| {
            AppError::Data(format!("Row {}: date '{}' is not '{}': {}", index + 1, row.date, DATE_FORMAT, err))
        })?;
        if date >= cutoff {
            continue;
        }

        let quantity = parse_quantity(&row.quantity).ok_or_else(|| {
            AppError::Data(format!(
                "Row {}: quantity '{}' for '{}' is neither numeric nor a mood label",
                index + 1,
                row.quantity,
                name
            ))
        })?;

        records.push(CleanRecord {
            date,
            day: date.format("%a").to_string(),
            name: name.to_string(),
            quantity: quantity / unit_divisor(name),
        });
    }

    tracing::info!(
        input = rows.len(),
        kept = records.len(),
        cutoff = %cutoff,
        "normalized habit rows"
    );
    Ok(records)
}

fn parse_quantity(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    match mood_value(raw) {
        Some(value) => Some(f64::from(value)),
        None => raw.parse::<f64>().ok().filter(|value| value.is_finite()),
    }
}

fn unit_divisor(name: &str) -> f64 {
    UNIT_DIVISORS
        .iter()
        .find(|(habit, _)| *habit == name)
        .map(|(_, divisor)| *divisor)
        .unwrap_or(1.0)
}

#[cfg(test)]
mod tests {
    use super::{ensure_fresh, mood_value, normalize, week_boundary, week_start, MOOD_SCALE};
    use crate::errors::AppError;
    use crate::models::RawRow;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(raw: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M").expect("timestamp")
    }

    #[test]
    fn week_start_is_monday() {
        let sunday = NaiveDate::from_ymd_opt(2024, 1, 21).expect("date");
        let monday = NaiveDate::from_ymd_opt(2024, 1, 15).expect("date");
        assert_eq!(week_start(sunday), monday);
        assert_eq!(week_start(monday), monday);
        assert_eq!(week_boundary(at("2024-01-17 09:30")), at("2024-01-15 00:00"));
    }

    #[test]
    fn mood_scale_is_bijective() {
        let mut values: Vec<i32> = MOOD_SCALE
            .iter()
            .map(|(label, _)| mood_value(label).expect("label"))
            .collect();
        values.sort_unstable();
        assert_eq!(values, vec![-3, -2, -1, 0, 1, 2, 3]);
        assert_eq!(mood_value("Ecstatic"), None);
    }

    #[test]
    fn converts_units_and_moods() {
        let rows = vec![
            RawRow::new("15 Jan 2024", "Track sleep", "480"),
            RawRow::new("15 Jan 2024", "Daily mood", "Very pleasant"),
            RawRow::new("15 Jan 2024", "Track steps", "12500"),
            RawRow::new("15 Jan 2024", "Read", "1"),
            RawRow::new("15 Jan 2024", "Weight", "72.4"),
        ];
        let records = normalize(&rows, at("2024-01-24 08:00")).expect("normalize");
        let quantities: Vec<f64> = records.iter().map(|r| r.quantity).collect();
        assert_eq!(quantities, vec![8.0, 3.0, 12.5, 1.0, 72.4]);
        assert_eq!(records[0].day, "Mon");
    }

    #[test]
    fn drops_admin_rows_and_current_week() {
        let rows = vec![
            RawRow::new("14 Jan 2024", "Mark habits", "1"),
            RawRow::new("14 Jan 2024", "Export habits", "1"),
            RawRow::new("14 Jan 2024", "Read", "1"),
            RawRow::new("22 Jan 2024", "Read", "1"),
            RawRow::new("21 Jan 2024", "Read", "0"),
        ];
        let records = normalize(&rows, at("2024-01-22 00:00")).expect("normalize");
        let dates: Vec<String> = records.iter().map(|r| r.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-01-14", "2024-01-21"]);
    }

    #[test]
    fn rejects_unknown_quantity() {
        let rows = vec![RawRow::new("15 Jan 2024", "Daily mood", "Meh")];
        let err = normalize(&rows, at("2024-01-24 08:00")).expect_err("bad quantity");
        assert!(matches!(err, AppError::Data(_)));
    }

    #[test]
    fn freshness_guard_uses_monday_midnight() {
        let run_at = at("2024-01-17 12:00");
        assert!(ensure_fresh(at("2024-01-15 00:00"), run_at).is_ok());
        let err = ensure_fresh(at("2024-01-14 23:59"), run_at).expect_err("stale");
        assert!(matches!(err, AppError::Stale { .. }));
    }
}
