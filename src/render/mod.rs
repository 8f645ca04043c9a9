pub mod heatmap;
pub mod plotters_canvas;

use crate::errors::{AppError, AppResult};
use crate::models::HabitTile;
use crate::policy::{DeltaMode, MetricPolicy, NumberFormat};
use chrono::{Datelike, NaiveDate, Weekday};
use std::path::{Path, PathBuf};

pub use heatmap::Heatmap;
pub use plotters_canvas::PlottersCanvas;

pub const TILE_EXTENSION: &str = "png";
const GRIDLINE_WEEKDAY: Weekday = Weekday::Mon;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Favorable,
    Unfavorable,
    Neutral,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeltaReading {
    pub text: String,
    pub direction: Direction,
    pub tone: Tone,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileSpec {
    pub title: String,
    pub weeks: Vec<NaiveDate>,
    pub trend: Vec<f64>,
    pub value_text: String,
    pub delta: DeltaReading,
    pub format: NumberFormat,
    pub y_range: (f64, f64),
    pub gridlines: Vec<NaiveDate>,
}

pub trait TileCanvas {
    fn draw_tile(&self, spec: &TileSpec, path: &Path) -> AppResult<()>;
    fn draw_heatmap(&self, heatmap: &Heatmap, path: &Path) -> AppResult<()>;
}

pub fn tile_file_name(habit: &str) -> String {
    let safe: String = habit
        .chars()
        .map(|ch| if matches!(ch, '/' | '\\' | '\0') { '-' } else { ch })
        .collect();
    format!("{}.{}", safe, TILE_EXTENSION)
}

pub fn delta_reading(current: f64, previous: f64, policy: &MetricPolicy) -> DeltaReading {
    let difference = current - previous;
    let direction = if difference > 0.0 {
        Direction::Up
    } else if difference < 0.0 {
        Direction::Down
    } else {
        Direction::Flat
    };

    let tone = match (direction, policy.inverted) {
        (Direction::Flat, _) => Tone::Neutral,
        (Direction::Up, false) | (Direction::Down, true) => Tone::Favorable,
        (Direction::Up, true) | (Direction::Down, false) => Tone::Unfavorable,
    };

    // A zero reference has no relative change; fall back to the plain difference.
    let text = match policy.delta {
        DeltaMode::Relative if previous != 0.0 => {
            NumberFormat::Percent { places: 0 }.format_signed(difference / previous.abs())
        }
        _ => policy.format.format_signed(difference),
    };

    DeltaReading {
        text,
        direction,
        tone,
    }
}

pub struct TileRenderer<'a, C: TileCanvas> {
    canvas: &'a C,
    output_dir: PathBuf,
}

impl<'a, C: TileCanvas> TileRenderer<'a, C> {
    pub fn new(canvas: &'a C, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            canvas,
            output_dir: output_dir.into(),
        }
    }

    pub fn render(
        &self,
        habit: &str,
        series: &[(NaiveDate, f64)],
        policy: &MetricPolicy,
    ) -> AppResult<HabitTile> {
        if series.len() < 2 {
            return Err(AppError::InsufficientData {
                habit: habit.to_string(),
                points: series.len(),
            });
        }

        let weeks: Vec<NaiveDate> = series.iter().map(|(week, _)| *week).collect();
        let trend: Vec<f64> = series.iter().map(|(_, value)| *value).collect();
        let current = trend[trend.len() - 1];
        let previous = trend[trend.len() - 2];

        let spec = TileSpec {
            title: habit.to_string(),
            value_text: policy.format.format(current),
            delta: delta_reading(current, previous, policy),
            format: policy.format,
            y_range: policy.range.resolve(&trend),
            gridlines: weeks
                .iter()
                .copied()
                .filter(|week| week.weekday() == GRIDLINE_WEEKDAY)
                .collect(),
            weeks: weeks.clone(),
            trend: trend.clone(),
        };

        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(tile_file_name(habit));
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        self.canvas.draw_tile(&spec, &path)?;
        if !path.is_file() {
            return Err(AppError::Render(format!(
                "Tile for '{}' was not written to {}",
                habit,
                path.display()
            )));
        }

        tracing::debug!(habit = %habit, path = %path.display(), delta = %spec.delta.text, "rendered tile");
        Ok(HabitTile {
            name: habit.to_string(),
            weeks,
            trend,
            current,
            previous,
            image: path,
        })
    }

    pub fn render_heatmap(&self, heatmap: &Heatmap, file_name: &str) -> AppResult<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(file_name);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        self.canvas.draw_heatmap(heatmap, &path)?;
        Ok(path)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{delta_reading, tile_file_name, Direction, Heatmap, TileCanvas, TileRenderer, TileSpec, Tone};
    use crate::config::PolarityScope;
    use crate::errors::{AppError, AppResult};
    use crate::policy::resolve_policy;
    use chrono::{Duration, NaiveDate};
    use std::cell::RefCell;
    use std::path::Path;

    #[derive(Default)]
    pub(crate) struct RecordingCanvas {
        pub specs: RefCell<Vec<TileSpec>>,
    }

    impl TileCanvas for RecordingCanvas {
        fn draw_tile(&self, spec: &TileSpec, path: &Path) -> AppResult<()> {
            self.specs.borrow_mut().push(spec.clone());
            std::fs::write(path, b"tile")?;
            Ok(())
        }

        fn draw_heatmap(&self, _heatmap: &Heatmap, path: &Path) -> AppResult<()> {
            std::fs::write(path, b"heatmap")?;
            Ok(())
        }
    }

    fn weeks(values: &[f64]) -> Vec<(NaiveDate, f64)> {
        let monday = NaiveDate::from_ymd_opt(2024, 1, 1).expect("date");
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (monday + Duration::weeks(i as i64), *v))
            .collect()
    }

    #[test]
    fn no_alcohol_increase_is_unfavorable() {
        let policy = resolve_policy("No alcohol", &PolarityScope::AllMatching);
        let reading = delta_reading(1.0, 0.0, &policy);
        assert_eq!(reading.direction, Direction::Up);
        assert_eq!(reading.tone, Tone::Unfavorable);
        assert_eq!(reading.text, "+100%");

        let drop = delta_reading(0.0, 1.0, &policy);
        assert_eq!(drop.tone, Tone::Favorable);
    }

    #[test]
    fn track_delta_is_relative() {
        let policy = resolve_policy("Track sleep", &PolarityScope::AllMatching);
        let reading = delta_reading(7.5, 6.0, &policy);
        assert_eq!(reading.text, "+25%");
        assert_eq!(reading.tone, Tone::Favorable);

        let from_zero = delta_reading(2.0, 0.0, &policy);
        assert_eq!(from_zero.text, "+2.0");

        let flat = delta_reading(6.0, 6.0, &policy);
        assert_eq!(flat.tone, Tone::Neutral);
    }

    #[test]
    fn short_series_is_insufficient() {
        let dir = tempfile::tempdir().expect("tempdir");
        let canvas = RecordingCanvas::default();
        let renderer = TileRenderer::new(&canvas, dir.path());
        let policy = resolve_policy("Read", &PolarityScope::AllMatching);
        let err = renderer.render("Read", &weeks(&[0.5]), &policy).expect_err("one point");
        assert!(matches!(err, AppError::InsufficientData { points: 1, .. }));
        assert!(canvas.specs.borrow().is_empty());
        assert!(!dir.path().join("Read.png").exists());
    }

    #[test]
    fn renders_tile_and_replaces_stale_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let stale = dir.path().join("No alcohol.png");
        std::fs::write(&stale, b"stale").expect("stale");

        let canvas = RecordingCanvas::default();
        let renderer = TileRenderer::new(&canvas, dir.path());
        let policy = resolve_policy("No alcohol", &PolarityScope::AllMatching);
        let tile = renderer
            .render("No alcohol", &weeks(&[0.0, 1.0, 1.0, 0.0, 1.0]), &policy)
            .expect("render");

        assert_eq!(tile.current, 1.0);
        assert_eq!(tile.previous, 0.0);
        assert_eq!(tile.image, stale);
        assert_eq!(std::fs::read(&stale).expect("read"), b"tile");

        let specs = canvas.specs.borrow();
        assert_eq!(specs[0].value_text, "100%");
        assert_eq!(specs[0].y_range, (-0.1, 1.1));
        assert_eq!(specs[0].delta.tone, Tone::Unfavorable);
        assert_eq!(specs[0].gridlines.len(), 5);
    }

    #[test]
    fn file_names_keep_habit_names() {
        assert_eq!(tile_file_name("Track sleep"), "Track sleep.png");
        assert_eq!(tile_file_name("In/Out"), "In-Out.png");
    }
}
