use crate::aggregator::{self, HabitStats};
use crate::config::AppConfig;
use crate::dashboard;
use crate::errors::{AppError, AppResult};
use crate::janitor;
use crate::models::{
    CleanRecord, DailyAggregate, DashboardDocument, DeliveryOutcome, HabitTile, RunReport, SkippedHabit,
    WeeklyAggregate,
};
use crate::normalizer::{self, week_start};
use crate::notifier::{MailTransport, Notifier};
use crate::policy::PolicyResolver;
use crate::render::heatmap::{build_heatmap, HEATMAP_FILE, HEATMAP_WEEKS};
use crate::render::{tile_file_name, TileCanvas, TileRenderer};
use crate::source::HabitSource;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Normalized {
    pub run_at: NaiveDateTime,
    pub records: Vec<CleanRecord>,
}

#[derive(Debug, Clone)]
pub struct Aggregates {
    pub daily: Vec<DailyAggregate>,
    pub weekly: Vec<WeeklyAggregate>,
}

impl Aggregates {
    pub fn from_records(records: &[CleanRecord]) -> Self {
        let daily = aggregator::daily(records);
        let weekly = aggregator::weekly(&daily);
        Self { daily, weekly }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RenderedTiles {
    pub tiles: Vec<HabitTile>,
    pub skipped: Vec<SkippedHabit>,
}

pub struct Pipeline<'a, S: HabitSource, C: TileCanvas, T: MailTransport> {
    config: &'a AppConfig,
    source: &'a S,
    canvas: &'a C,
    transport: &'a T,
}

impl<'a, S: HabitSource, C: TileCanvas, T: MailTransport> Pipeline<'a, S, C, T> {
    pub fn new(config: &'a AppConfig, source: &'a S, canvas: &'a C, transport: &'a T) -> Self {
        Self {
            config,
            source,
            canvas,
            transport,
        }
    }

    // One weekly run. Only a stale source or bad input data is returned as an error;
    // delivery problems end up in `RunReport::delivery`.
    pub fn run(&self, run_at: NaiveDateTime) -> AppResult<RunReport> {
        let normalized = self.load(run_at)?;
        let aggregates = Aggregates::from_records(&normalized.records);
        tracing::info!(
            daily = aggregates.daily.len(),
            weekly = aggregates.weekly.len(),
            "aggregated habit log"
        );
        if let Some(stats) = self.focus_stats(&normalized.records) {
            tracing::info!(
                habit = %stats.habit,
                window_weeks = stats.window_weeks,
                latest_moving_avg = stats.latest_moving_avg,
                overall_mean = stats.overall_mean,
                recent_mean = stats.recent_mean,
                "focus habit summary"
            );
        }

        let (rendered, document) = match self.render(&aggregates).and_then(|rendered| {
            let document = dashboard::compose(&self.config.output_dir, &rendered.tiles)?;
            Ok((rendered, document))
        }) {
            Ok(staged) => staged,
            Err(error) => {
                tracing::error!(error = %error, "rendering failed, clearing partial output");
                janitor::sweep(&self.config.output_dir);
                return Err(error);
            }
        };

        let reported_week = reported_week(run_at);
        let delivery = self.deliver(&document, reported_week);
        let cleanup = janitor::sweep(&self.config.output_dir);

        Ok(RunReport {
            week_start: reported_week,
            tiles: rendered.tiles.into_iter().map(|tile| tile.name).collect(),
            skipped: rendered.skipped,
            delivery,
            cleanup,
        })
    }

    pub fn check_fresh(&self, run_at: NaiveDateTime) -> AppResult<()> {
        let modified = self.source.modified_at()?;
        normalizer::ensure_fresh(modified, run_at).inspect_err(|error| {
            tracing::error!(error = %error, "habit log is stale, aborting run");
        })
    }

    fn load(&self, run_at: NaiveDateTime) -> AppResult<Normalized> {
        self.check_fresh(run_at)?;
        let rows = self.source.rows()?;
        let records = normalizer::normalize(&rows, run_at)?;
        Ok(Normalized { run_at, records })
    }

    fn focus_stats(&self, records: &[CleanRecord]) -> Option<HabitStats> {
        let habit = self.config.focus_habit.as_deref()?;
        let stats = aggregator::habit_stats(records, habit, self.config.window_weeks);
        if stats.is_none() {
            tracing::warn!(habit = %habit, "focus habit has no records");
        }
        stats
    }

    fn render(&self, aggregates: &Aggregates) -> AppResult<RenderedTiles> {
        let renderer = TileRenderer::new(self.canvas, &self.config.output_dir);
        let mut resolver = PolicyResolver::new(self.config.polarity_scope.clone());
        let mut rendered = RenderedTiles::default();

        if self.config.heatmap {
            if let Some(last_week) = aggregates.weekly.iter().map(|row| row.week).max() {
                if let Some(heatmap) = build_heatmap(&aggregates.daily, last_week, HEATMAP_WEEKS) {
                    renderer.render_heatmap(&heatmap, HEATMAP_FILE)?;
                }
            }
        }

        let mut claimed: HashMap<String, String> = HashMap::new();
        for habit in aggregator::habits_descending(&aggregates.weekly) {
            let file_name = tile_file_name(&habit);
            if let Some(owner) = claimed.get(&file_name) {
                tracing::warn!(habit = %habit, owner = %owner, file = %file_name, "tile file name already taken, skipping");
                rendered.skipped.push(SkippedHabit {
                    reason: format!("Tile file '{}' already used by '{}'", file_name, owner),
                    name: habit,
                });
                continue;
            }
            claimed.insert(file_name, habit.clone());

            let series = aggregator::trailing_weeks(&aggregates.weekly, &habit, self.config.trend_weeks);
            let policy = resolver.resolve(&habit);
            match renderer.render(&habit, &series, &policy) {
                Ok(tile) => rendered.tiles.push(tile),
                Err(error @ AppError::InsufficientData { .. }) => {
                    tracing::warn!(habit = %habit, error = %error, "skipping tile");
                    rendered.skipped.push(SkippedHabit {
                        name: habit,
                        reason: error.to_string(),
                    });
                }
                Err(error) => return Err(error),
            }
        }

        tracing::info!(
            tiles = rendered.tiles.len(),
            skipped = rendered.skipped.len(),
            "rendered habit tiles"
        );
        Ok(rendered)
    }

    fn deliver(&self, document: &DashboardDocument, reported_week: NaiveDate) -> DeliveryOutcome {
        let subject = format!("Habit report for week of {}", reported_week.format("%Y-%m-%d"));
        Notifier::new(self.transport, &self.config.mail.address).deliver(document, &subject)
    }
}

pub fn reported_week(run_at: NaiveDateTime) -> NaiveDate {
    week_start(run_at.date()) - Duration::weeks(1)
}
