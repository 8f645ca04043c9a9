use chrono::NaiveDate;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Quantity")]
    pub quantity: String,
}

impl RawRow {
    pub fn new(date: &str, name: &str, quantity: &str) -> Self {
        Self {
            date: date.to_string(),
            name: name.to_string(),
            quantity: quantity.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleanRecord {
    pub date: NaiveDate,
    pub day: String,
    pub name: String,
    pub quantity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub name: String,
    pub quantity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyAggregate {
    pub week: NaiveDate,
    pub name: String,
    pub quantity_avg: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RollingPoint {
    pub date: NaiveDate,
    pub day: String,
    pub quantity: f64,
    pub moving_avg: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HabitTile {
    pub name: String,
    pub weeks: Vec<NaiveDate>,
    pub trend: Vec<f64>,
    pub current: f64,
    pub previous: f64,
    pub image: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRole {
    WordCloud,
    Heatmap,
    Tile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub role: ImageRole,
    pub file_name: String,
    pub path: PathBuf,
    pub alt: String,
}

#[derive(Debug, Clone)]
pub struct DashboardDocument {
    pub images: Vec<ImageRef>,
    pub html: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStage {
    Draft,
    Attached,
    Sent,
    Failed,
}

impl DeliveryStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Attached => "attached",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent { attachments: usize },
    // `stage` is the transition that was being attempted when the failure happened.
    Failed { stage: DeliveryStage, cause: String },
}

impl DeliveryOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }

    pub fn final_stage(&self) -> DeliveryStage {
        match self {
            Self::Sent { .. } => DeliveryStage::Sent,
            Self::Failed { .. } => DeliveryStage::Failed,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct SkippedHabit {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub week_start: NaiveDate,
    pub tiles: Vec<String>,
    pub skipped: Vec<SkippedHabit>,
    pub delivery: DeliveryOutcome,
    pub cleanup: CleanupReport,
}
