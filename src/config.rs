use crate::errors::{AppError, AppResult};
use std::path::PathBuf;

const DEFAULT_OUTPUT_FOLDER: &str = "output";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_TREND_WEEKS: usize = 6;
const DEFAULT_WINDOW_WEEKS: usize = 4;
const TREND_WEEKS_RANGE: std::ops::RangeInclusive<usize> = 6..=8;
const ALLOWED_WINDOW_WEEKS: &[usize] = &[1, 2, 4, 6, 8];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolarityScope {
    AllMatching,
    Selected(String),
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub address: String,
    pub password: String,
    pub smtp_host: String,
    pub smtp_port: u16,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub habits_path: PathBuf,
    pub output_dir: PathBuf,
    pub log_dir: PathBuf,
    pub mail: MailConfig,
    pub trend_weeks: usize,
    pub window_weeks: usize,
    pub focus_habit: Option<String>,
    pub polarity_scope: PolarityScope,
    pub heatmap: bool,
}

impl AppConfig {
    pub fn from_env() -> AppResult<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut problems = Vec::new();

        let habits_path = get("HABITS_PATH").map(PathBuf::from);
        if habits_path.is_none() {
            problems.push("HABITS_PATH is required".to_string());
        }
        let address = get("EMAIL_ADDRESS").unwrap_or_default();
        if address.is_empty() {
            problems.push("EMAIL_ADDRESS is required".to_string());
        }
        let password = get("EMAIL_PASSWORD").unwrap_or_default();
        if password.is_empty() {
            problems.push("EMAIL_PASSWORD is required".to_string());
        }

        let smtp_port = match get("SMTP_PORT") {
            Some(raw) => raw.parse::<u16>().unwrap_or_else(|_| {
                problems.push(format!("SMTP_PORT '{}' is not a port number", raw));
                DEFAULT_SMTP_PORT
            }),
            None => DEFAULT_SMTP_PORT,
        };

        let trend_weeks = match get("TREND_WEEKS") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(value) if TREND_WEEKS_RANGE.contains(&value) => value,
                _ => {
                    problems.push(format!(
                        "TREND_WEEKS '{}' must be within {}..={}",
                        raw,
                        TREND_WEEKS_RANGE.start(),
                        TREND_WEEKS_RANGE.end()
                    ));
                    DEFAULT_TREND_WEEKS
                }
            },
            None => DEFAULT_TREND_WEEKS,
        };

        let window_weeks = match get("WINDOW_WEEKS") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(value) if ALLOWED_WINDOW_WEEKS.contains(&value) => value,
                _ => {
                    problems.push(format!(
                        "WINDOW_WEEKS '{}' must be one of {:?}",
                        raw, ALLOWED_WINDOW_WEEKS
                    ));
                    DEFAULT_WINDOW_WEEKS
                }
            },
            None => DEFAULT_WINDOW_WEEKS,
        };

        let focus_habit = get("FOCUS_HABIT");
        let polarity_scope = match get("INVERT_SCOPE").as_deref() {
            None | Some("all") => PolarityScope::AllMatching,
            Some("selected") => match &focus_habit {
                Some(habit) => PolarityScope::Selected(habit.clone()),
                None => {
                    problems.push("INVERT_SCOPE=selected requires FOCUS_HABIT".to_string());
                    PolarityScope::AllMatching
                }
            },
            Some(other) => {
                problems.push(format!("INVERT_SCOPE '{}' must be 'all' or 'selected'", other));
                PolarityScope::AllMatching
            }
        };

        let heatmap = match get("HEATMAP").as_deref() {
            None => true,
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    problems.push(format!("HEATMAP '{}' is not a boolean", raw));
                    true
                }
            },
        };

        let output_dir = PathBuf::from(get("OUTPUT_FOLDER").unwrap_or_else(|| DEFAULT_OUTPUT_FOLDER.to_string()));
        let log_dir = PathBuf::from(get("LOG_DIR").unwrap_or_else(|| DEFAULT_LOG_DIR.to_string()));
        if output_dir == log_dir {
            problems.push("LOG_DIR must differ from OUTPUT_FOLDER, the output folder is wiped after each run".to_string());
        }

        if !problems.is_empty() {
            return Err(AppError::Config(problems.join("; ")));
        }

        Ok(Self {
            habits_path: habits_path.unwrap_or_default(),
            output_dir,
            log_dir,
            mail: MailConfig {
                address,
                password,
                smtp_host: get("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
                smtp_port,
            },
            trend_weeks,
            window_weeks,
            focus_habit,
            polarity_scope,
            heatmap,
        })
    }
}
