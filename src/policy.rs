use crate::config::PolarityScope;
use std::collections::HashMap;

const FIXED_RANGE: (f64, f64) = (-0.1, 1.1);
const AUTO_RANGE_PADDING: f64 = 0.1;
const FLAT_SERIES_PADDING: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberFormat {
    Decimal { places: usize },
    Percent { places: usize },
}

impl NumberFormat {
    pub fn format(self, value: f64) -> String {
        match self {
            Self::Decimal { places } => format!("{:.*}", places, value),
            Self::Percent { places } => format!("{:.*}%", places, value * 100.0),
        }
    }

    pub fn format_signed(self, value: f64) -> String {
        let body = self.format(value.abs());
        if value > 0.0 {
            format!("+{}", body)
        } else if value < 0.0 {
            format!("-{}", body)
        } else {
            body
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaMode {
    Relative,
    Absolute,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AxisRange {
    Auto,
    Fixed(f64, f64),
}

impl AxisRange {
    pub fn resolve(self, series: &[f64]) -> (f64, f64) {
        match self {
            Self::Fixed(low, high) => (low, high),
            Self::Auto => {
                let finite = series.iter().copied().filter(|v| v.is_finite());
                let (min, max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                    (lo.min(v), hi.max(v))
                });
                if !min.is_finite() {
                    return (0.0, 1.0);
                }
                if (max - min).abs() < f64::EPSILON {
                    return (min - FLAT_SERIES_PADDING, max + FLAT_SERIES_PADDING);
                }
                (
                    min - min.abs() * AUTO_RANGE_PADDING,
                    max + max.abs() * AUTO_RANGE_PADDING,
                )
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricPolicy {
    pub format: NumberFormat,
    pub delta: DeltaMode,
    pub range: AxisRange,
    pub inverted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct FormatRule {
    first_token: Option<&'static str>,
    format: NumberFormat,
    delta: DeltaMode,
    range: AxisRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameMatch {
    Prefix(&'static str),
    Suffix(&'static str),
}

impl NameMatch {
    fn matches(self, name: &str) -> bool {
        match self {
            Self::Prefix(prefix) => name.starts_with(prefix),
            Self::Suffix(suffix) => name.ends_with(suffix),
        }
    }
}

// First match wins; the last entry (no token) is the fallback.
const FORMAT_RULES: &[FormatRule] = &[
    FormatRule {
        first_token: Some("Track"),
        format: NumberFormat::Decimal { places: 1 },
        delta: DeltaMode::Relative,
        range: AxisRange::Auto,
    },
    FormatRule {
        first_token: None,
        format: NumberFormat::Percent { places: 0 },
        delta: DeltaMode::Absolute,
        range: AxisRange::Fixed(FIXED_RANGE.0, FIXED_RANGE.1),
    },
];

const INVERTED_POLARITY: &[NameMatch] = &[NameMatch::Prefix("No"), NameMatch::Suffix("screen")];

pub fn has_inverted_name(name: &str) -> bool {
    INVERTED_POLARITY.iter().any(|rule| rule.matches(name))
}

#[derive(Debug, Clone)]
pub struct PolicyResolver {
    scope: PolarityScope,
    cache: HashMap<String, MetricPolicy>,
}

impl Default for PolicyResolver {
    fn default() -> Self {
        Self::new(PolarityScope::AllMatching)
    }
}

impl PolicyResolver {
    pub fn new(scope: PolarityScope) -> Self {
        Self {
            scope,
            cache: HashMap::new(),
        }
    }

    pub fn resolve(&mut self, name: &str) -> MetricPolicy {
        if let Some(policy) = self.cache.get(name) {
            return *policy;
        }
        let policy = resolve_policy(name, &self.scope);
        self.cache.insert(name.to_string(), policy);
        policy
    }
}

pub fn resolve_policy(name: &str, scope: &PolarityScope) -> MetricPolicy {
    let token = name.split_whitespace().next().unwrap_or_default();
    let rule = FORMAT_RULES
        .iter()
        .find(|rule| rule.first_token.map_or(true, |expected| expected == token))
        .copied()
        .unwrap_or(FORMAT_RULES[FORMAT_RULES.len() - 1]);

    let in_scope = match scope {
        PolarityScope::AllMatching => true,
        PolarityScope::Selected(selected) => selected == name,
    };

    MetricPolicy {
        format: rule.format,
        delta: rule.delta,
        range: rule.range,
        inverted: in_scope && has_inverted_name(name),
    }
}
