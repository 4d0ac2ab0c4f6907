//! Rule-based alerts over a horizon forecast
//!
//! Thresholds are fixed heuristics by default and compare the horizon
//! against the long-run history of the series, not the training window.
//! [`recommend`] condenses the same inputs into one demand outlook and a
//! daily purchase quantity.

use crate::data::HistoricalStats;
use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What an alert is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    HighDemand,
    LowDemand,
    HighUncertainty,
    TrendUp,
    TrendDown,
}

impl AlertKind {
    pub fn severity(&self) -> Severity {
        match self {
            AlertKind::HighDemand => Severity::Warning,
            AlertKind::LowDemand | AlertKind::HighUncertainty | AlertKind::TrendDown => {
                Severity::Info
            }
            AlertKind::TrendUp => Severity::Success,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AlertKind::HighDemand => "High demand expected",
            AlertKind::LowDemand => "Low demand expected",
            AlertKind::HighUncertainty => "High uncertainty",
            AlertKind::TrendUp => "Growing trend",
            AlertKind::TrendDown => "Declining trend",
        }
    }
}

/// How prominently an alert should be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Success => write!(f, "success"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A finding about the horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    /// 1-based horizon days the alert applies to; `None` for whole-horizon findings
    pub days: Option<Vec<usize>>,
}

impl Alert {
    fn new(kind: AlertKind, message: String, days: Option<Vec<usize>>) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            title: kind.title().to_string(),
            message,
            days,
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.title, self.message)
    }
}

/// Alert thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertRules {
    /// Standard deviations from the historical mean that count as unusual
    pub demand_sigma: f64,
    /// Band width relative to the point forecast above which a day is uncertain
    pub uncertainty_ratio: f64,
    /// Second-half to first-half ratio that counts as growth
    pub trend_growth: f64,
    /// Second-half to first-half ratio that counts as decline
    pub trend_decline: f64,
    /// Shortest horizon the trend check runs on
    pub min_trend_horizon: usize,
    /// Horizon-mean to historical-mean ratio above which demand is rising
    pub outlook_rise: f64,
    /// Horizon-mean to historical-mean ratio below which demand is falling
    pub outlook_fall: f64,
    /// Mean band width over mean point above which purchases stay conservative
    pub conservative_ratio: f64,
    /// Mean band width over mean point above which purchases are balanced
    pub balanced_ratio: f64,
}

impl Default for AlertRules {
    fn default() -> Self {
        Self {
            demand_sigma: 2.0,
            uncertainty_ratio: 0.5,
            trend_growth: 1.2,
            trend_decline: 0.8,
            min_trend_horizon: 7,
            outlook_rise: 1.1,
            outlook_fall: 0.9,
            conservative_ratio: 0.5,
            balanced_ratio: 0.3,
        }
    }
}

impl AlertRules {
    pub fn validate(&self) -> Result<()> {
        if !(self.demand_sigma >= 0.0) || !(self.uncertainty_ratio >= 0.0) {
            return Err(ForecastError::InvalidParameter(
                "Alert sigma and uncertainty ratio must be non-negative".to_string(),
            ));
        }
        if !(self.trend_decline > 0.0 && self.trend_decline < 1.0 && self.trend_growth > 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Trend thresholds must satisfy 0 < decline < 1 < growth, got {} and {}",
                self.trend_decline, self.trend_growth
            )));
        }
        if self.min_trend_horizon < 2 {
            return Err(ForecastError::InvalidParameter(
                "Trend check needs a horizon of at least 2 days".to_string(),
            ));
        }
        if !(self.outlook_fall > 0.0 && self.outlook_fall < 1.0 && self.outlook_rise > 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Outlook thresholds must satisfy 0 < fall < 1 < rise, got {} and {}",
                self.outlook_fall, self.outlook_rise
            )));
        }
        if !(self.balanced_ratio >= 0.0 && self.balanced_ratio <= self.conservative_ratio) {
            return Err(ForecastError::InvalidParameter(format!(
                "Purchase thresholds must satisfy 0 <= balanced <= conservative, got {} and {}",
                self.balanced_ratio, self.conservative_ratio
            )));
        }
        Ok(())
    }
}

fn day_numbers(flags: impl Iterator<Item = bool>) -> Vec<usize> {
    flags
        .enumerate()
        .filter(|(_, flagged)| *flagged)
        .map(|(i, _)| i + 1)
        .collect()
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        "day"
    } else {
        "days"
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Evaluate every rule over the horizon predictions
///
/// Alerts come out in a fixed order: high demand, low demand, uncertainty, trend.
pub fn generate_alerts(
    point: &[f64],
    lower: &[f64],
    upper: &[f64],
    history: &HistoricalStats,
    rules: &AlertRules,
) -> Result<Vec<Alert>> {
    if point.len() != lower.len() || point.len() != upper.len() {
        return Err(ForecastError::ValidationError(format!(
            "Alert inputs disagree: {} points, {} lower, {} upper",
            point.len(),
            lower.len(),
            upper.len()
        )));
    }

    let mut alerts = Vec::new();
    if point.is_empty() {
        return Ok(alerts);
    }

    let high_threshold = history.mean + rules.demand_sigma * history.std_dev;
    let low_threshold = (history.mean - rules.demand_sigma * history.std_dev).max(0.0);

    let high_days = day_numbers(point.iter().map(|&p| p > high_threshold));
    if !high_days.is_empty() {
        let peak = high_days
            .iter()
            .map(|&d| point[d - 1])
            .fold(f64::NEG_INFINITY, f64::max);
        let message = if history.mean > 0.0 {
            format!(
                "{} {} with unusually high demand (up to {:.0} units, +{:.0}% vs average)",
                high_days.len(),
                plural(high_days.len()),
                peak,
                (peak / history.mean - 1.0) * 100.0
            )
        } else {
            format!(
                "{} {} with unusually high demand (up to {:.0} units)",
                high_days.len(),
                plural(high_days.len()),
                peak
            )
        };
        alerts.push(Alert::new(AlertKind::HighDemand, message, Some(high_days)));
    }

    let low_days = day_numbers(point.iter().map(|&p| p < low_threshold));
    if !low_days.is_empty() {
        let trough = low_days
            .iter()
            .map(|&d| point[d - 1])
            .fold(f64::INFINITY, f64::min);
        let message = format!(
            "{} {} with unusually low demand (down to {:.0} units, -{:.0}% vs average)",
            low_days.len(),
            plural(low_days.len()),
            trough,
            (1.0 - trough / history.mean) * 100.0
        );
        alerts.push(Alert::new(AlertKind::LowDemand, message, Some(low_days)));
    }

    let uncertain_days = day_numbers(point.iter().zip(lower.iter().zip(upper)).map(
        |(&p, (&l, &u))| {
            let width = u - l;
            if p > 0.0 {
                width / p > rules.uncertainty_ratio
            } else {
                width > 0.0
            }
        },
    ));
    if !uncertain_days.is_empty() {
        let message = format!(
            "{} {} with a wide prediction interval; plan purchases conservatively",
            uncertain_days.len(),
            plural(uncertain_days.len())
        );
        alerts.push(Alert::new(
            AlertKind::HighUncertainty,
            message,
            Some(uncertain_days),
        ));
    }

    if let Some(alert) = trend_alert(point, rules) {
        alerts.push(alert);
    }

    Ok(alerts)
}

/// Compare the second half of the horizon against the first
fn trend_alert(point: &[f64], rules: &AlertRules) -> Option<Alert> {
    if point.len() < rules.min_trend_horizon {
        return None;
    }

    let (first, second) = point.split_at(point.len() / 2);
    let first_mean = mean(first);
    let second_mean = mean(second);

    if first_mean <= 0.0 {
        if second_mean > 0.0 {
            return Some(Alert::new(
                AlertKind::TrendUp,
                "Demand picks up in the second half of the horizon".to_string(),
                None,
            ));
        }
        return None;
    }

    let ratio = second_mean / first_mean;
    if ratio >= rules.trend_growth {
        Some(Alert::new(
            AlertKind::TrendUp,
            format!(
                "Demand grows {:.0}% in the second half of the horizon",
                (ratio - 1.0) * 100.0
            ),
            None,
        ))
    } else if ratio <= rules.trend_decline {
        Some(Alert::new(
            AlertKind::TrendDown,
            format!(
                "Demand falls {:.0}% in the second half of the horizon",
                (1.0 - ratio) * 100.0
            ),
            None,
        ))
    } else {
        None
    }
}

/// Direction of the horizon against the series history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandOutlook {
    Rising,
    Falling,
    Stable,
}

impl fmt::Display for DemandOutlook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemandOutlook::Rising => write!(f, "rising"),
            DemandOutlook::Falling => write!(f, "falling"),
            DemandOutlook::Stable => write!(f, "stable"),
        }
    }
}

/// How aggressively to buy given the width of the band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStance {
    /// Wide band: buy the lower bound to avoid overstock
    Conservative,
    /// Buy the point forecast
    Balanced,
    /// Narrow band: buy the point forecast, up to the upper bound
    Confident,
}

impl fmt::Display for PurchaseStance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PurchaseStance::Conservative => write!(f, "conservative"),
            PurchaseStance::Balanced => write!(f, "balanced"),
            PurchaseStance::Confident => write!(f, "confident"),
        }
    }
}

/// Operational summary of a horizon forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub outlook: DemandOutlook,
    pub forecast_mean: f64,
    pub historical_mean: f64,
    /// Percent change of the horizon mean against history; `None` when the
    /// historical mean is zero
    pub change_pct: Option<f64>,
    pub stance: PurchaseStance,
    /// Mean band width over mean point; `None` when the mean point is zero
    pub uncertainty_ratio: Option<f64>,
    /// Suggested purchase per day
    pub daily_units: f64,
    /// Upper end of the purchase, only for [`PurchaseStance::Confident`]
    pub max_daily_units: Option<f64>,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Demand {} ({:.1} vs {:.1} historical",
            self.outlook, self.forecast_mean, self.historical_mean
        )?;
        if let Some(change) = self.change_pct {
            write!(f, ", {:+.1}%", change)?;
        }
        write!(
            f,
            "); {} purchase of {:.0} units/day",
            self.stance, self.daily_units
        )?;
        if let Some(max) = self.max_daily_units {
            write!(f, ", up to {:.0}", max)?;
        }
        Ok(())
    }
}

/// Summarize the horizon as a demand outlook and a purchase suggestion
///
/// Returns `None` for an empty horizon. Ratios sitting exactly on a threshold
/// fall to the calmer side: stable rather than rising or falling, and the
/// less conservative stance.
pub fn recommend(
    point: &[f64],
    lower: &[f64],
    upper: &[f64],
    history: &HistoricalStats,
    rules: &AlertRules,
) -> Result<Option<Recommendation>> {
    if point.len() != lower.len() || point.len() != upper.len() {
        return Err(ForecastError::ValidationError(format!(
            "Recommendation inputs disagree: {} points, {} lower, {} upper",
            point.len(),
            lower.len(),
            upper.len()
        )));
    }
    if point.is_empty() {
        return Ok(None);
    }

    let forecast_mean = mean(point);
    let lower_mean = mean(lower);
    let upper_mean = mean(upper);
    let width_mean = lower
        .iter()
        .zip(upper)
        .map(|(&l, &u)| u - l)
        .sum::<f64>()
        / point.len() as f64;

    let (outlook, change_pct) = if history.mean > 0.0 {
        let ratio = forecast_mean / history.mean;
        let outlook = if ratio > rules.outlook_rise {
            DemandOutlook::Rising
        } else if ratio < rules.outlook_fall {
            DemandOutlook::Falling
        } else {
            DemandOutlook::Stable
        };
        (outlook, Some((ratio - 1.0) * 100.0))
    } else if forecast_mean > 0.0 {
        (DemandOutlook::Rising, None)
    } else {
        (DemandOutlook::Stable, None)
    };

    let uncertainty_ratio = if forecast_mean > 0.0 {
        Some(width_mean / forecast_mean)
    } else {
        None
    };
    let stance = match uncertainty_ratio {
        Some(ratio) if ratio > rules.conservative_ratio => PurchaseStance::Conservative,
        Some(ratio) if ratio > rules.balanced_ratio => PurchaseStance::Balanced,
        Some(_) => PurchaseStance::Confident,
        None if width_mean > 0.0 => PurchaseStance::Conservative,
        None => PurchaseStance::Confident,
    };

    let (daily_units, max_daily_units) = match stance {
        PurchaseStance::Conservative => (lower_mean, None),
        PurchaseStance::Balanced => (forecast_mean, None),
        PurchaseStance::Confident => (forecast_mean, Some(upper_mean)),
    };

    Ok(Some(Recommendation {
        outlook,
        forecast_mean,
        historical_mean: history.mean,
        change_pct,
        stance,
        uncertainty_ratio,
        daily_units,
        max_daily_units,
    }))
}
