//! Local-time window gate.
//!
//! The job is triggered at fixed UTC times, but it should only do work at one
//! civil hour in one timezone. Because the UTC offset moves with daylight
//! saving, more than one UTC trigger is scheduled and each invocation checks
//! here whether it is the one that lands on the target local hour.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::config::TriggerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Proceed { local_hour: u32 },
    Skip { local_hour: u32 },
}

impl GateDecision {
    pub fn should_proceed(self) -> bool {
        matches!(self, Self::Proceed { .. })
    }

    pub fn local_hour(self) -> u32 {
        match self {
            Self::Proceed { local_hour } | Self::Skip { local_hour } => local_hour,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WindowGate {
    timezone: Tz,
    target_hour: u32,
    tz_label: String,
}

impl WindowGate {
    pub fn new(timezone: Tz, target_hour: u32, tz_label: impl Into<String>) -> Self {
        Self {
            timezone,
            target_hour,
            tz_label: tz_label.into(),
        }
    }

    pub fn from_config(config: &TriggerConfig) -> Self {
        Self::new(config.timezone, config.target_hour, config.tz_label.clone())
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn target_hour(&self) -> u32 {
        self.target_hour
    }

    pub fn local_hour(&self, now: DateTime<Utc>) -> u32 {
        now.with_timezone(&self.timezone).hour()
    }

    pub fn check(&self, now: DateTime<Utc>) -> GateDecision {
        let local_hour = self.local_hour(now);
        if local_hour == self.target_hour {
            GateDecision::Proceed { local_hour }
        } else {
            GateDecision::Skip { local_hour }
        }
    }

    /// Human form of the window, e.g. `9 PM Pacific`.
    pub fn window_label(&self) -> String {
        format!("{} {}", format_hour_12(self.target_hour), self.tz_label)
    }

    /// Distinct UTC hours at which the target local hour starts during `year`.
    ///
    /// With one trigger per returned hour, an ordinary day has exactly one
    /// firing inside the window. On a fall-back day a target hour that occurs
    /// twice gets two, and on a spring-forward day a target hour inside the
    /// skipped gap gets none.
    pub fn utc_trigger_hours(&self, year: i32) -> Vec<u32> {
        let Some(first) = NaiveDate::from_ymd_opt(year, 1, 1) else {
            return Vec::new();
        };

        let mut hours = BTreeSet::new();
        for date in first.iter_days().take_while(|d| d.year() == year) {
            let Some(local) = date.and_hms_opt(self.target_hour, 0, 0) else {
                continue;
            };
            let mapped = self.timezone.from_local_datetime(&local);
            // Nonexistent local times (spring-forward gap) map to nothing.
            for instant in [mapped.clone().earliest(), mapped.latest()]
                .into_iter()
                .flatten()
            {
                hours.insert(instant.with_timezone(&Utc).hour());
            }
        }
        hours.into_iter().collect()
    }
}

pub fn format_hour_12(hour: u32) -> String {
    match hour {
        0 => "12 AM".to_string(),
        1..=11 => format!("{hour} AM"),
        12 => "12 PM".to_string(),
        h => format!("{} PM", h - 12),
    }
}
