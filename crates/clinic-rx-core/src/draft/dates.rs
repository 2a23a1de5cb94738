//! Issue-date selection for a draft.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One candidate issue date. Each enabled entry becomes its own prescription.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateConfig {
    pub enabled: bool,
    pub date: NaiveDate,
}

impl DateConfig {
    pub fn enabled(date: NaiveDate) -> Self {
        Self {
            enabled: true,
            date,
        }
    }
}

/// Default selection: a single enabled entry for `today`.
pub fn default_dates(today: NaiveDate) -> Vec<DateConfig> {
    vec![DateConfig::enabled(today)]
}

/// Enabled dates in list order. Duplicates are kept.
pub fn enabled_dates(configs: &[DateConfig]) -> Vec<NaiveDate> {
    configs
        .iter()
        .filter(|c| c.enabled)
        .map(|c| c.date)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_default_dates() {
        assert_eq!(default_dates(day(10)), vec![DateConfig::enabled(day(10))]);
    }

    #[test]
    fn test_enabled_dates_keeps_order() {
        let configs = vec![
            DateConfig::enabled(day(17)),
            DateConfig {
                enabled: false,
                date: day(3),
            },
            DateConfig::enabled(day(10)),
        ];
        assert_eq!(enabled_dates(&configs), vec![day(17), day(10)]);
    }

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_value(DateConfig::enabled(day(10))).unwrap();
        assert_eq!(json, serde_json::json!({"enabled": true, "date": "2024-01-10"}));
    }
}
