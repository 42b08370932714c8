//! Persisted timeline settings (lives in the OS config directory).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::LoadError;
use crate::timeline::grid::HolidayCalendar;
use crate::timeline::mapper::{parse_date, ViewUnit};
use crate::timeline::scroll_sync::SyncConfig;
use crate::timeline::zoom::ZoomLevel;

const APP_NAME: &str = "todo-timeline";

/// A holiday as written in `settings.json`. Dates stay strings here so one
/// bad entry does not reject the whole file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayEntry {
    pub date: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineSettings {
    pub default_zoom: ZoomLevel,
    pub default_view_unit: ViewUnit,
    /// Length of the scrollable date range.
    pub date_range_days: u32,
    /// Share of the range placed before today.
    pub past_ratio: f32,
    /// Extra rows built above and below the viewport.
    pub row_buffer: usize,
    /// Extra columns built left and right of the viewport.
    pub column_buffer: usize,
    pub drag_threshold: f32,
    pub post_drag_guard_ms: u64,
    pub scroll_debounce_ms: u64,
    pub scroll_settle_ms: u64,
    pub sync_threshold: f32,
    pub zoom_transition_ms: u64,
    pub holidays: Vec<HolidayEntry>,
}

impl Default for TimelineSettings {
    fn default() -> Self {
        Self {
            default_zoom: ZoomLevel::default(),
            default_view_unit: ViewUnit::Week,
            date_range_days: 365,
            past_ratio: 0.3,
            row_buffer: 5,
            column_buffer: 10,
            drag_threshold: 10.0,
            post_drag_guard_ms: 100,
            scroll_debounce_ms: 16,
            scroll_settle_ms: 32,
            sync_threshold: 1.0,
            zoom_transition_ms: 300,
            holidays: Vec::new(),
        }
    }
}

impl TimelineSettings {
    /// Holidays with parseable dates. Bad entries are skipped with a warning.
    pub fn holiday_calendar(&self) -> HolidayCalendar {
        let mut calendar = HolidayCalendar::new();
        for entry in &self.holidays {
            match parse_date(&entry.date) {
                Ok(date) => calendar.insert(date, entry.name.clone()),
                Err(err) => tracing::warn!(%err, name = %entry.name, "skipping holiday"),
            }
        }
        calendar
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            debounce: Duration::from_millis(self.scroll_debounce_ms),
            settle: Duration::from_millis(self.scroll_settle_ms),
            threshold: self.sync_threshold,
        }
    }

    pub fn post_drag_guard(&self) -> Duration {
        Duration::from_millis(self.post_drag_guard_ms)
    }

    pub fn zoom_transition(&self) -> Duration {
        Duration::from_millis(self.zoom_transition_ms)
    }

    /// Days of the range that lie before today.
    pub fn past_days(&self) -> i64 {
        (self.date_range_days as f32 * self.past_ratio.clamp(0.0, 1.0)).round() as i64
    }

    /// Read settings from `path`. Missing fields take their defaults.
    pub fn load_from(path: &Path) -> Result<Self, LoadError> {
        let json = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<(), LoadError> {
        let json = serde_json::to_string_pretty(self)?;
        let io_err = |source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, json).map_err(io_err)
    }

    /// Settings from the config directory, or defaults when the file is
    /// missing or broken.
    pub fn load() -> Self {
        let path = settings_path();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(settings) => {
                tracing::info!(path = %path.display(), "settings loaded");
                settings
            }
            Err(err) => {
                tracing::warn!(%err, "falling back to default settings");
                Self::default()
            }
        }
    }

    pub fn save(&self) {
        if let Err(err) = self.save_to(&settings_path()) {
            tracing::warn!(%err, "settings not saved");
        }
    }
}

/// Platform config directory, or the working directory as a fallback.
pub fn config_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn tasks_path() -> PathBuf {
    config_dir().join("tasks.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn partial_json_keeps_defaults() {
        let settings: TimelineSettings =
            serde_json::from_str(r#"{ "default_zoom": 250, "default_view_unit": "day" }"#).unwrap();
        assert_eq!(settings.default_zoom.get(), 200);
        assert_eq!(settings.default_view_unit, ViewUnit::Day);
        assert_eq!(settings.date_range_days, 365);
        assert_eq!(settings.scroll_debounce_ms, 16);
    }

    #[test]
    fn bad_holiday_dates_are_skipped() {
        let settings = TimelineSettings {
            holidays: vec![
                HolidayEntry {
                    date: "2024-12-25".into(),
                    name: "Christmas".into(),
                },
                HolidayEntry {
                    date: "25.12.2024".into(),
                    name: "Typo".into(),
                },
            ],
            ..TimelineSettings::default()
        };
        let calendar = settings.holiday_calendar();
        assert_eq!(calendar.len(), 1);
        let christmas = NaiveDate::from_ymd_opt(2024, 12, 25).unwrap();
        assert_eq!(calendar.name(christmas), Some("Christmas"));
    }

    #[test]
    fn past_days_split() {
        let settings = TimelineSettings::default();
        assert_eq!(settings.past_days(), 110);
    }

    #[test]
    fn save_and_load_roundtrip_through_disk() {
        let dir = std::env::temp_dir().join(format!("todo-timeline-{}", uuid::Uuid::new_v4()));
        let path = dir.join("settings.json");
        let settings = TimelineSettings {
            row_buffer: 8,
            ..TimelineSettings::default()
        };
        settings.save_to(&path).unwrap();
        assert_eq!(TimelineSettings::load_from(&path).unwrap(), settings);

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            TimelineSettings::load_from(&path),
            Err(LoadError::Parse { .. })
        ));
        let _ = std::fs::remove_dir_all(&dir);
        assert!(matches!(
            TimelineSettings::load_from(&path),
            Err(LoadError::Io { .. })
        ));
    }
}
