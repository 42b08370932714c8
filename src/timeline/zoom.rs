//! Zoom level, derived dimensions, and the zoom controller.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::mapper::ViewUnit;
use super::timer::Timer;
use crate::error::{Result, TimelineError};

pub const MIN_ZOOM: i32 = 10;
pub const MAX_ZOOM: i32 = 200;
pub const DEFAULT_ZOOM: i32 = 100;
pub const ZOOM_STEP: i32 = 10;

const PROJECT_ROW_HEIGHT: f32 = 48.0;
const TASK_ROW_HEIGHT: f32 = 40.0;
const SUBTASK_ROW_HEIGHT: f32 = 32.0;

/// Zoom percentage, always within `[MIN_ZOOM, MAX_ZOOM]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub struct ZoomLevel(i32);

impl ZoomLevel {
    pub fn get(self) -> i32 {
        self.0
    }

    pub fn ratio(self) -> f32 {
        self.0 as f32 / 100.0
    }
}

impl Default for ZoomLevel {
    fn default() -> Self {
        Self(DEFAULT_ZOOM)
    }
}

impl From<i32> for ZoomLevel {
    fn from(value: i32) -> Self {
        clamp(value)
    }
}

impl From<ZoomLevel> for i32 {
    fn from(level: ZoomLevel) -> Self {
        level.0
    }
}

/// Clamp any integer into the valid zoom range.
pub fn clamp(zoom: i32) -> ZoomLevel {
    ZoomLevel(zoom.clamp(MIN_ZOOM, MAX_ZOOM))
}

/// Like [`clamp`], but reports whether clamping was needed.
pub fn checked(zoom: i32) -> Result<ZoomLevel> {
    let level = clamp(zoom);
    if level.0 == zoom {
        Ok(level)
    } else {
        Err(TimelineError::ZoomOutOfRange {
            requested: zoom,
            clamped: level.0,
        })
    }
}

/// Unscaled width of one day column.
pub fn base_width(unit: ViewUnit) -> f32 {
    match unit {
        ViewUnit::Day => 30.0,
        ViewUnit::Week => 20.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowHeights {
    pub project: f32,
    pub task: f32,
    pub subtask: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSizes {
    pub base: f32,
    pub small: f32,
    pub large: f32,
}

/// How much detail the renderer should draw at a given zoom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayLevel {
    Minimal,
    Compact,
    Reduced,
    Full,
}

impl DisplayLevel {
    pub fn for_zoom(zoom: ZoomLevel) -> Self {
        match zoom.get() {
            z if z <= 30 => DisplayLevel::Minimal,
            z if z <= 50 => DisplayLevel::Compact,
            z if z <= 80 => DisplayLevel::Reduced,
            _ => DisplayLevel::Full,
        }
    }
}

/// Everything that scales with zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimensions {
    /// Width of one day; a week column is seven of these.
    pub cell_width: f32,
    pub row_heights: RowHeights,
    pub font_sizes: FontSizes,
    pub zoom_ratio: f32,
    pub display_level: DisplayLevel,
}

impl Dimensions {
    /// Width of one grid column in `unit`.
    pub fn column_width(&self, unit: ViewUnit) -> f32 {
        self.cell_width * unit.days() as f32
    }
}

/// Font sizes step through fixed breakpoints instead of scaling linearly,
/// which would go illegible below ~10px.
pub fn font_sizes(zoom: ZoomLevel) -> FontSizes {
    let (base, small, large) = match zoom.get() {
        z if z <= 30 => (8.0, 7.0, 9.0),
        z if z <= 50 => (10.0, 9.0, 11.0),
        z if z <= 80 => (12.0, 11.0, 13.0),
        z if z <= 120 => (14.0, 12.0, 16.0),
        z if z <= 150 => (16.0, 14.0, 18.0),
        _ => (18.0, 16.0, 20.0),
    };
    FontSizes { base, small, large }
}

pub fn dimensions_for(zoom: ZoomLevel, unit: ViewUnit) -> Dimensions {
    let ratio = zoom.ratio();
    Dimensions {
        cell_width: base_width(unit) * ratio,
        row_heights: RowHeights {
            project: (PROJECT_ROW_HEIGHT * ratio).round(),
            task: (TASK_ROW_HEIGHT * ratio).round(),
            subtask: (SUBTASK_ROW_HEIGHT * ratio).round(),
        },
        font_sizes: font_sizes(zoom),
        zoom_ratio: ratio,
        display_level: DisplayLevel::for_zoom(zoom),
    }
}

/// Zoom that makes `column_count` columns exactly fill `container_width`.
pub fn fit_zoom(container_width: f32, column_count: usize, unit: ViewUnit) -> Result<ZoomLevel> {
    if !(container_width > 0.0) || column_count == 0 {
        return Err(TimelineError::ZeroViewport {
            width: container_width,
            height: 0.0,
        });
    }
    let required = container_width / (column_count as f32 * unit.days() as f32);
    let zoom = (required / base_width(unit) * 100.0).round();
    Ok(clamp(zoom as i32))
}

/// Owns the current zoom level and the "zoom in progress" flag.
#[derive(Debug, Clone)]
pub struct ZoomController {
    level: ZoomLevel,
    transition: Timer,
    transition_delay: Duration,
}

impl ZoomController {
    pub fn new(initial: ZoomLevel, transition_delay: Duration) -> Self {
        Self {
            level: initial,
            transition: Timer::new(),
            transition_delay,
        }
    }

    pub fn level(&self) -> ZoomLevel {
        self.level
    }

    /// True for a short window after each zoom change.
    pub fn is_zooming(&self) -> bool {
        self.transition.is_pending()
    }

    /// Set the zoom, clamping out-of-range input. Returns whether the level changed.
    pub fn set(&mut self, zoom: i32, now: Duration) -> bool {
        let level = match checked(zoom) {
            Ok(level) => level,
            Err(err) => {
                tracing::warn!(%err, "zoom request clamped");
                clamp(zoom)
            }
        };
        self.apply(level, now)
    }

    pub fn zoom_in(&mut self, now: Duration) -> bool {
        self.apply(clamp(self.level.get() + ZOOM_STEP), now)
    }

    pub fn zoom_out(&mut self, now: Duration) -> bool {
        self.apply(clamp(self.level.get() - ZOOM_STEP), now)
    }

    pub fn reset(&mut self, now: Duration) -> bool {
        self.apply(ZoomLevel::default(), now)
    }

    pub fn fit_to_screen(
        &mut self,
        container_width: f32,
        column_count: usize,
        unit: ViewUnit,
        now: Duration,
    ) -> Result<bool> {
        let level = fit_zoom(container_width, column_count, unit)?;
        Ok(self.apply(level, now))
    }

    /// Clears the transition flag once its delay has passed.
    pub fn tick(&mut self, now: Duration) -> bool {
        self.transition.fire_if_due(now)
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.transition.deadline()
    }

    pub fn dispose(&mut self) {
        self.transition.cancel();
    }

    fn apply(&mut self, level: ZoomLevel, now: Duration) -> bool {
        let changed = level != self.level;
        self.level = level;
        self.transition.arm(now, self.transition_delay);
        if changed {
            tracing::debug!(zoom = level.get(), "zoom changed");
        }
        changed
    }
}
