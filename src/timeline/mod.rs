//! The timeline view engine: coordinates, grid, zoom, windowing, selection
//! and scroll synchronization for the task timeline.

pub mod engine;
pub mod grid;
pub mod layout;
pub mod mapper;
pub mod scroll_sync;
pub mod selection;
pub mod timer;
pub mod virtualizer;
pub mod zoom;

pub use engine::{PaneRole, PointerEvent, PointerTarget, TimelineEngine};
pub use grid::{GridCell, Holiday, HolidayCalendar};
pub use layout::{BarHandle, Connector, RowKind, TaskPosition};
pub use mapper::{CalendarDay, ViewUnit};
pub use scroll_sync::{PaneId, PaneSize, ScrollOffset, ScrollPane};
pub use selection::{Modifiers, SelectionMode, SelectionState};
pub use timer::{Clock, ManualClock, SystemClock};
pub use zoom::{Dimensions, DisplayLevel, ZoomLevel};
