//! `ScrollPane` adapter for egui scroll areas.
//!
//! egui scroll areas are immediate mode: the offset is read back after each
//! `show` and a new offset can only be requested before the next one. A
//! [`SharedPane`] is the handle both sides hold. The engine's synchronizer
//! writes into it; the UI applies the request on the next frame and reports
//! what egui actually did.

use std::cell::RefCell;
use std::rc::Rc;

use egui::Vec2;
use todo_timeline::timeline::{PaneSize, ScrollOffset, ScrollPane};

#[derive(Debug, Default)]
struct PaneCell {
    offset: ScrollOffset,
    requested: Option<ScrollOffset>,
    viewport: PaneSize,
}

#[derive(Debug, Clone, Default)]
pub struct SharedPane(Rc<RefCell<PaneCell>>);

impl SharedPane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset to force onto the scroll area this frame, if any.
    pub fn take_request(&self) -> Option<Vec2> {
        self.0
            .borrow_mut()
            .requested
            .take()
            .map(|offset| Vec2::new(offset.left, offset.top))
    }

    /// Record what egui rendered. Returns `true` when the offset moved by
    /// itself, i.e. the user scrolled this pane.
    pub fn observe(&self, offset: Vec2, size: Vec2) -> bool {
        let mut cell = self.0.borrow_mut();
        cell.viewport = PaneSize {
            width: size.x,
            height: size.y,
        };
        let next = ScrollOffset::new(offset.x, offset.y);
        let moved = next != cell.offset;
        cell.offset = next;
        moved
    }

    pub fn offset(&self) -> ScrollOffset {
        self.0.borrow().offset
    }
}

impl ScrollPane for SharedPane {
    fn scroll_offset(&self) -> ScrollOffset {
        self.offset()
    }

    fn set_scroll_offset(&mut self, offset: ScrollOffset) {
        let mut cell = self.0.borrow_mut();
        cell.offset = offset;
        cell.requested = Some(offset);
    }

    fn viewport_size(&self) -> PaneSize {
        self.0.borrow().viewport
    }
}
