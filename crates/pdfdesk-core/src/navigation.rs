//! Viewer navigation: page, zoom and rotation
//!
//! Also tracks the pending document load. Loads are ticketed so that a
//! completion arriving after the document was replaced or closed is dropped.

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Prev,
    Next,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoomDirection {
    In,
    Out,
}

/// Zoom factor held in quarter steps, 0.5 ..= 3.0
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Zoom(u8);

impl Zoom {
    const MIN_QUARTERS: u8 = 2;
    const MAX_QUARTERS: u8 = 12;

    pub const DEFAULT: Zoom = Zoom(4);
    pub const MIN: Zoom = Zoom(Self::MIN_QUARTERS);
    pub const MAX: Zoom = Zoom(Self::MAX_QUARTERS);

    pub fn scale(self) -> f64 {
        self.0 as f64 * 0.25
    }

    pub fn percent(self) -> u32 {
        self.0 as u32 * 25
    }

    /// Step by 0.25; returns `None` at the bound
    pub fn step(self, direction: ZoomDirection) -> Option<Zoom> {
        match direction {
            ZoomDirection::In if self.0 < Self::MAX_QUARTERS => Some(Zoom(self.0 + 1)),
            ZoomDirection::Out if self.0 > Self::MIN_QUARTERS => Some(Zoom(self.0 - 1)),
            _ => None,
        }
    }
}

impl Default for Zoom {
    fn default() -> Self {
        Zoom::DEFAULT
    }
}

impl Serialize for Zoom {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.scale())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Clockwise by 90°
    pub fn next(self) -> Rotation {
        match self {
            Rotation::Deg0 => Rotation::Deg90,
            Rotation::Deg90 => Rotation::Deg180,
            Rotation::Deg180 => Rotation::Deg270,
            Rotation::Deg270 => Rotation::Deg0,
        }
    }
}

impl Serialize for Rotation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.degrees())
    }
}

/// A page change that the caller must carry out: persist `from`, then load `to`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSwitch {
    pub from: u32,
    pub to: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Navigator {
    page_count: u32,
    current_page: u32,
    zoom: Zoom,
    rotation: Rotation,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self {
            page_count: 0,
            current_page: 1,
            zoom: Zoom::DEFAULT,
            rotation: Rotation::Deg0,
        }
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn zoom(&self) -> Zoom {
        self.zoom
    }

    pub fn zoom_percent(&self) -> u32 {
        self.zoom.percent()
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Record the page count reported by the renderer
    pub fn set_page_count(&mut self, page_count: u32) {
        self.page_count = page_count;
        self.current_page = self.current_page.clamp(1, page_count.max(1));
    }

    pub fn can_go_prev(&self) -> bool {
        self.page_count > 0 && self.current_page > 1
    }

    pub fn can_go_next(&self) -> bool {
        self.current_page < self.page_count
    }

    /// Step one page. `None` at either end or with no pages.
    pub fn go_to_page(&mut self, direction: Direction) -> Option<PageSwitch> {
        let from = self.current_page;
        let to = match direction {
            Direction::Prev if self.can_go_prev() => from - 1,
            Direction::Next if self.can_go_next() => from + 1,
            _ => return None,
        };
        self.current_page = to;
        debug!(from, to, "page switch");
        Some(PageSwitch { from, to })
    }

    /// Returns false when already at the bound
    pub fn set_zoom(&mut self, direction: ZoomDirection) -> bool {
        match self.zoom.step(direction) {
            Some(zoom) => {
                self.zoom = zoom;
                true
            }
            None => false,
        }
    }

    pub fn rotate(&mut self) -> Rotation {
        self.rotation = self.rotation.next();
        self.rotation
    }
}

/// Handle for one pending document load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket(u64);

impl LoadTicket {
    pub fn id(self) -> u64 {
        self.0
    }

    pub fn from_id(id: u64) -> Self {
        LoadTicket(id)
    }
}

/// Generation counter for document loads.
///
/// Only the most recent ticket can complete, and only once.
#[derive(Debug, Clone, Default)]
pub struct LoadTracker {
    generation: u64,
    pending: Option<u64>,
}

impl LoadTracker {
    pub fn begin(&mut self) -> LoadTicket {
        self.generation += 1;
        self.pending = Some(self.generation);
        LoadTicket(self.generation)
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        self.pending == Some(ticket.0)
    }

    /// Consume the ticket if it is still current
    pub fn complete(&mut self, ticket: LoadTicket) -> bool {
        if self.is_current(ticket) {
            self.pending = None;
            true
        } else {
            debug!(ticket = ticket.0, "dropping stale document load");
            false
        }
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }
}
