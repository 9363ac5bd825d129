//! Annotation tool state machine
//!
//! `AnnotationController` binds an optional drawing surface to the current
//! page and owns the page annotation store. Every surface operation is a
//! silent no-op while no surface is attached.

use crate::annotation::{AnnotationObject, Color, Point, Size};
use crate::error::AnnotateError;
use crate::store::PageAnnotationStore;
use crate::surface::{Brush, DrawingSurface};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

pub const DEFAULT_ANCHOR: Point = Point::new(100.0, 100.0);
pub const DEFAULT_TEXT: &str = "Click to edit text";
pub const DEFAULT_FONT_SIZE: f64 = 16.0;
pub const DEFAULT_FONT_FAMILY: &str = "Arial";
pub const DEFAULT_STROKE_WIDTH: f64 = 2.0;
pub const DEFAULT_RECT_SIZE: Size = Size {
    width: 100.0,
    height: 60.0,
};
pub const DEFAULT_CIRCLE_RADIUS: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    #[default]
    Select,
    Text,
    Rectangle,
    Circle,
    Freehand,
    /// Immediate action; never becomes the active tool
    Eraser,
}

impl Tool {
    pub fn as_str(self) -> &'static str {
        match self {
            Tool::Select => "select",
            Tool::Text => "text",
            Tool::Rectangle => "rectangle",
            Tool::Circle => "circle",
            Tool::Freehand => "freehand",
            Tool::Eraser => "eraser",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tool {
    type Err = AnnotateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "select" | "pointer" => Ok(Tool::Select),
            "text" => Ok(Tool::Text),
            "rectangle" | "rect" => Ok(Tool::Rectangle),
            "circle" => Ok(Tool::Circle),
            "freehand" | "draw" => Ok(Tool::Freehand),
            "eraser" => Ok(Tool::Eraser),
            _ => Err(AnnotateError::UnknownTool(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default)]
enum Gesture {
    #[default]
    Idle,
    Stroke(Vec<Point>),
    Drag {
        last: Point,
    },
}

pub struct AnnotationController<S> {
    surface: Option<S>,
    store: PageAnnotationStore,
    page: u32,
    active_tool: Tool,
    active_color: Color,
    gesture: Gesture,
}

impl<S: DrawingSurface> Default for AnnotationController<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: DrawingSurface> AnnotationController<S> {
    /// A controller without a surface, bound to page 1
    pub fn new() -> Self {
        Self {
            surface: None,
            store: PageAnnotationStore::new(),
            page: 1,
            active_tool: Tool::Select,
            active_color: Color::default(),
            gesture: Gesture::Idle,
        }
    }

    pub fn with_surface(surface: S) -> Self {
        let mut controller = Self::new();
        controller.attach(surface);
        controller
    }

    /// Attach a surface and show the bound page on it
    pub fn attach(&mut self, mut surface: S) {
        surface.replace_all(self.store.load_page(self.page));
        surface.set_drawing_mode(self.active_tool == Tool::Freehand);
        surface.set_brush(self.brush());
        self.surface = Some(surface);
    }

    /// Persist the bound page and hand the surface back
    pub fn detach(&mut self) -> Option<S> {
        self.persist();
        self.gesture = Gesture::Idle;
        self.surface.take()
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn store(&self) -> &PageAnnotationStore {
        &self.store
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn active_tool(&self) -> Tool {
        self.active_tool
    }

    pub fn active_color(&self) -> Color {
        self.active_color
    }

    /// Objects on the attached surface (empty without one)
    pub fn objects(&self) -> &[AnnotationObject] {
        self.surface.as_ref().map(|s| s.objects()).unwrap_or(&[])
    }

    fn brush(&self) -> Brush {
        Brush {
            color: self.active_color,
            width: DEFAULT_STROKE_WIDTH,
        }
    }

    /// Apply a tool. Returns false when nothing happened (no surface).
    ///
    /// Text, rectangle and circle immediately create one default object.
    /// The eraser clears the bound page, writes the empty page to the store
    /// and keeps the previous tool active.
    pub fn select_tool(&mut self, tool: Tool) -> bool {
        let brush = self.brush();
        let Some(surface) = self.surface.as_mut() else {
            return false;
        };
        self.gesture = Gesture::Idle;

        if tool == Tool::Eraser {
            surface.clear();
            self.store.save_page(self.page, Vec::new());
            debug!(page = self.page, "erased page annotations");
            return true;
        }

        self.active_tool = tool;
        surface.set_drawing_mode(tool == Tool::Freehand);
        if tool == Tool::Freehand {
            surface.set_brush(brush);
        }

        match tool {
            Tool::Text => {
                let index = surface.add(AnnotationObject::Text {
                    position: DEFAULT_ANCHOR,
                    content: DEFAULT_TEXT.to_string(),
                    color: self.active_color,
                    font_size: DEFAULT_FONT_SIZE,
                    font_family: DEFAULT_FONT_FAMILY.to_string(),
                });
                surface.select(Some(index));
                surface.set_editing_text(true);
            }
            Tool::Rectangle => {
                surface.add(AnnotationObject::Rectangle {
                    position: DEFAULT_ANCHOR,
                    size: DEFAULT_RECT_SIZE,
                    stroke_color: self.active_color,
                    stroke_width: DEFAULT_STROKE_WIDTH,
                });
            }
            Tool::Circle => {
                surface.add(AnnotationObject::Circle {
                    position: DEFAULT_ANCHOR,
                    radius: DEFAULT_CIRCLE_RADIUS,
                    stroke_color: self.active_color,
                    stroke_width: DEFAULT_STROKE_WIDTH,
                });
            }
            Tool::Select | Tool::Freehand | Tool::Eraser => {}
        }
        true
    }

    /// Change the active color. Existing objects keep theirs; while free
    /// drawing, later strokes use the new color.
    pub fn set_color(&mut self, color: Color) {
        self.active_color = color;
        let brush = self.brush();
        if self.active_tool == Tool::Freehand {
            if let Some(surface) = self.surface.as_mut() {
                surface.set_brush(brush);
            }
        }
    }

    pub fn pointer_down(&mut self, at: Point) {
        let Some(surface) = self.surface.as_ref() else {
            return;
        };
        if surface.is_drawing_mode() {
            self.gesture = Gesture::Stroke(vec![at]);
        } else if self.select_at(at).is_some() {
            self.gesture = Gesture::Drag { last: at };
        }
    }

    pub fn pointer_move(&mut self, to: Point) {
        let delta = match &mut self.gesture {
            Gesture::Idle => None,
            Gesture::Stroke(points) => {
                points.push(to);
                None
            }
            Gesture::Drag { last } => {
                let delta = (to.x - last.x, to.y - last.y);
                *last = to;
                Some(delta)
            }
        };
        if let Some((dx, dy)) = delta {
            self.move_selected(dx, dy);
        }
    }

    /// Finish the current gesture. A finished stroke becomes one path object;
    /// its index is returned.
    pub fn pointer_up(&mut self) -> Option<usize> {
        let gesture = std::mem::take(&mut self.gesture);
        let surface = self.surface.as_mut()?;
        match gesture {
            Gesture::Stroke(points) if surface.is_drawing_mode() => {
                let brush = surface.brush();
                Some(surface.add(AnnotationObject::FreehandPath {
                    points,
                    stroke_color: brush.color,
                    stroke_width: brush.width,
                }))
            }
            _ => None,
        }
    }

    /// Select the topmost object under `at` (select mode only)
    pub fn select_at(&mut self, at: Point) -> Option<usize> {
        if self.active_tool != Tool::Select {
            return None;
        }
        let surface = self.surface.as_mut()?;
        let hit = surface.objects().iter().rposition(|obj| obj.contains(at));
        surface.select(hit);
        hit
    }

    fn selected_mut(&mut self) -> Option<&mut AnnotationObject> {
        let surface = self.surface.as_mut()?;
        let index = surface.selected()?;
        surface.object_mut(index)
    }

    pub fn move_selected(&mut self, dx: f64, dy: f64) -> bool {
        self.selected_mut().map(|obj| obj.translate(dx, dy)).is_some()
    }

    pub fn resize_selected(&mut self, factor: f64) -> bool {
        self.selected_mut().is_some_and(|obj| obj.scale(factor))
    }

    pub fn recolor_selected(&mut self, color: Color) -> bool {
        self.selected_mut().map(|obj| obj.set_color(color)).is_some()
    }

    /// Replace the content of the selected text object
    pub fn edit_text(&mut self, text: &str) -> bool {
        match self.selected_mut() {
            Some(AnnotationObject::Text { content, .. }) => {
                *content = text.to_string();
                true
            }
            _ => false,
        }
    }

    pub fn delete_selected(&mut self) -> Option<AnnotationObject> {
        let surface = self.surface.as_mut()?;
        let index = surface.selected()?;
        surface.remove(index)
    }

    /// Write the surface's objects to the store under the bound page
    pub fn persist(&mut self) {
        if let Some(surface) = self.surface.as_ref() {
            self.store.save_page(self.page, surface.objects().to_vec());
        }
    }

    /// Persist the bound page, then bind `page` and load its annotations
    pub fn switch_page(&mut self, page: u32) {
        self.persist();
        self.page = page;
        self.gesture = Gesture::Idle;
        if let Some(surface) = self.surface.as_mut() {
            surface.replace_all(self.store.load_page(page));
        }
    }

    /// Forget every page and return to the initial tool state
    pub fn reset(&mut self) {
        self.store.clear();
        self.page = 1;
        self.active_tool = Tool::Select;
        self.active_color = Color::default();
        self.gesture = Gesture::Idle;
        let brush = self.brush();
        if let Some(surface) = self.surface.as_mut() {
            surface.clear();
            surface.set_drawing_mode(false);
            surface.set_brush(brush);
        }
    }

    /// Replace the store, e.g. with annotations restored from JSON
    pub fn restore(&mut self, store: PageAnnotationStore) {
        self.store = store;
        if let Some(surface) = self.surface.as_mut() {
            surface.replace_all(self.store.load_page(self.page));
        }
    }
}
