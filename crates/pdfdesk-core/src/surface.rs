//! Drawing surface abstraction
//!
//! The controller never draws pixels itself. It edits a surface: an ordered
//! set of objects plus selection and free-drawing state. The browser renders
//! a `SceneSurface` onto its overlay canvas after every change.

use crate::annotation::{AnnotationObject, Color};

/// Brush used for free drawing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brush {
    pub color: Color,
    pub width: f64,
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            color: Color::default(),
            width: 2.0,
        }
    }
}

pub trait DrawingSurface {
    fn objects(&self) -> &[AnnotationObject];

    /// Append on top, returning the new object's index
    fn add(&mut self, object: AnnotationObject) -> usize;

    fn object_mut(&mut self, index: usize) -> Option<&mut AnnotationObject>;

    fn remove(&mut self, index: usize) -> Option<AnnotationObject>;

    /// Replace every object; clears selection
    fn replace_all(&mut self, objects: Vec<AnnotationObject>);

    fn clear(&mut self) {
        self.replace_all(Vec::new());
    }

    fn selected(&self) -> Option<usize>;

    fn select(&mut self, index: Option<usize>);

    /// Whether the selected text object takes keyboard input
    fn is_editing_text(&self) -> bool;

    fn set_editing_text(&mut self, editing: bool);

    fn is_drawing_mode(&self) -> bool;

    fn set_drawing_mode(&mut self, on: bool);

    fn brush(&self) -> Brush;

    fn set_brush(&mut self, brush: Brush);
}

/// In-memory surface
#[derive(Debug, Clone, Default)]
pub struct SceneSurface {
    objects: Vec<AnnotationObject>,
    selected: Option<usize>,
    editing_text: bool,
    drawing_mode: bool,
    brush: Brush,
}

impl SceneSurface {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DrawingSurface for SceneSurface {
    fn objects(&self) -> &[AnnotationObject] {
        &self.objects
    }

    fn add(&mut self, object: AnnotationObject) -> usize {
        self.objects.push(object);
        self.objects.len() - 1
    }

    fn object_mut(&mut self, index: usize) -> Option<&mut AnnotationObject> {
        self.objects.get_mut(index)
    }

    fn remove(&mut self, index: usize) -> Option<AnnotationObject> {
        if index >= self.objects.len() {
            return None;
        }
        let removed = self.objects.remove(index);
        self.selected = match self.selected {
            Some(s) if s == index => {
                self.editing_text = false;
                None
            }
            Some(s) if s > index => Some(s - 1),
            other => other,
        };
        Some(removed)
    }

    fn replace_all(&mut self, objects: Vec<AnnotationObject>) {
        self.objects = objects;
        self.selected = None;
        self.editing_text = false;
    }

    fn selected(&self) -> Option<usize> {
        self.selected
    }

    fn select(&mut self, index: Option<usize>) {
        self.selected = index.filter(|&i| i < self.objects.len());
        self.editing_text = false;
    }

    fn is_editing_text(&self) -> bool {
        self.editing_text
    }

    fn set_editing_text(&mut self, editing: bool) {
        let is_text = self
            .selected
            .and_then(|i| self.objects.get(i))
            .is_some_and(|obj| matches!(obj, AnnotationObject::Text { .. }));
        self.editing_text = editing && is_text;
    }

    fn is_drawing_mode(&self) -> bool {
        self.drawing_mode
    }

    fn set_drawing_mode(&mut self, on: bool) {
        self.drawing_mode = on;
        if on {
            self.selected = None;
            self.editing_text = false;
        }
    }

    fn brush(&self) -> Brush {
        self.brush
    }

    fn set_brush(&mut self, brush: Brush) {
        self.brush = brush;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::tests::rect;
    use crate::annotation::Point;

    #[test]
    fn test_remove_shifts_selection() {
        let mut surface = SceneSurface::new();
        surface.add(rect(0.0, 0.0));
        surface.add(rect(1.0, 0.0));
        surface.add(rect(2.0, 0.0));
        surface.select(Some(2));

        surface.remove(0);
        assert_eq!(surface.selected(), Some(1));

        surface.remove(1);
        assert_eq!(surface.selected(), None);
        assert_eq!(surface.objects().len(), 1);
        assert!(surface.remove(5).is_none());
    }

    #[test]
    fn test_select_out_of_range_clears() {
        let mut surface = SceneSurface::new();
        surface.add(rect(0.0, 0.0));
        surface.select(Some(3));
        assert_eq!(surface.selected(), None);
    }

    #[test]
    fn test_text_editing_requires_selected_text() {
        let mut surface = SceneSurface::new();
        surface.add(rect(0.0, 0.0));
        surface.add(AnnotationObject::Text {
            position: Point::new(0.0, 0.0),
            content: "hi".into(),
            color: Color::RED,
            font_size: 16.0,
            font_family: "Arial".into(),
        });

        surface.select(Some(0));
        surface.set_editing_text(true);
        assert!(!surface.is_editing_text());

        surface.select(Some(1));
        surface.set_editing_text(true);
        assert!(surface.is_editing_text());

        surface.set_drawing_mode(true);
        assert!(!surface.is_editing_text());
        assert_eq!(surface.selected(), None);
    }
}
