//! Group content.
//!
//! A group's children live in the arena and are tracked by the scene tree;
//! this struct only holds what a group knows about itself.

use kurbo::Rect;

/// Container for other elements.
///
/// Without explicit bounds a group's bounding box is the union of its
/// children's bounds in its coordinate space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    explicit_bounds: Option<Rect>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    /// A group with a fixed bounding box.
    pub fn with_bounds(bounds: Rect) -> Self {
        Self {
            explicit_bounds: Some(bounds),
        }
    }

    pub fn explicit_bounds(&self) -> Option<Rect> {
        self.explicit_bounds
    }

    pub(crate) fn set_explicit_bounds(&mut self, bounds: Option<Rect>) {
        self.explicit_bounds = bounds;
    }
}
