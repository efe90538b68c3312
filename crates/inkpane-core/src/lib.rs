//! inkpane Core Library
//!
//! Platform-agnostic scene graph, change notification, hit testing and
//! selection for the inkpane interactive drawing engine. Rendering surfaces
//! and pointer interaction live in `inkpane-render`.

pub mod clock;
pub mod context;
pub mod controller;
pub mod element;
pub mod error;
pub mod events;
pub mod geometry;
pub mod index;
pub mod input;
pub mod property;
pub mod scene;
pub mod selection;
pub mod shapes;

pub use clock::{Context, ElementId, Tick};
pub use context::{DrawContext, DrawOp, RecordingContext};
pub use controller::{
    ControlKind, ControlPoint, Cursor, GenericController, HitInfo, LineController,
    MinimumSizeGuard, ShapeController, Snapshot, CONTROL_RADIUS, ROTATE_HANDLE_OFFSET,
};
pub use error::{Error, Result};
pub use events::{Event, EventHandler, EventHub, EventKind, Phase, Subscription};
pub use geometry::Transform;
pub use index::ShapeIndex;
pub use input::{InputEvent, InputKind, KeyInput, Modifiers, MouseButton, PointerInput};
pub use property::{Definition, Paint, PaintRef, PaintState, PaintTarget, Property, PropertyName, SolidColor};
pub use scene::{Scene, EDIT_PANE, MAIN_PANE};
pub use selection::Selection;
pub use shapes::{Ellipse, Group, Line, Rectangle, ShapeContent, ShapeGeometry};
