//! inkpane render layer
//!
//! Canvas-backed panes, the [`Stage`] tying a scene to its panes, the
//! repaint loop and the pointer interaction state machine.

pub mod config;
pub mod damage;
pub mod error;
pub mod interaction;
pub mod pane;
pub mod render_loop;
pub mod stage;
pub mod surface;
pub mod viewport;

pub use config::{SerializableColor, StageConfig};
pub use damage::DamageTracker;
pub use error::{RenderError, RenderResult};
pub use interaction::{
    CreatingShapeState, DefaultState, InteractionMachine, InteractionState, PanningState, StateId, Transition, ZoomingState,
};
pub use pane::{BackgroundPane, DrawSource, Pane, PaneContent, PaneKind, ShapesPane, BACKGROUND_PANE};
pub use render_loop::{FrameScheduler, ManualScheduler, RenderLoop};
pub use stage::Stage;
pub use surface::{RecordingSurfaces, SurfaceFactory};
pub use viewport::Viewport;
