//! Canvas-backed render panes.
//!
//! A [`Pane`] owns one drawing surface and repaints it only when flagged
//! dirty. What it draws is delegated to a [`PaneContent`]: the scene's
//! shapes assigned to the pane, or the background grid.

use crate::config::StageConfig;
use crate::viewport::Viewport;
use inkpane_core::{DrawContext, ElementId, Scene, Selection, ShapeContent};
use kurbo::{Point, Rect, Size};
use std::fmt;

/// Name of the pane holding the background grid.
pub const BACKGROUND_PANE: &str = "background";

/// Everything pane content may read while drawing.
pub struct DrawSource<'a> {
    pub scene: &'a Scene,
    pub selection: &'a Selection,
    pub config: &'a StageConfig,
}

/// What a pane paints.
pub trait PaneContent {
    /// Draw into `ctx`, which already carries the viewport transform.
    /// `view_bounds` is the visible world rectangle.
    fn draw(&mut self, pane: &str, source: &DrawSource<'_>, view_bounds: Rect, ctx: &mut dyn DrawContext);
}

/// Built-in pane contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneKind {
    Shapes,
    Background,
}

impl PaneKind {
    pub fn create(self) -> Box<dyn PaneContent> {
        match self {
            PaneKind::Shapes => Box::new(ShapesPane::default()),
            PaneKind::Background => Box::new(BackgroundPane),
        }
    }
}

/// One render surface with its own view of the world.
pub struct Pane {
    name: String,
    context: Box<dyn DrawContext>,
    content: Box<dyn PaneContent>,
    viewport: Viewport,
    view_bounds: Rect,
    needs_repaint: bool,
    refs: usize,
    repaints: u64,
}

impl fmt::Debug for Pane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pane")
            .field("name", &self.name)
            .field("view_bounds", &self.view_bounds)
            .field("needs_repaint", &self.needs_repaint)
            .field("refs", &self.refs)
            .finish()
    }
}

impl Pane {
    pub fn new(name: impl Into<String>, context: Box<dyn DrawContext>, content: Box<dyn PaneContent>, viewport: Viewport) -> Self {
        let view_bounds = viewport.view_bounds(context.size());
        Self {
            name: name.into(),
            context,
            content,
            viewport,
            view_bounds,
            needs_repaint: true,
            refs: 1,
            repaints: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> Size {
        self.context.size()
    }

    /// Visible world rectangle.
    pub fn view_bounds(&self) -> Rect {
        self.view_bounds
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn needs_repaint(&self) -> bool {
        self.needs_repaint
    }

    pub fn mark_dirty(&mut self) {
        self.needs_repaint = true;
    }

    /// Number of repaints performed so far.
    pub fn repaints(&self) -> u64 {
        self.repaints
    }

    pub fn refs(&self) -> usize {
        self.refs
    }

    pub(crate) fn retain(&mut self) -> usize {
        self.refs += 1;
        self.refs
    }

    pub(crate) fn release(&mut self) -> usize {
        self.refs = self.refs.saturating_sub(1);
        self.refs
    }

    /// Adopt the stage viewport. Flags a repaint when the mapping changed.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if self.viewport != viewport {
            self.viewport = viewport;
            self.update_view_bounds();
        }
    }

    /// Swap in a new drawing surface, typically after a resize.
    pub(crate) fn replace_surface(&mut self, context: Box<dyn DrawContext>) {
        self.context = context;
        self.update_view_bounds();
    }

    /// Recompute the view bounds after the surface was resized.
    pub fn update_view_bounds(&mut self) {
        self.view_bounds = self.viewport.view_bounds(self.context.size());
        self.needs_repaint = true;
    }

    /// Repaint if dirty or `force`d. Returns whether anything was painted.
    pub fn paint(&mut self, source: &DrawSource<'_>, force: bool) -> bool {
        if !self.needs_repaint && !force {
            return false;
        }
        let ctx = self.context.as_mut();
        ctx.set_transform(self.viewport.transform());
        ctx.clear_rect(self.view_bounds);
        ctx.save();
        self.content.draw(&self.name, source, self.view_bounds, ctx);
        ctx.restore();

        self.needs_repaint = false;
        self.repaints += 1;
        true
    }
}

/// Draws the scene elements assigned to its pane.
#[derive(Debug, Default)]
pub struct ShapesPane {
    /// Elements skipped by culling in the last paint.
    culled: usize,
}

impl ShapesPane {
    pub fn culled(&self) -> usize {
        self.culled
    }

    fn draw_element(&mut self, pane: &str, source: &DrawSource<'_>, view_bounds: Rect, id: ElementId, ctx: &mut dyn DrawContext) {
        let scene = source.scene;
        let Some(shape) = scene.get(id) else {
            return;
        };
        if !touches(scene.world_bounds(id), view_bounds) {
            self.culled += 1;
            return;
        }

        ctx.save();
        ctx.transform(scene.local_transform(id).affine());
        let paint = scene.apply_styles(id, ctx);
        match shape.content() {
            ShapeContent::Leaf(geometry) => {
                if scene.pane_of(id) == pane {
                    geometry.draw(ctx, paint);
                }
            }
            ShapeContent::Group(_) => {
                for child in scene.children(id) {
                    self.draw_element(pane, source, view_bounds, *child, ctx);
                }
            }
        }
        ctx.restore();
    }
}

impl PaneContent for ShapesPane {
    fn draw(&mut self, pane: &str, source: &DrawSource<'_>, view_bounds: Rect, ctx: &mut dyn DrawContext) {
        self.culled = 0;
        let scene = source.scene;
        for layer in scene.layers() {
            self.draw_element(pane, source, view_bounds, *layer, ctx);
        }

        let color = source.config.selection_color.to_color();
        source.selection.for_each(|id| {
            if scene.pane_of(id) != pane || !scene.is_in_scene(id) {
                return;
            }
            if let Some(controller) = scene.controller(id) {
                controller.draw_controls(scene, id, ctx, color);
            }
        });
    }
}

/// Closed overlap test, so zero-width shapes such as straight lines are kept.
fn touches(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

/// Background fill and grid lines in world space.
#[derive(Debug, Default, Clone, Copy)]
pub struct BackgroundPane;

impl BackgroundPane {
    /// Grid line range covering `view_bounds`, snapped to the grid.
    pub fn grid_bounds(view_bounds: Rect, grid_size: f64) -> Rect {
        Rect::new(
            (view_bounds.x0 / grid_size).floor() * grid_size,
            (view_bounds.y0 / grid_size).floor() * grid_size,
            (view_bounds.x1 / grid_size).ceil() * grid_size,
            (view_bounds.y1 / grid_size).ceil() * grid_size,
        )
    }
}

impl PaneContent for BackgroundPane {
    fn draw(&mut self, _pane: &str, source: &DrawSource<'_>, view_bounds: Rect, ctx: &mut dyn DrawContext) {
        let config = source.config;
        ctx.set_fill_color(config.background_color.to_color());
        ctx.fill_rect(view_bounds);

        let grid_size = config.grid_size;
        if grid_size <= 0.0 {
            return;
        }
        let grid = Self::grid_bounds(view_bounds, grid_size);
        ctx.set_stroke_color(config.grid_color.to_color());
        ctx.set_line_width(0.5);
        ctx.begin_path();

        let mut x = grid.x0;
        while x <= grid.x1 {
            ctx.move_to(Point::new(x, grid.y0));
            ctx.line_to(Point::new(x, grid.y1));
            x += grid_size;
        }
        let mut y = grid.y0;
        while y <= grid.y1 {
            ctx.move_to(Point::new(grid.x0, y));
            ctx.line_to(Point::new(grid.x1, y));
            y += grid_size;
        }
        ctx.stroke();
    }
}
