//! Shape controllers: manipulation handles, hit testing and direct
//! manipulation.
//!
//! Every element owns one controller, created lazily by its content. A
//! controller lays out control points in shape space, resolves a world-space
//! pointer into a [`HitInfo`], and applies a pointer delta to the element
//! relative to a [`Snapshot`] taken when the gesture started.

use crate::clock::{ElementId, Tick};
use crate::context::DrawContext;
use crate::events::{Event, EventHandler};
use crate::geometry::contains_inclusive;
use crate::scene::Scene;
use crate::shapes::Line;
use kurbo::{Affine, Point, Rect, Size, Vec2};
use peniko::Color;
use std::cell::RefCell;
use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt;
use std::rc::Rc;

/// Half-width of a control point's hit window, in shape units.
pub const CONTROL_RADIUS: f64 = 5.0;
/// Distance of the rotate handle from the bounding box's right edge.
pub const ROTATE_HANDLE_OFFSET: f64 = 50.0;

/// What a control point or hit does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    Move,
    Size,
    Rotate,
    /// Shape-specific point, such as a line endpoint.
    Control,
}

/// Pointer cursor hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cursor {
    #[default]
    Default,
    Move,
    NResize,
    NeResize,
    EResize,
    SeResize,
    SResize,
    SwResize,
    WResize,
    NwResize,
    Rotate,
    Crosshair,
    Grab,
    Grabbing,
    ZoomIn,
}

impl Cursor {
    /// CSS cursor keyword.
    pub fn css_name(self) -> &'static str {
        match self {
            Cursor::Default => "default",
            Cursor::Move => "move",
            Cursor::NResize => "n-resize",
            Cursor::NeResize => "ne-resize",
            Cursor::EResize => "e-resize",
            Cursor::SeResize => "se-resize",
            Cursor::SResize => "s-resize",
            Cursor::SwResize => "sw-resize",
            Cursor::WResize => "w-resize",
            Cursor::NwResize => "nw-resize",
            Cursor::Rotate => "alias",
            Cursor::Crosshair => "crosshair",
            Cursor::Grab => "grab",
            Cursor::Grabbing => "grabbing",
            Cursor::ZoomIn => "zoom-in",
        }
    }
}

/// Resize cursors by size handle index, clockwise from north.
const SIZE_CURSORS: [Cursor; 8] = [
    Cursor::NResize,
    Cursor::NeResize,
    Cursor::EResize,
    Cursor::SeResize,
    Cursor::SResize,
    Cursor::SwResize,
    Cursor::WResize,
    Cursor::NwResize,
];

/// A manipulation handle in shape space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlPoint {
    pub kind: ControlKind,
    pub index: usize,
    pub position: Point,
    pub cursor: Cursor,
}

/// Result of a hit test against one element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitInfo {
    pub shape: ElementId,
    pub kind: ControlKind,
    pub index: usize,
    pub cursor: Cursor,
}

impl HitInfo {
    /// A body hit that drags the whole element.
    pub fn moving(shape: ElementId) -> Self {
        Self {
            shape,
            kind: ControlKind::Move,
            index: 0,
            cursor: Cursor::Move,
        }
    }

    fn from_control(shape: ElementId, point: &ControlPoint) -> Self {
        Self {
            shape,
            kind: point.kind,
            index: point.index,
            cursor: point.cursor,
        }
    }
}

/// Element state captured when a gesture starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub bounding_box: Rect,
    pub rotation: f64,
    pub scale: Vec2,
    /// Element space to world.
    pub global: Affine,
    /// Placement frame (no rotation or scale) to world.
    pub placement: Affine,
    /// Shape-specific points, such as line endpoints.
    pub points: Vec<Point>,
}

impl Snapshot {
    /// Capture the generic state of `shape`.
    pub fn capture(scene: &Scene, shape: ElementId) -> Self {
        Self {
            bounding_box: scene.bounding_box(shape),
            rotation: scene.rotation(shape),
            scale: scene.scale(shape),
            global: scene.global_transform(shape).affine(),
            placement: scene.placement_transform(shape).affine(),
            points: Vec::new(),
        }
    }

    /// Pointer delta mapped into the element's own space.
    pub fn local_delta(&self, down: Point, current: Point) -> Option<Vec2> {
        delta_in(self.global, down, current)
    }

    /// Pointer delta mapped into the placement frame.
    pub fn placement_delta(&self, down: Point, current: Point) -> Option<Vec2> {
        delta_in(self.placement, down, current)
    }
}

fn delta_in(frame: Affine, down: Point, current: Point) -> Option<Vec2> {
    if !crate::geometry::is_invertible(frame) {
        return None;
    }
    let inverse = frame.inverse();
    Some(inverse * current - inverse * down)
}

/// Control points memoized per transform stamp and bounding box.
#[derive(Debug, Default)]
pub struct ControlPointCache {
    entry: RefCell<Option<(Tick, Rect, Rc<[ControlPoint]>)>>,
}

impl ControlPointCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(&self, stamp: Tick, bbox: Rect, build: impl FnOnce() -> Vec<ControlPoint>) -> Rc<[ControlPoint]> {
        if let Some((cached_stamp, cached_bbox, points)) = &*self.entry.borrow() {
            if *cached_stamp == stamp && *cached_bbox == bbox {
                return Rc::clone(points);
            }
        }
        let points: Rc<[ControlPoint]> = build().into();
        *self.entry.borrow_mut() = Some((stamp, bbox, Rc::clone(&points)));
        points
    }

    pub fn invalidate(&self) {
        self.entry.borrow_mut().take();
    }
}

/// Eight size handles clockwise from north, then the rotate handle.
pub fn box_control_points(bbox: Rect, rotate_offset: f64) -> Vec<ControlPoint> {
    let center = bbox.center();
    let positions = [
        Point::new(center.x, bbox.y0),
        Point::new(bbox.x1, bbox.y0),
        Point::new(bbox.x1, center.y),
        Point::new(bbox.x1, bbox.y1),
        Point::new(center.x, bbox.y1),
        Point::new(bbox.x0, bbox.y1),
        Point::new(bbox.x0, center.y),
        Point::new(bbox.x0, bbox.y0),
    ];
    let mut points: Vec<ControlPoint> = positions
        .iter()
        .zip(SIZE_CURSORS)
        .enumerate()
        .map(|(index, (position, cursor))| ControlPoint {
            kind: ControlKind::Size,
            index,
            position: *position,
            cursor,
        })
        .collect();
    points.push(ControlPoint {
        kind: ControlKind::Rotate,
        index: 0,
        position: Point::new(bbox.x1 + rotate_offset, center.y),
        cursor: Cursor::Rotate,
    });
    points
}

/// Resize `bbox` by dragging size handle `index` by `delta`.
///
/// The result is not normalized; a handle dragged past the opposite edge
/// yields negative extent.
pub fn resize_by_handle(bbox: Rect, index: usize, delta: Vec2) -> Rect {
    let Rect { mut x0, mut y0, mut x1, mut y1 } = bbox;
    match index {
        0 => y0 += delta.y,
        1 => {
            y0 += delta.y;
            x1 += delta.x;
        }
        2 => x1 += delta.x,
        3 => {
            x1 += delta.x;
            y1 += delta.y;
        }
        4 => y1 += delta.y,
        5 => {
            x0 += delta.x;
            y1 += delta.y;
        }
        6 => x0 += delta.x,
        7 => {
            x0 += delta.x;
            y0 += delta.y;
        }
        _ => {}
    }
    Rect { x0, y0, x1, y1 }
}

/// Angle of the vector `(dx, dy)`, `None` for the zero vector.
pub fn rotation_angle(dx: f64, dy: f64) -> Option<f64> {
    if dx > 0.0 {
        Some((dy / dx).atan())
    } else if dx < 0.0 {
        Some((dy / dx).atan() + PI)
    } else if dy > 0.0 {
        Some(FRAC_PI_2)
    } else if dy < 0.0 {
        Some(-FRAC_PI_2)
    } else {
        None
    }
}

/// Manipulation behavior for one element.
pub trait ShapeController: fmt::Debug {
    fn cache(&self) -> &ControlPointCache;

    /// Lay out control points in shape space.
    fn build_control_points(&self, scene: &Scene, shape: ElementId) -> Vec<ControlPoint> {
        box_control_points(scene.bounding_box(shape), scene.rotate_handle_offset())
    }

    fn control_points(&self, scene: &Scene, shape: ElementId) -> Rc<[ControlPoint]> {
        let Some(element) = scene.get(shape) else {
            return Rc::from(Vec::new());
        };
        let stamp = element.transformable().last_transformed();
        let bbox = scene.bounding_box(shape);
        self.cache().get_or_build(stamp, bbox, || self.build_control_points(scene, shape))
    }

    /// Hit test a world-space point. Control points are tested topmost
    /// first, then the body.
    fn hit_info(&self, scene: &Scene, shape: ElementId, point: Point) -> Option<HitInfo> {
        let local = scene.global_to_local(shape, point)?;
        let radius = scene.control_radius();
        let points = self.control_points(scene, shape);
        for control in points.iter().rev() {
            if (local.x - control.position.x).abs() <= radius && (local.y - control.position.y).abs() <= radius {
                return Some(HitInfo::from_control(shape, control));
            }
        }
        self.hit_body(scene, shape, point, local)
    }

    fn hit_body(&self, scene: &Scene, shape: ElementId, _point: Point, local: Point) -> Option<HitInfo> {
        contains_inclusive(scene.bounding_box(shape), local).then(|| HitInfo::moving(shape))
    }

    /// Capture the state a gesture on `shape` starts from.
    fn snapshot(&self, scene: &Scene, shape: ElementId, _hit: Option<&HitInfo>) -> Snapshot {
        Snapshot::capture(scene, shape)
    }

    /// Apply the pointer movement `down -> current` to the element. Returns
    /// `false` if nothing changed or the change was vetoed.
    fn apply_hit_changes(&self, scene: &mut Scene, hit: &HitInfo, saved: &Snapshot, down: Point, current: Point) -> bool {
        match hit.kind {
            ControlKind::Move => apply_move(scene, hit.shape, saved, down, current),
            ControlKind::Size => apply_resize(scene, hit.shape, hit.index, saved, down, current),
            ControlKind::Rotate => apply_rotate(scene, hit.shape, saved, current),
            ControlKind::Control => false,
        }
    }

    /// Draw the selection outline and handles in world space.
    fn draw_controls(&self, scene: &Scene, shape: ElementId, ctx: &mut dyn DrawContext, color: Color) {
        let global = scene.global_transform(shape).affine();
        let bbox = scene.bounding_box(shape);
        draw_outline(ctx, global, bbox, color);
        draw_handles(ctx, global, &self.control_points(scene, shape), scene.control_radius(), color);
    }
}

/// Translate the saved bounds by the pointer delta in the placement frame.
pub fn apply_move(scene: &mut Scene, shape: ElementId, saved: &Snapshot, down: Point, current: Point) -> bool {
    let Some(delta) = saved.placement_delta(down, current) else {
        return false;
    };
    scene.set_bounds(shape, saved.bounding_box + delta)
}

/// Drag one size handle by the pointer delta in element space.
pub fn apply_resize(scene: &mut Scene, shape: ElementId, index: usize, saved: &Snapshot, down: Point, current: Point) -> bool {
    let Some(delta) = saved.local_delta(down, current) else {
        return false;
    };
    scene.set_bounds(shape, resize_by_handle(saved.bounding_box, index, delta))
}

/// Point the rotate handle at the pointer.
pub fn apply_rotate(scene: &mut Scene, shape: ElementId, saved: &Snapshot, current: Point) -> bool {
    if !crate::geometry::is_invertible(saved.placement) {
        return false;
    }
    let pointer = saved.placement.inverse() * current;
    let center = Point::new(
        saved.bounding_box.x0 + saved.bounding_box.width() * saved.scale.x / 2.0,
        saved.bounding_box.y0 + saved.bounding_box.height() * saved.scale.y / 2.0,
    );
    match rotation_angle(pointer.x - center.x, pointer.y - center.y) {
        Some(angle) => scene.rotate_to(shape, angle),
        None => false,
    }
}

fn draw_outline(ctx: &mut dyn DrawContext, global: Affine, bbox: Rect, color: Color) {
    ctx.save();
    ctx.set_stroke_color(color);
    ctx.set_line_width(1.0);
    ctx.set_line_dash(&[4.0, 4.0]);
    ctx.begin_path();
    ctx.move_to(global * Point::new(bbox.x0, bbox.y0));
    ctx.line_to(global * Point::new(bbox.x1, bbox.y0));
    ctx.line_to(global * Point::new(bbox.x1, bbox.y1));
    ctx.line_to(global * Point::new(bbox.x0, bbox.y1));
    ctx.close_path();
    ctx.stroke();
    ctx.restore();
}

fn draw_handles(ctx: &mut dyn DrawContext, global: Affine, points: &[ControlPoint], radius: f64, color: Color) {
    ctx.save();
    ctx.set_line_width(1.0);
    ctx.set_line_dash(&[]);
    ctx.set_stroke_color(color);
    ctx.set_fill_color(Color::from_rgba8(255, 255, 255, 255));
    for control in points {
        let center = global * control.position;
        let rect = Rect::from_center_size(center, Size::new(radius * 2.0, radius * 2.0));
        ctx.fill_rect(rect);
        ctx.stroke_rect(rect);
    }
    ctx.restore();
}

/// Controller for boxed shapes and groups.
#[derive(Debug, Default)]
pub struct GenericController {
    cache: ControlPointCache,
}

impl GenericController {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ShapeController for GenericController {
    fn cache(&self) -> &ControlPointCache {
        &self.cache
    }
}

/// Controller for [`Line`]: two endpoint handles instead of a box.
#[derive(Debug, Default)]
pub struct LineController {
    cache: ControlPointCache,
}

impl LineController {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ShapeController for LineController {
    fn cache(&self) -> &ControlPointCache {
        &self.cache
    }

    fn build_control_points(&self, scene: &Scene, shape: ElementId) -> Vec<ControlPoint> {
        match scene.geometry::<Line>(shape) {
            Some(line) => [line.start, line.end]
                .into_iter()
                .enumerate()
                .map(|(index, position)| ControlPoint {
                    kind: ControlKind::Control,
                    index,
                    position,
                    cursor: Cursor::Crosshair,
                })
                .collect(),
            None => box_control_points(scene.bounding_box(shape), scene.rotate_handle_offset()),
        }
    }

    fn hit_body(&self, scene: &Scene, shape: ElementId, point: Point, _local: Point) -> Option<HitInfo> {
        scene.contains_point(shape, point).then(|| HitInfo::moving(shape))
    }

    fn snapshot(&self, scene: &Scene, shape: ElementId, _hit: Option<&HitInfo>) -> Snapshot {
        let mut snapshot = Snapshot::capture(scene, shape);
        if let Some(line) = scene.geometry::<Line>(shape) {
            snapshot.points = vec![line.start, line.end];
        }
        snapshot
    }

    fn apply_hit_changes(&self, scene: &mut Scene, hit: &HitInfo, saved: &Snapshot, down: Point, current: Point) -> bool {
        match hit.kind {
            ControlKind::Control => {
                let (Some(delta), Some(origin)) = (saved.local_delta(down, current), saved.points.get(hit.index)) else {
                    return false;
                };
                let target = *origin + delta;
                scene
                    .with_geometry_mut::<Line, _>(hit.shape, |line| line.set_endpoint(hit.index, target))
                    .is_some()
            }
            ControlKind::Move => apply_move(scene, hit.shape, saved, down, current),
            ControlKind::Size => apply_resize(scene, hit.shape, hit.index, saved, down, current),
            ControlKind::Rotate => apply_rotate(scene, hit.shape, saved, current),
        }
    }

    fn draw_controls(&self, scene: &Scene, shape: ElementId, ctx: &mut dyn DrawContext, color: Color) {
        let global = scene.global_transform(shape).affine();
        draw_handles(ctx, global, &self.control_points(scene, shape), scene.control_radius(), color);
    }
}

/// Vetoes bounds and scale changes that would shrink a dimension below a
/// minimum. Growing an undersized element is allowed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimumSizeGuard {
    min: f64,
}

impl MinimumSizeGuard {
    pub fn new(min: f64) -> Self {
        Self { min }
    }

    /// Guard sized to twice the control radius.
    pub fn for_radius(radius: f64) -> Self {
        Self::new(radius * 2.0)
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn allows(&self, old: Size, new: Size) -> bool {
        let shrinks_below = |old: f64, new: f64| new < self.min && new < old;
        !shrinks_below(old.width, new.width) && !shrinks_below(old.height, new.height)
    }
}

impl EventHandler for MinimumSizeGuard {
    fn before(&mut self, event: &Event) -> bool {
        match event {
            Event::BoundsChanged { old, new, .. } => self.allows(
                Size::new(old.width(), old.height()),
                Size::new(new.width(), new.height()),
            ),
            Event::ScaleChanged { old, new, bounds, .. } => self.allows(
                Size::new(bounds.width() * old.x, bounds.height() * old.y),
                Size::new(bounds.width() * new.x, bounds.height() * new.y),
            ),
            _ => true,
        }
    }
}
