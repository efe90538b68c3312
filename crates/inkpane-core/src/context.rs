//! Drawing surface abstraction.
//!
//! [`DrawContext`] is the immediate-mode 2D API shapes paint through; hosts
//! back it with a real canvas. [`RecordingContext`] keeps a log of the calls
//! and tracks the transform stack, which is what the tests draw into.

use kurbo::{Affine, BezPath, PathEl, Point, Rect, Size};
use peniko::Color;

/// Immediate-mode drawing surface.
pub trait DrawContext {
    fn size(&self) -> Size;

    fn save(&mut self);
    fn restore(&mut self);
    /// Multiply the current transform by `affine`.
    fn transform(&mut self, affine: Affine);
    /// Replace the current transform.
    fn set_transform(&mut self, affine: Affine);

    fn begin_path(&mut self);
    fn move_to(&mut self, p: Point);
    fn line_to(&mut self, p: Point);
    fn quad_to(&mut self, c: Point, p: Point);
    fn curve_to(&mut self, c1: Point, c2: Point, p: Point);
    fn close_path(&mut self);
    fn rect(&mut self, rect: Rect);
    fn fill(&mut self);
    fn stroke(&mut self);

    fn fill_rect(&mut self, rect: Rect);
    fn stroke_rect(&mut self, rect: Rect);
    fn clear_rect(&mut self, rect: Rect);

    fn set_fill_color(&mut self, color: Color);
    fn set_stroke_color(&mut self, color: Color);
    fn set_line_width(&mut self, width: f64);
    fn set_global_alpha(&mut self, alpha: f64);
    fn set_line_dash(&mut self, dashes: &[f64]);
}

/// Emit a kurbo path as context path calls.
pub fn trace_path(ctx: &mut dyn DrawContext, path: &BezPath) {
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => ctx.move_to(p),
            PathEl::LineTo(p) => ctx.line_to(p),
            PathEl::QuadTo(c, p) => ctx.quad_to(c, p),
            PathEl::CurveTo(c1, c2, p) => ctx.curve_to(c1, c2, p),
            PathEl::ClosePath => ctx.close_path(),
        }
    }
}

/// A recorded drawing call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Save,
    Restore,
    Transform(Affine),
    SetTransform(Affine),
    BeginPath,
    MoveTo(Point),
    LineTo(Point),
    QuadTo(Point, Point),
    CurveTo(Point, Point, Point),
    ClosePath,
    Rect(Rect),
    Fill,
    Stroke,
    FillRect(Rect),
    StrokeRect(Rect),
    ClearRect(Rect),
    FillColor(Color),
    StrokeColor(Color),
    LineWidth(f64),
    GlobalAlpha(f64),
    LineDash(Vec<f64>),
}

/// Headless context recording every call.
#[derive(Debug, Clone)]
pub struct RecordingContext {
    size: Size,
    ops: Vec<DrawOp>,
    current: Affine,
    stack: Vec<Affine>,
}

impl RecordingContext {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            ops: Vec::new(),
            current: Affine::IDENTITY,
            stack: Vec::new(),
        }
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }

    pub fn current_transform(&self) -> Affine {
        self.current
    }

    /// Number of unmatched `save` calls.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn resize(&mut self, size: Size) {
        self.size = size;
    }

    pub fn count(&self, pred: impl Fn(&DrawOp) -> bool) -> usize {
        self.ops.iter().filter(|op| pred(op)).count()
    }
}

impl DrawContext for RecordingContext {
    fn size(&self) -> Size {
        self.size
    }

    fn save(&mut self) {
        self.stack.push(self.current);
        self.ops.push(DrawOp::Save);
    }

    fn restore(&mut self) {
        if let Some(previous) = self.stack.pop() {
            self.current = previous;
        }
        self.ops.push(DrawOp::Restore);
    }

    fn transform(&mut self, affine: Affine) {
        self.current *= affine;
        self.ops.push(DrawOp::Transform(affine));
    }

    fn set_transform(&mut self, affine: Affine) {
        self.current = affine;
        self.ops.push(DrawOp::SetTransform(affine));
    }

    fn begin_path(&mut self) {
        self.ops.push(DrawOp::BeginPath);
    }

    fn move_to(&mut self, p: Point) {
        self.ops.push(DrawOp::MoveTo(p));
    }

    fn line_to(&mut self, p: Point) {
        self.ops.push(DrawOp::LineTo(p));
    }

    fn quad_to(&mut self, c: Point, p: Point) {
        self.ops.push(DrawOp::QuadTo(c, p));
    }

    fn curve_to(&mut self, c1: Point, c2: Point, p: Point) {
        self.ops.push(DrawOp::CurveTo(c1, c2, p));
    }

    fn close_path(&mut self) {
        self.ops.push(DrawOp::ClosePath);
    }

    fn rect(&mut self, rect: Rect) {
        self.ops.push(DrawOp::Rect(rect));
    }

    fn fill(&mut self) {
        self.ops.push(DrawOp::Fill);
    }

    fn stroke(&mut self) {
        self.ops.push(DrawOp::Stroke);
    }

    fn fill_rect(&mut self, rect: Rect) {
        self.ops.push(DrawOp::FillRect(rect));
    }

    fn stroke_rect(&mut self, rect: Rect) {
        self.ops.push(DrawOp::StrokeRect(rect));
    }

    fn clear_rect(&mut self, rect: Rect) {
        self.ops.push(DrawOp::ClearRect(rect));
    }

    fn set_fill_color(&mut self, color: Color) {
        self.ops.push(DrawOp::FillColor(color));
    }

    fn set_stroke_color(&mut self, color: Color) {
        self.ops.push(DrawOp::StrokeColor(color));
    }

    fn set_line_width(&mut self, width: f64) {
        self.ops.push(DrawOp::LineWidth(width));
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.ops.push(DrawOp::GlobalAlpha(alpha));
    }

    fn set_line_dash(&mut self, dashes: &[f64]) {
        self.ops.push(DrawOp::LineDash(dashes.to_vec()));
    }
}
