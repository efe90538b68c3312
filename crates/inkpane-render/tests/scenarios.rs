//! End-to-end scenarios driven through the stage and the interaction
//! machine, painted headlessly into recording surfaces.

use inkpane_core::{
    DrawOp, EventKind, InputEvent, KeyInput, PointerInput, Rectangle, Scene, EDIT_PANE, MAIN_PANE,
};
use inkpane_render::{InteractionMachine, RecordingSurfaces, Stage, StageConfig, StateId};
use kurbo::{Point, Rect};
use std::f64::consts::FRAC_PI_4;

const EPS: f64 = 1e-9;

fn stage() -> (Stage, RecordingSurfaces) {
    let surfaces = RecordingSurfaces::new();
    let stage = Stage::new(Scene::new(), surfaces.clone(), StageConfig::default());
    (stage, surfaces)
}

fn down(x: f64, y: f64) -> InputEvent {
    InputEvent::MouseDown(PointerInput::at(Point::new(x, y)))
}

fn moved(x: f64, y: f64) -> InputEvent {
    InputEvent::MouseMove(PointerInput::at(Point::new(x, y)))
}

fn up(x: f64, y: f64) -> InputEvent {
    InputEvent::MouseUp(PointerInput::at(Point::new(x, y)))
}

fn assert_rect_eq(actual: Rect, expected: Rect) {
    assert!(
        (actual.x0 - expected.x0).abs() < EPS
            && (actual.y0 - expected.y0).abs() < EPS
            && (actual.x1 - expected.x1).abs() < EPS
            && (actual.y1 - expected.y1).abs() < EPS,
        "{:?} != {:?}",
        actual,
        expected
    );
}

#[test]
fn test_drag_south_east_handle() {
    let (mut stage, _) = stage();
    let rect = stage
        .add_shape(Rectangle::new(Point::ZERO, 100.0, 50.0).unwrap())
        .unwrap();
    stage.select(rect);

    let hit = stage.hit_selected(Point::new(100.0, 50.0)).unwrap();
    stage.checkpoint(&hit);
    assert!(stage.apply_gesture(&hit, Point::new(100.0, 50.0), Point::new(120.0, 60.0)));

    assert_rect_eq(stage.scene().bounding_box(rect), Rect::new(0.0, 0.0, 120.0, 60.0));
}

#[test]
fn test_drag_south_east_handle_through_machine() {
    let (mut stage, _) = stage();
    let mut machine = InteractionMachine::new();
    let rect = stage
        .add_shape(Rectangle::new(Point::ZERO, 100.0, 50.0).unwrap())
        .unwrap();

    machine.handle(&mut stage, &down(50.0, 25.0)).unwrap();
    machine.handle(&mut stage, &up(50.0, 25.0)).unwrap();
    machine.handle(&mut stage, &down(100.0, 50.0)).unwrap();
    machine.handle(&mut stage, &moved(120.0, 60.0)).unwrap();
    machine.handle(&mut stage, &up(120.0, 60.0)).unwrap();

    assert_rect_eq(stage.scene().bounding_box(rect), Rect::new(0.0, 0.0, 120.0, 60.0));
}

#[test]
fn test_create_shape_by_drag() {
    let (mut stage, _) = stage();
    let mut machine = InteractionMachine::new();
    let shape = machine
        .create_shape(&mut stage, Box::new(Rectangle::new(Point::ZERO, 1.0, 1.0).unwrap()))
        .unwrap();

    machine.handle(&mut stage, &down(10.0, 10.0)).unwrap();
    machine.handle(&mut stage, &moved(60.0, 40.0)).unwrap();
    let state = machine.handle(&mut stage, &up(60.0, 40.0)).unwrap();

    assert_eq!(state, StateId::Default);
    assert!(stage.scene().is_in_scene(shape));
    assert_rect_eq(stage.scene().bounding_box(shape), Rect::new(10.0, 10.0, 60.0, 40.0));
    assert_eq!(stage.scene().pane_of(shape), MAIN_PANE);
    assert!(stage.index().contains(shape));
}

#[test]
fn test_rotated_center_round_trip() {
    let (mut stage, _) = stage();
    let rect = stage
        .add_shape(Rectangle::new(Point::new(20.0, 30.0), 80.0, 40.0).unwrap())
        .unwrap();
    assert!(stage.scene_mut().rotate_to(rect, FRAC_PI_4));

    let scene = stage.scene();
    let center = scene.bounding_box(rect).center();
    let global = scene.global_transform(rect);
    let mapped = global.apply(center);
    let back = global.apply_inverse(mapped).unwrap();
    assert!((back - center).hypot() < EPS);
}

#[test]
fn test_gesture_is_relative_to_checkpoint() {
    let (mut stage, _) = stage();
    let a = stage
        .add_shape(Rectangle::new(Point::ZERO, 100.0, 100.0).unwrap())
        .unwrap();
    let b = stage
        .add_shape(Rectangle::new(Point::ZERO, 100.0, 100.0).unwrap())
        .unwrap();
    let start = Point::new(100.0, 100.0);

    stage.select(a);
    let hit = stage.hit_selected(start).unwrap();
    stage.checkpoint(&hit);
    stage.apply_gesture(&hit, start, Point::new(130.0, 110.0));
    stage.apply_gesture(&hit, start, Point::new(150.0, 140.0));
    let stepped = stage.scene().bounding_box(a);

    stage.clear_selection();
    stage.select(b);
    let hit = stage.hit_selected(start).unwrap();
    stage.checkpoint(&hit);
    stage.apply_gesture(&hit, start, Point::new(150.0, 140.0));

    assert_rect_eq(stepped, stage.scene().bounding_box(b));
    assert_rect_eq(stepped, Rect::new(0.0, 0.0, 150.0, 140.0));
}

#[test]
fn test_index_slot_is_not_aliased() {
    let (mut stage, _) = stage();
    let s = stage
        .add_shape(Rectangle::new(Point::ZERO, 10.0, 10.0).unwrap())
        .unwrap();
    let slot = stage.index().slot_of(s).unwrap();

    stage.select(s);
    stage.delete_selected();
    assert_eq!(stage.index().get(slot), None);

    let t = stage
        .add_shape(Rectangle::new(Point::ZERO, 10.0, 10.0).unwrap())
        .unwrap();
    assert_ne!(s, t);
    assert_eq!(stage.index().slot_of(s), None);
    assert_eq!(stage.index().get(stage.index().slot_of(t).unwrap()), Some(t));
}

#[test]
fn test_vetoed_insertion_leaves_shape_detached() {
    let (mut stage, _) = stage();
    stage.scene().hub().on_before(EventKind::ElementAdded, |_| false);
    assert!(stage.add_shape(Rectangle::new(Point::ZERO, 10.0, 10.0).unwrap()).is_none());
    assert_eq!(stage.scene().len(), 2);
    // Only the layer is indexed.
    assert_eq!(stage.index().len(), 1);
}

#[test]
fn test_resize_below_minimum_is_rejected() {
    let (mut stage, _) = stage();
    let mut machine = InteractionMachine::new();
    let rect = stage
        .add_shape(Rectangle::new(Point::ZERO, 100.0, 100.0).unwrap())
        .unwrap();
    stage.select(rect);

    machine.handle(&mut stage, &down(100.0, 100.0)).unwrap();
    machine.handle(&mut stage, &moved(4.0, 50.0)).unwrap();
    assert_rect_eq(stage.scene().bounding_box(rect), Rect::new(0.0, 0.0, 100.0, 100.0));
    machine.handle(&mut stage, &moved(60.0, 50.0)).unwrap();
    machine.handle(&mut stage, &up(60.0, 50.0)).unwrap();
    assert_rect_eq(stage.scene().bounding_box(rect), Rect::new(0.0, 0.0, 60.0, 50.0));
}

#[test]
fn test_editing_repaints_only_the_edit_pane() {
    let (mut stage, surfaces) = stage();
    let mut machine = InteractionMachine::new();
    let rect = stage
        .add_shape(Rectangle::new(Point::ZERO, 100.0, 100.0).unwrap())
        .unwrap();
    stage.scene_mut().set_fill(rect, Some(inkpane_core::property::solid(peniko::Color::from_rgba8(255, 0, 0, 255))));
    machine.handle(&mut stage, &down(50.0, 50.0)).unwrap();
    stage.render_frame();

    let main = surfaces.surface(MAIN_PANE).unwrap();
    let edit = surfaces.surface(EDIT_PANE).unwrap();
    assert_eq!(main.borrow().count(|op| matches!(op, DrawOp::Fill)), 0);
    assert_eq!(edit.borrow().count(|op| matches!(op, DrawOp::Fill)), 1);

    surfaces.clear_all();
    machine.handle(&mut stage, &moved(70.0, 50.0)).unwrap();
    assert_eq!(stage.render_frame(), 1);
    assert!(main.borrow().ops().is_empty());

    machine.handle(&mut stage, &up(70.0, 50.0)).unwrap();
    machine
        .handle(&mut stage, &InputEvent::KeyDown(KeyInput::new("Escape")))
        .unwrap();
    surfaces.clear_all();
    stage.render_frame();
    assert_eq!(main.borrow().count(|op| matches!(op, DrawOp::Fill)), 1);
    assert_eq!(edit.borrow().count(|op| matches!(op, DrawOp::Fill)), 0);
}
