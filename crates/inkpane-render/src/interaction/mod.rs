//! Pointer and keyboard interaction states.
//!
//! An [`InteractionMachine`] routes each [`InputEvent`] to the handler of
//! the active state. Handlers answer with a [`Transition`]; the machine
//! checks it against the transition table, exits the old state and enters
//! the new one. States acquire the panes they need on entry and release
//! them on exit.

mod creating;
mod default;
mod panning;
mod zooming;

pub use creating::CreatingShapeState;
pub use default::DefaultState;
pub use panning::PanningState;
pub use zooming::ZoomingState;

use crate::error::{RenderError, RenderResult};
use crate::stage::Stage;
use inkpane_core::{ElementId, InputEvent, KeyInput, Modifiers, PointerInput, ShapeGeometry};
use kurbo::{Point, Vec2};
use std::collections::HashMap;

/// Interaction state identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateId {
    /// Selection and direct manipulation.
    Default,
    Panning,
    Zooming,
    CreatingShape,
}

impl StateId {
    /// The default state reaches every mode; modes only return to it.
    pub fn can_transition_to(self, to: StateId) -> bool {
        match (self, to) {
            (StateId::Default, StateId::Default) => false,
            (StateId::Default, _) => true,
            (_, StateId::Default) => true,
            (StateId::Panning | StateId::Zooming | StateId::CreatingShape, _) => false,
        }
    }
}

/// What a handler asks the machine to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transition {
    #[default]
    Stay,
    To(StateId),
    /// Return to the machine's root state.
    Root,
}

/// One interaction mode. Every handler defaults to doing nothing.
pub trait InteractionState {
    fn id(&self) -> StateId;

    fn enter(&mut self, _stage: &mut Stage) -> RenderResult<()> {
        Ok(())
    }

    fn exit(&mut self, _stage: &mut Stage) -> RenderResult<()> {
        Ok(())
    }

    /// Take charge of a freshly created, still detached shape. States that
    /// do not create shapes refuse.
    fn begin_shape(&mut self, _stage: &mut Stage, _shape: ElementId) -> bool {
        false
    }

    fn mouse_down(&mut self, _stage: &mut Stage, _input: &PointerInput) -> Transition {
        Transition::Stay
    }

    fn mouse_up(&mut self, _stage: &mut Stage, _input: &PointerInput) -> Transition {
        Transition::Stay
    }

    fn mouse_move(&mut self, _stage: &mut Stage, _input: &PointerInput) -> Transition {
        Transition::Stay
    }

    fn mouse_enter(&mut self, _stage: &mut Stage, _input: &PointerInput) -> Transition {
        Transition::Stay
    }

    fn mouse_leave(&mut self, _stage: &mut Stage, _input: &PointerInput) -> Transition {
        Transition::Stay
    }

    fn mouse_over(&mut self, _stage: &mut Stage, _input: &PointerInput) -> Transition {
        Transition::Stay
    }

    fn mouse_out(&mut self, _stage: &mut Stage, _input: &PointerInput) -> Transition {
        Transition::Stay
    }

    fn wheel(&mut self, _stage: &mut Stage, _position: Point, _delta: Vec2, _modifiers: Modifiers) -> Transition {
        Transition::Stay
    }

    fn key_down(&mut self, _stage: &mut Stage, _input: &KeyInput) -> Transition {
        Transition::Stay
    }

    fn key_up(&mut self, _stage: &mut Stage, _input: &KeyInput) -> Transition {
        Transition::Stay
    }

    fn key_press(&mut self, _stage: &mut Stage, _input: &KeyInput) -> Transition {
        Transition::Stay
    }
}

/// Registry of interaction states with one active state.
pub struct InteractionMachine {
    states: HashMap<StateId, Box<dyn InteractionState>>,
    current: StateId,
    root: StateId,
}

impl std::fmt::Debug for InteractionMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionMachine")
            .field("current", &self.current)
            .field("root", &self.root)
            .field("states", &self.states.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for InteractionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionMachine {
    /// Machine with the four built-in states, rooted at [`StateId::Default`].
    pub fn new() -> Self {
        let mut machine = Self::empty(StateId::Default);
        machine.register(Box::new(DefaultState::default()));
        machine.register(Box::new(PanningState::default()));
        machine.register(Box::new(ZoomingState::default()));
        machine.register(Box::new(CreatingShapeState::default()));
        machine
    }

    /// Machine with no states registered. `root` becomes current once it is
    /// registered.
    pub fn empty(root: StateId) -> Self {
        Self {
            states: HashMap::new(),
            current: root,
            root,
        }
    }

    /// Register a state, replacing any state with the same id.
    pub fn register(&mut self, state: Box<dyn InteractionState>) -> Option<Box<dyn InteractionState>> {
        self.states.insert(state.id(), state)
    }

    pub fn is_registered(&self, id: StateId) -> bool {
        self.states.contains_key(&id)
    }

    pub fn current(&self) -> StateId {
        self.current
    }

    pub fn root(&self) -> StateId {
        self.root
    }

    /// Route `event` to the active state and apply the transition it asks
    /// for. Returns the state active afterwards.
    pub fn handle(&mut self, stage: &mut Stage, event: &InputEvent) -> RenderResult<StateId> {
        let state = self
            .states
            .get_mut(&self.current)
            .ok_or(RenderError::UnregisteredState(self.current))?;
        let transition = match event {
            InputEvent::MouseDown(input) => state.mouse_down(stage, input),
            InputEvent::MouseUp(input) => state.mouse_up(stage, input),
            InputEvent::MouseMove(input) => state.mouse_move(stage, input),
            InputEvent::MouseEnter(input) => state.mouse_enter(stage, input),
            InputEvent::MouseLeave(input) => state.mouse_leave(stage, input),
            InputEvent::MouseOver(input) => state.mouse_over(stage, input),
            InputEvent::MouseOut(input) => state.mouse_out(stage, input),
            InputEvent::Wheel {
                position,
                delta,
                modifiers,
            } => state.wheel(stage, *position, *delta, *modifiers),
            InputEvent::KeyDown(input) => state.key_down(stage, input),
            InputEvent::KeyUp(input) => state.key_up(stage, input),
            InputEvent::KeyPress(input) => state.key_press(stage, input),
        };

        match transition {
            Transition::Stay => {}
            Transition::To(next) => self.transition_to(stage, next)?,
            Transition::Root => self.transition_to(stage, self.root)?,
        }
        Ok(self.current)
    }

    /// Switch to `next`, running the exit and enter hooks. Switching to the
    /// active state is a no-op.
    pub fn transition_to(&mut self, stage: &mut Stage, next: StateId) -> RenderResult<()> {
        if next == self.current {
            return Ok(());
        }
        if !self.states.contains_key(&next) {
            return Err(RenderError::UnregisteredState(next));
        }
        if !self.current.can_transition_to(next) {
            log::warn!("Illegal transition {:?} -> {:?}", self.current, next);
            return Err(RenderError::IllegalTransition {
                from: self.current,
                to: next,
            });
        }

        if let Some(state) = self.states.get_mut(&self.current) {
            state.exit(stage)?;
        }
        let previous = self.current;
        self.current = next;
        if let Some(state) = self.states.get_mut(&next) {
            state.enter(stage)?;
        }
        log::debug!("Interaction state {:?} -> {:?}", previous, next);
        Ok(())
    }

    /// Create a detached shape and enter [`StateId::CreatingShape`] to
    /// size it with the pointer.
    pub fn create_shape(&mut self, stage: &mut Stage, geometry: Box<dyn ShapeGeometry>) -> RenderResult<ElementId> {
        self.transition_to(stage, StateId::CreatingShape)?;
        let shape = stage.create_detached(geometry);
        let accepted = self
            .states
            .get_mut(&StateId::CreatingShape)
            .is_some_and(|state| state.begin_shape(stage, shape));
        if !accepted {
            stage.discard(shape);
            self.transition_to(stage, self.root)?;
            return Err(RenderError::UnregisteredState(StateId::CreatingShape));
        }
        Ok(shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StageConfig;
    use crate::surface::RecordingSurfaces;
    use inkpane_core::{Rectangle, Scene};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn stage() -> Stage {
        Stage::new(Scene::new(), RecordingSurfaces::new(), StageConfig::default())
    }

    fn key(key: &str) -> InputEvent {
        InputEvent::KeyDown(KeyInput::new(key))
    }

    #[test]
    fn test_transition_table() {
        use StateId::*;
        for mode in [Panning, Zooming, CreatingShape] {
            assert!(Default.can_transition_to(mode));
            assert!(mode.can_transition_to(Default));
            for other in [Panning, Zooming, CreatingShape] {
                assert!(!mode.can_transition_to(other));
            }
        }
        assert!(!Default.can_transition_to(Default));
    }

    #[test]
    fn test_starts_at_root() {
        let machine = InteractionMachine::new();
        assert_eq!(machine.current(), StateId::Default);
        assert_eq!(machine.root(), StateId::Default);
        for id in [StateId::Default, StateId::Panning, StateId::Zooming, StateId::CreatingShape] {
            assert!(machine.is_registered(id));
        }
    }

    #[test]
    fn test_illegal_transition_rejected() {
        let mut stage = stage();
        let mut machine = InteractionMachine::new();
        machine.transition_to(&mut stage, StateId::Panning).unwrap();
        let result = machine.transition_to(&mut stage, StateId::Zooming);
        assert!(matches!(
            result,
            Err(RenderError::IllegalTransition {
                from: StateId::Panning,
                to: StateId::Zooming
            })
        ));
        assert_eq!(machine.current(), StateId::Panning);
    }

    #[test]
    fn test_unregistered_state() {
        let mut stage = stage();
        let mut machine = InteractionMachine::empty(StateId::Default);
        assert!(matches!(
            machine.handle(&mut stage, &key("Escape")),
            Err(RenderError::UnregisteredState(StateId::Default))
        ));
        machine.register(Box::new(DefaultState::default()));
        assert!(matches!(
            machine.transition_to(&mut stage, StateId::Zooming),
            Err(RenderError::UnregisteredState(StateId::Zooming))
        ));
        assert_eq!(machine.handle(&mut stage, &key("Escape")).unwrap(), StateId::Default);
    }

    #[derive(Debug)]
    struct Probe {
        log: Rc<RefCell<Vec<&'static str>>>,
    }

    impl InteractionState for Probe {
        fn id(&self) -> StateId {
            StateId::Zooming
        }

        fn enter(&mut self, _stage: &mut Stage) -> RenderResult<()> {
            self.log.borrow_mut().push("enter");
            Ok(())
        }

        fn exit(&mut self, _stage: &mut Stage) -> RenderResult<()> {
            self.log.borrow_mut().push("exit");
            Ok(())
        }

        fn key_down(&mut self, _stage: &mut Stage, input: &KeyInput) -> Transition {
            self.log.borrow_mut().push("key");
            if input.is("Escape") { Transition::Root } else { Transition::Stay }
        }
    }

    #[test]
    fn test_custom_state_lifecycle() {
        let mut stage = stage();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut machine = InteractionMachine::new();
        machine.register(Box::new(Probe { log: log.clone() }));

        assert_eq!(machine.handle(&mut stage, &key("z")).unwrap(), StateId::Zooming);
        assert_eq!(machine.handle(&mut stage, &key("x")).unwrap(), StateId::Zooming);
        assert_eq!(machine.handle(&mut stage, &key("Escape")).unwrap(), StateId::Default);
        assert_eq!(*log.borrow(), vec!["enter", "key", "key", "exit"]);
    }

    #[test]
    fn test_create_shape_needs_creating_state() {
        let mut stage = stage();
        let mut machine = InteractionMachine::new();
        machine.register(Box::new(Probe {
            log: Rc::new(RefCell::new(Vec::new())),
        }));
        machine.transition_to(&mut stage, StateId::Zooming).unwrap();

        let geometry = Box::new(Rectangle::new(Point::ZERO, 1.0, 1.0).unwrap());
        assert!(matches!(
            machine.create_shape(&mut stage, geometry),
            Err(RenderError::IllegalTransition { .. })
        ));
        assert_eq!(stage.scene().len(), 2);
    }
}
