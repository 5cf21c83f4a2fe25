#![allow(clippy::float_cmp)]

use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::config::StageConfig;
use crate::test_support::{RecordingSurface, red_square, stage, stage_with};

type Log = Rc<RefCell<Vec<(StageEventKind, EventTarget)>>>;

fn square_at(core: &mut StageCore, x: f64, size: f64) -> NodeId {
    let id = core.tree.create_shape(red_square(size));
    let root = core.tree.root();
    core.tree.add_child(root, id).unwrap();
    if let Some(node) = core.tree.get_mut(id) {
        node.x = x;
    }
    id
}

fn log_handler(core: &mut StageCore, id: NodeId, log: &Log) {
    let log = Rc::clone(log);
    core.set_pointer_handler(id, move |event, _| log.borrow_mut().push((event.kind, event.current_target)))
        .unwrap();
}

fn press(core: &mut StageCore, surface: &mut RecordingSurface, kind: PointerKind, x: f64, y: f64) -> StageEvent {
    core.handle_pointer(PointerInput::new(kind, x, y), surface)
}

// =============================================================
// Coordinates
// =============================================================

#[test]
fn page_coordinates_are_offset_by_surface_position() {
    let (mut core, _) = stage();
    let mut surface = RecordingSurface::new(100.0, 100.0).with_offset(10.0, 20.0);

    let event = press(&mut core, &mut surface, PointerKind::Down, 15.0, 30.0);

    assert_eq!(event.kind, StageEventKind::MouseDown);
    assert_eq!(event.target, EventTarget::Stage);
    assert_eq!(event.mouse(), Point::new(5.0, 10.0));
    assert_eq!((core.mouse_x(), core.mouse_y()), (5.0, 10.0));
}

// =============================================================
// Target resolution
// =============================================================

#[test]
fn press_before_first_move_goes_to_stage() {
    let (mut core, _) = stage();
    let shape = square_at(&mut core, 0.0, 10.0);
    let mut surface = RecordingSurface::new(100.0, 100.0);

    let down = press(&mut core, &mut surface, PointerKind::Down, 5.0, 5.0);
    assert_eq!(down.target, EventTarget::Stage);

    let moved = press(&mut core, &mut surface, PointerKind::Move, 5.0, 5.0);
    assert_eq!(moved.target, EventTarget::Node(shape));
    let down = press(&mut core, &mut surface, PointerKind::Down, 5.0, 5.0);
    assert_eq!(down.target, EventTarget::Node(shape));
}

#[test]
fn moving_between_nodes_sends_mouse_out_first() {
    let (mut core, _) = stage();
    let x = square_at(&mut core, 0.0, 10.0);
    let y = square_at(&mut core, 20.0, 10.0);
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    log_handler(&mut core, x, &log);
    log_handler(&mut core, y, &log);
    let mut surface = RecordingSurface::new(100.0, 100.0);

    press(&mut core, &mut surface, PointerKind::Move, 5.0, 5.0);
    press(&mut core, &mut surface, PointerKind::Move, 25.0, 5.0);

    assert_eq!(
        *log.borrow(),
        vec![
            (StageEventKind::MouseMove, EventTarget::Node(x)),
            (StageEventKind::MouseOut, EventTarget::Node(x)),
            (StageEventKind::MouseMove, EventTarget::Node(y)),
        ]
    );
    assert_eq!(core.mouse_target(), Some(y));
}

#[test]
fn leaving_to_empty_space_targets_stage() {
    let (mut core, _) = stage();
    let x = square_at(&mut core, 0.0, 10.0);
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    log_handler(&mut core, x, &log);
    let mut surface = RecordingSurface::new(100.0, 100.0);

    press(&mut core, &mut surface, PointerKind::Move, 5.0, 5.0);
    let event = press(&mut core, &mut surface, PointerKind::Move, 50.0, 50.0);

    assert_eq!(event.target, EventTarget::Stage);
    assert_eq!(core.mouse_target(), None);
    assert_eq!(log.borrow().last(), Some(&(StageEventKind::MouseOut, EventTarget::Node(x))));
}

#[test]
fn staying_on_a_node_sends_no_mouse_out() {
    let (mut core, _) = stage();
    let x = square_at(&mut core, 0.0, 10.0);
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    log_handler(&mut core, x, &log);
    let mut surface = RecordingSurface::new(100.0, 100.0);

    press(&mut core, &mut surface, PointerKind::Move, 2.0, 2.0);
    press(&mut core, &mut surface, PointerKind::Move, 8.0, 8.0);

    assert!(log.borrow().iter().all(|(kind, _)| *kind == StageEventKind::MouseMove));
    assert_eq!(log.borrow().len(), 2);
}

#[test]
fn mouse_disabled_node_is_never_the_target() {
    let (mut core, _) = stage();
    let shape = square_at(&mut core, 0.0, 10.0);
    if let Some(node) = core.tree.get_mut(shape) {
        node.mouse_enabled = false;
    }
    let mut surface = RecordingSurface::new(100.0, 100.0);

    let event = press(&mut core, &mut surface, PointerKind::Move, 5.0, 5.0);
    assert_eq!(event.target, EventTarget::Stage);
}

#[test]
fn disabled_tracing_keeps_last_target() {
    let (mut core, _) = stage();
    let shape = square_at(&mut core, 0.0, 10.0);
    let mut surface = RecordingSurface::new(100.0, 100.0);

    press(&mut core, &mut surface, PointerKind::Move, 5.0, 5.0);
    core.set_trace_mouse_target(false);
    assert!(!core.trace_mouse_target());

    let event = press(&mut core, &mut surface, PointerKind::Move, 80.0, 80.0);
    assert_eq!(event.target, EventTarget::Node(shape));
    assert_eq!(core.mouse(), Point::new(80.0, 80.0));
}

#[test]
fn tracing_disabled_from_config_never_resolves() {
    let (mut core, _) = stage_with(StageConfig { trace_mouse_target: false, ..StageConfig::default() });
    square_at(&mut core, 0.0, 10.0);
    let mut surface = RecordingSurface::new(100.0, 100.0);

    let event = press(&mut core, &mut surface, PointerKind::Move, 5.0, 5.0);
    assert_eq!(event.target, EventTarget::Stage);
    assert_eq!(core.mouse_target(), None);
}

#[test]
fn destroyed_target_resolves_to_stage() {
    let (mut core, _) = stage();
    let shape = square_at(&mut core, 0.0, 10.0);
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    log_handler(&mut core, shape, &log);
    let mut surface = RecordingSurface::new(100.0, 100.0);

    press(&mut core, &mut surface, PointerKind::Move, 5.0, 5.0);
    core.tree.destroy(shape);
    let event = press(&mut core, &mut surface, PointerKind::Down, 5.0, 5.0);

    assert_eq!(event.target, EventTarget::Stage);
    assert_eq!(log.borrow().len(), 1);
}

// =============================================================
// Handlers
// =============================================================

#[test]
fn handler_may_destroy_its_own_node() {
    let (mut core, _) = stage();
    let shape = square_at(&mut core, 0.0, 10.0);
    core.set_pointer_handler(shape, move |event, core| {
        if event.kind == StageEventKind::MouseDown {
            core.destroy_node(shape);
        }
    })
    .unwrap();
    let mut surface = RecordingSurface::new(100.0, 100.0);

    press(&mut core, &mut surface, PointerKind::Move, 5.0, 5.0);
    let event = press(&mut core, &mut surface, PointerKind::Down, 5.0, 5.0);

    assert_eq!(event.target, EventTarget::Node(shape));
    assert!(!core.tree.contains(shape));
    assert!(!core.has_pointer_handler(shape));
    assert_eq!(surface.cursor, CURSOR_DEFAULT);
}

#[test]
fn handler_may_replace_itself() {
    let (mut core, _) = stage();
    let shape = square_at(&mut core, 0.0, 10.0);
    let calls = Rc::new(RefCell::new(Vec::new()));

    let outer = Rc::clone(&calls);
    core.set_pointer_handler(shape, move |_, core| {
        outer.borrow_mut().push("first");
        let inner = Rc::clone(&outer);
        core.set_pointer_handler(shape, move |_, _| inner.borrow_mut().push("second")).unwrap();
    })
    .unwrap();
    let mut surface = RecordingSurface::new(100.0, 100.0);

    press(&mut core, &mut surface, PointerKind::Move, 5.0, 5.0);
    press(&mut core, &mut surface, PointerKind::Move, 6.0, 6.0);

    assert_eq!(*calls.borrow(), vec!["first", "second"]);
}

#[test]
fn handler_runs_before_stage_listeners() {
    let (mut core, _) = stage();
    let shape = square_at(&mut core, 0.0, 10.0);
    let order = Rc::new(RefCell::new(Vec::new()));

    let log = Rc::clone(&order);
    core.set_pointer_handler(shape, move |_, _| log.borrow_mut().push("handler")).unwrap();
    let log = Rc::clone(&order);
    core.add_listener(StageEventKind::MouseMove, move |_, _| log.borrow_mut().push("listener"));
    let mut surface = RecordingSurface::new(100.0, 100.0);

    press(&mut core, &mut surface, PointerKind::Move, 5.0, 5.0);
    assert_eq!(*order.borrow(), vec!["handler", "listener"]);
}

// =============================================================
// Listeners and cursor
// =============================================================

#[test]
fn every_pointer_phase_reaches_listeners() {
    let (mut core, _) = stage();
    let seen: Log = Rc::new(RefCell::new(Vec::new()));
    for kind in [StageEventKind::MouseDown, StageEventKind::MouseUp, StageEventKind::MouseMove] {
        let seen = Rc::clone(&seen);
        core.add_listener(kind, move |event, _| seen.borrow_mut().push((event.kind, event.target)));
    }
    let mut surface = RecordingSurface::new(100.0, 100.0);

    press(&mut core, &mut surface, PointerKind::Move, 1.0, 1.0);
    press(&mut core, &mut surface, PointerKind::Down, 1.0, 1.0);
    press(&mut core, &mut surface, PointerKind::Up, 1.0, 1.0);

    let kinds: Vec<_> = seen.borrow().iter().map(|(kind, _)| *kind).collect();
    assert_eq!(kinds, vec![StageEventKind::MouseMove, StageEventKind::MouseDown, StageEventKind::MouseUp]);
}

#[test]
fn cursor_follows_button_mode() {
    let (mut core, _) = stage();
    let button = square_at(&mut core, 0.0, 10.0);
    square_at(&mut core, 20.0, 10.0);
    if let Some(node) = core.tree.get_mut(button) {
        node.button_mode = true;
    }
    let mut surface = RecordingSurface::new(100.0, 100.0);

    press(&mut core, &mut surface, PointerKind::Move, 5.0, 5.0);
    assert_eq!(surface.cursor, CURSOR_POINTER);
    press(&mut core, &mut surface, PointerKind::Move, 25.0, 5.0);
    assert_eq!(surface.cursor, CURSOR_DEFAULT);
    press(&mut core, &mut surface, PointerKind::Move, 50.0, 50.0);
    assert_eq!(surface.cursor, CURSOR_DEFAULT);
}

#[test]
fn set_cursor_writes_through_to_surface() {
    let (core, _) = stage();
    let mut surface = RecordingSurface::new(10.0, 10.0);
    core.set_cursor(&mut surface, "crosshair").unwrap();
    assert_eq!(surface.cursor, "crosshair");
}

#[test]
fn rejected_cursor_still_reaches_listeners() {
    let (mut core, _) = stage();
    let shape = square_at(&mut core, 0.0, 10.0);
    let seen: Log = Rc::new(RefCell::new(Vec::new()));
    log_handler(&mut core, shape, &seen);
    let listened = Rc::clone(&seen);
    core.add_listener(StageEventKind::MouseMove, move |event, _| listened.borrow_mut().push((event.kind, event.target)));
    let mut surface = RecordingSurface::new(100.0, 100.0);
    surface.fail_cursor = Some("style locked".into());

    let event = press(&mut core, &mut surface, PointerKind::Move, 5.0, 5.0);

    assert_eq!(event.target, EventTarget::Node(shape));
    assert_eq!(
        *seen.borrow(),
        vec![
            (StageEventKind::MouseMove, EventTarget::Node(shape)),
            (StageEventKind::MouseMove, EventTarget::Node(shape)),
        ]
    );
    assert_eq!(surface.cursor, "");
}
