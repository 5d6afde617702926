// SPDX-License-Identifier: MIT OR Apache-2.0
//! End-to-end editing sessions through the public engine API.

use std::sync::Arc;
use trellis_engine::input::{PointerButton, ResizeHandle, WheelEvent};
use trellis_engine::{
    Command, DiagramEngine, EngineConfig, EngineError, InputEvent, Key, KeyEvent, Modifiers, Outcome, PointerEvent,
    PointerKind, PointerTarget, ReferenceError, Strategies, ValidationError,
};
use trellis_graph::{Edge, EdgeId, ModelState, Node, NodeId, Point, Port, Routing, RoutingMode, Side, Size};

fn two_nodes() -> Vec<Node> {
    vec![
        Node::new("1")
            .with_size(100.0, 50.0)
            .with_port(Port::source("out", Side::Right)),
        Node::new("2")
            .with_position(300.0, 100.0)
            .with_size(100.0, 50.0)
            .with_port(Port::target("in", Side::Left)),
    ]
}

async fn engine_with(config: EngineConfig, strategies: Strategies) -> DiagramEngine {
    let engine = DiagramEngine::builder(config).strategies(strategies).build().unwrap();
    engine.init(Some(Size::new(800.0, 600.0)), two_nodes(), Vec::new()).await.unwrap();
    engine
}

async fn engine() -> DiagramEngine {
    engine_with(EngineConfig::default(), Strategies::default()).await
}

fn pointer(kind: PointerKind, x: f64, y: f64) -> InputEvent {
    InputEvent::Pointer(PointerEvent::new(kind, x, y))
}

fn pointer_on(kind: PointerKind, x: f64, y: f64, target: PointerTarget) -> InputEvent {
    InputEvent::Pointer(PointerEvent::new(kind, x, y).on(target))
}

#[tokio::test]
async fn add_edge_with_unknown_source_is_rejected() {
    let engine = engine().await;
    let ok = engine
        .emit(Command::AddEdges {
            edges: vec![Edge::new("e1", "1", "2")],
        })
        .await
        .unwrap();
    assert!(ok.is_committed());

    let before = engine.snapshot();
    let err = engine
        .emit(Command::AddEdges {
            edges: vec![Edge::new("e2", "x", "2")],
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Reference(ReferenceError::NodeNotFound(ref id)) if id.as_str() == "x"
    ));
    assert_eq!(*engine.snapshot(), *before);
    assert_eq!(engine.edges().len(), 1);
}

#[tokio::test]
async fn add_to_group_requires_a_group() {
    let engine = engine().await;
    engine
        .emit(Command::AddNodes {
            nodes: vec![Node::new("group-1"), Node::new("n1").with_position(20.0, 300.0)],
        })
        .await
        .unwrap();

    let before = engine.snapshot();
    let err = engine
        .emit(Command::AddToGroup {
            group_id: "group-1".into(),
            node_ids: vec!["n1".into()],
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Reference(ReferenceError::NotAGroup(_))));
    assert_eq!(*engine.snapshot(), *before);
}

#[tokio::test]
async fn commands_on_unknown_ids_leave_the_model_untouched() {
    let engine = engine().await;
    engine
        .emit(Command::AddEdges {
            edges: vec![Edge::new("e1", "1", "2")],
        })
        .await
        .unwrap();
    let missing_node = || NodeId::from("missing");
    let missing_edge = || EdgeId::from("missing");

    let commands = vec![
        Command::ResizeNode {
            id: missing_node(),
            size: Size::new(50.0, 50.0),
            position: None,
        },
        Command::RotateNodeTo {
            node_id: missing_node(),
            angle: 45.0,
        },
        Command::Select {
            node_ids: vec!["1".into(), missing_node()],
            edge_ids: vec![],
            preserve_selection: false,
        },
        Command::Select {
            node_ids: vec![],
            edge_ids: vec![missing_edge()],
            preserve_selection: true,
        },
        Command::Deselect {
            node_ids: vec![missing_node()],
            edge_ids: vec![],
        },
        Command::BringToFront {
            node_ids: vec![missing_node()],
            edge_ids: vec![],
        },
        Command::SendToBack {
            node_ids: vec![],
            edge_ids: vec![missing_edge()],
        },
        Command::RemoveNodes {
            ids: vec!["1".into(), missing_node()],
        },
        Command::RemoveEdges {
            ids: vec![missing_edge()],
        },
        Command::RemoveFromGroup {
            node_ids: vec![missing_node()],
        },
        Command::HighlightGroup {
            group_id: missing_node(),
            nodes: vec![],
        },
        Command::UpdateNodeData {
            id: missing_node(),
            data: serde_json::json!({ "label": "ghost" }),
        },
        Command::SetEdgeRouting {
            id: missing_edge(),
            routing: Some(Routing::Straight),
            mode: RoutingMode::Auto,
        },
        Command::SetEdgePoints {
            id: missing_edge(),
            points: vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)],
        },
    ];

    let before = engine.snapshot();
    let could_undo = engine.can_undo();
    for command in commands {
        let name = command.name();
        let err = engine.emit(command).await.unwrap_err();
        assert!(
            matches!(
                err,
                EngineError::Reference(ReferenceError::NodeNotFound(_) | ReferenceError::EdgeNotFound(_))
            ),
            "{name}: {err}"
        );
        assert_eq!(*engine.snapshot(), *before, "{name} changed the model");
    }
    assert_eq!(engine.can_undo(), could_undo);
}

#[tokio::test]
async fn malformed_commands_fail_validation_without_side_effects() {
    let engine = engine().await;
    let before = engine.snapshot();

    let err = engine
        .emit(Command::MoveNodesBy {
            nodes: Vec::new(),
            delta: Point::new(1.0, 1.0),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(ValidationError::Empty { .. })));

    let err = engine
        .emit(Command::RotateNodeTo {
            node_id: "1".into(),
            angle: f64::NAN,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(ValidationError::NotFinite { .. })));

    let err = engine
        .emit(Command::MoveNodesBy {
            nodes: vec!["ghost".into()],
            delta: Point::new(1.0, 1.0),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Reference(_)));
    assert_eq!(*engine.snapshot(), *before);
}

#[tokio::test]
async fn zero_move_is_a_no_op() {
    let engine = engine().await;
    let before = engine.snapshot();
    let outcome = engine
        .emit(Command::MoveNodesBy {
            nodes: vec!["1".into(), "2".into()],
            delta: Point::ZERO,
        })
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Unchanged);
    assert_eq!(*engine.snapshot(), *before);
    assert!(!engine.can_undo());
}

#[tokio::test]
async fn undo_and_redo_restore_exact_snapshots() {
    let engine = engine().await;
    let commands = vec![
        Command::AddEdges {
            edges: vec![Edge::new("e", "1", "2").with_ports("out", "in")],
        },
        Command::MoveNodesBy {
            nodes: vec!["2".into()],
            delta: Point::new(40.0, -20.0),
        },
        Command::ResizeNode {
            id: "1".into(),
            size: Size::new(140.0, 60.0),
            position: None,
        },
        Command::Select {
            node_ids: vec!["1".into()],
            edge_ids: Vec::new(),
            preserve_selection: false,
        },
        Command::BringToFront {
            node_ids: Vec::new(),
            edge_ids: Vec::new(),
        },
        Command::DeleteSelection,
    ];

    let mut snapshots: Vec<Arc<ModelState>> = vec![engine.snapshot()];
    for command in commands {
        engine.emit(command).await.unwrap();
        snapshots.push(engine.snapshot());
    }

    for expected in snapshots.iter().rev().skip(1) {
        engine.undo().await.unwrap();
        assert_eq!(*engine.snapshot(), **expected);
    }
    assert!(matches!(engine.undo().await, Err(EngineError::History(_))));

    for expected in snapshots.iter().skip(1) {
        engine.redo().await.unwrap();
        assert_eq!(*engine.snapshot(), **expected);
    }
    assert!(!engine.can_redo());
}

#[tokio::test]
async fn orthogonal_routing_keeps_stub_segments() {
    let mut config = EngineConfig::default();
    config.routing.default_routing = Routing::Orthogonal;
    config.routing.orthogonal.first_last_segment_length = 30.0;
    let engine = engine_with(config, Strategies::default()).await;

    engine
        .emit(Command::AddEdges {
            edges: vec![Edge::new("e", "1", "2").with_ports("out", "in")],
        })
        .await
        .unwrap();

    let edge = &engine.edges()[0];
    let points = &edge.points;
    assert_eq!(points.first(), Some(&Point::new(100.0, 25.0)));
    assert_eq!(points.last(), Some(&Point::new(300.0, 125.0)));
    assert_eq!(points[0].distance(points[1]), 30.0);
    assert_eq!(points[points.len() - 2].distance(points[points.len() - 1]), 30.0);
    assert!(edge.path.contains(" Q "));

    // moving an endpoint reroutes
    engine
        .emit(Command::MoveNodesBy {
            nodes: vec!["2".into()],
            delta: Point::new(0.0, 100.0),
        })
        .await
        .unwrap();
    assert_eq!(engine.edges()[0].points.last(), Some(&Point::new(300.0, 225.0)));
}

#[tokio::test]
async fn drag_gesture_is_one_undo_step_and_cancel_reverts() {
    let engine = engine().await;
    let viewport = engine.metadata().viewport;
    assert_eq!((viewport.x, viewport.y, viewport.scale), (0.0, 0.0, 1.0));

    engine
        .handle_input(pointer_on(PointerKind::Down, 10.0, 10.0, PointerTarget::Node("1".into())))
        .await
        .unwrap();
    for step in 1..=5 {
        let offset = f64::from(step) * 10.0;
        engine
            .handle_input(pointer(PointerKind::Move, 10.0 + offset, 10.0))
            .await
            .unwrap();
    }
    engine.handle_input(pointer(PointerKind::Up, 60.0, 10.0)).await.unwrap();
    assert_eq!(engine.gesture_state().await, "idle");

    let moved = engine.snapshot();
    assert_eq!(moved.node(&"1".into()).unwrap().position, Point::new(50.0, 0.0));
    assert_eq!(moved.selected_node_ids(), vec![NodeId::from("1")]);

    // one undo reverts the whole drag, the next one the selection
    engine.undo().await.unwrap();
    assert_eq!(engine.snapshot().node(&"1".into()).unwrap().position, Point::ZERO);
    assert!(engine.snapshot().node(&"1".into()).unwrap().selected);
    engine.undo().await.unwrap();
    assert!(engine.snapshot().selected_node_ids().is_empty());

    // an escaped drag leaves nothing behind
    engine
        .handle_input(pointer_on(PointerKind::Down, 10.0, 10.0, PointerTarget::Node("1".into())))
        .await
        .unwrap();
    engine.handle_input(pointer(PointerKind::Move, 90.0, 90.0)).await.unwrap();
    assert_eq!(
        engine.snapshot().node(&"1".into()).unwrap().position,
        Point::new(80.0, 80.0)
    );
    engine
        .handle_input(InputEvent::Key(KeyEvent::new(Key::Escape)))
        .await
        .unwrap();
    assert_eq!(engine.snapshot().node(&"1".into()).unwrap().position, Point::ZERO);
    assert_eq!(engine.gesture_state().await, "idle");
}

#[tokio::test]
async fn drag_threshold_keeps_small_jitter_a_click() {
    let mut config = EngineConfig::default();
    config.input.drag_threshold = 5.0;
    let engine = engine_with(config, Strategies::default()).await;

    engine
        .handle_input(pointer_on(PointerKind::Down, 10.0, 10.0, PointerTarget::Node("1".into())))
        .await
        .unwrap();
    engine.handle_input(pointer(PointerKind::Move, 12.0, 11.0)).await.unwrap();
    assert_eq!(engine.gesture_state().await, "selecting");
    engine.handle_input(pointer(PointerKind::Up, 12.0, 11.0)).await.unwrap();
    assert_eq!(engine.snapshot().node(&"1".into()).unwrap().position, Point::ZERO);
}

#[tokio::test]
async fn resize_snaps_through_strategies() {
    let strategies = Strategies {
        should_snap_resize_for_node: Some(Arc::new(|node: &Node| node.id.as_str() == "1")),
        compute_snap_for_node_size: Some(Arc::new(|_: &Node| Size::new(25.0, 25.0))),
        ..Strategies::default()
    };
    let engine = engine_with(EngineConfig::default(), strategies).await;

    let handle = PointerTarget::ResizeHandle {
        node: "1".into(),
        handle: ResizeHandle::BottomRight,
    };
    engine
        .handle_input(pointer_on(PointerKind::Down, 100.0, 50.0, handle))
        .await
        .unwrap();
    engine.handle_input(pointer(PointerKind::Move, 112.0, 63.0)).await.unwrap();
    engine.handle_input(pointer(PointerKind::Up, 112.0, 63.0)).await.unwrap();

    assert_eq!(engine.snapshot().node(&"1".into()).unwrap().size, Some(Size::new(100.0, 75.0)));
    engine.undo().await.unwrap();
    assert_eq!(engine.snapshot().node(&"1".into()).unwrap().size, Some(Size::new(100.0, 50.0)));
}

#[tokio::test]
async fn linking_by_hit_testing_ports() {
    let engine = engine().await;
    // no targets supplied: the interpreter finds the ports itself
    engine.handle_input(pointer(PointerKind::Down, 100.0, 25.0)).await.unwrap();
    assert_eq!(engine.gesture_state().await, "linking");
    engine.handle_input(pointer(PointerKind::Move, 250.0, 100.0)).await.unwrap();
    assert!(engine.metadata().temporary_edge.is_some());
    engine.handle_input(pointer(PointerKind::Up, 302.0, 124.0)).await.unwrap();

    let edges = engine.edges();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].source.as_str(), "1");
    assert_eq!(edges[0].target.as_str(), "2");
    assert!(engine.metadata().temporary_edge.is_none());
}

#[tokio::test]
async fn panning_and_wheel_do_not_touch_history() {
    let engine = engine().await;
    let press = PointerEvent::new(PointerKind::Down, 400.0, 400.0).with_button(PointerButton::Middle);
    engine.handle_input(InputEvent::Pointer(press)).await.unwrap();
    engine.handle_input(pointer(PointerKind::Move, 450.0, 380.0)).await.unwrap();
    engine.handle_input(pointer(PointerKind::Up, 450.0, 380.0)).await.unwrap();

    let mut wheel = WheelEvent::new(Point::new(400.0, 300.0), Point::new(0.0, -100.0)).with_modifiers(Modifiers::PRIMARY);
    assert!(engine.handle_wheel(&mut wheel).await.unwrap());
    assert!(!engine.handle_wheel(&mut wheel).await.unwrap());

    let viewport = engine.metadata().viewport;
    assert!(viewport.scale > 1.0);
    assert!(!engine.can_undo());
}

#[tokio::test]
async fn undo_keeps_the_live_viewport() {
    let engine = engine().await;
    engine
        .emit(Command::MoveNodesBy {
            nodes: vec!["1".into()],
            delta: Point::new(5.0, 5.0),
        })
        .await
        .unwrap();
    engine
        .emit(Command::MoveViewportBy {
            delta: Point::new(-30.0, 0.0),
        })
        .await
        .unwrap();
    engine.undo().await.unwrap();

    assert_eq!(engine.snapshot().node(&"1".into()).unwrap().position, Point::ZERO);
    assert_eq!(engine.metadata().viewport.x, -30.0);
}
