use swipectl::config::gestures::{GestureFamily, Motion};
use swipectl::config::{Config, ConfigError};
use swipectl::daemon::handle_line;
use swipectl::input::Action;

fn engine_from(toml: &str) -> swipectl::GestureEngine {
    Config::from_toml(toml)
        .expect("valid toml")
        .build_engine()
        .expect("valid configuration")
}

fn feed(engine: &mut swipectl::GestureEngine, lines: &[(u64, &str)]) -> Vec<Action> {
    let mut actions: Vec<Action> = Vec::new();
    for (now_ms, line) in lines {
        handle_line(line, engine, &mut actions, *now_ms);
    }
    actions
}

#[test]
fn four_finger_swipe_with_oblique_binding() {
    let mut engine = engine_from(
        r#"
        [gestures]
        swipe = ["right 4 echo right", "right_down 4 echo right_down"]
        "#,
    );

    let actions = feed(
        &mut engine,
        &[
            (0, " event7 GESTURE_SWIPE_BEGIN +1.000s 4"),
            (8, " event7 GESTURE_SWIPE_UPDATE +1.008s 4 9.0/ 5.0 (50.00/ 30.00 unaccelerated)"),
            (16, " event7 GESTURE_SWIPE_UPDATE +1.016s 4 9.0/ 5.0 (50.00/ 30.00 unaccelerated)"),
            (90, " event7 GESTURE_SWIPE_END +1.090s 4"),
        ],
    );

    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].motion, Motion::RightDown);
    assert_eq!(actions[0].coords, [100.0, 60.0]);
}

#[test]
fn cancelled_swipe_runs_nothing() {
    let mut engine = engine_from(
        r#"
        [gestures]
        swipe = ["left echo left"]
        "#,
    );
    let actions = feed(
        &mut engine,
        &[
            (0, "event7 GESTURE_SWIPE_BEGIN +1.0s 3"),
            (5, "event7 GESTURE_SWIPE_UPDATE +1.0s 3 -9.0/ 0.0 (-90.0/ 0.0 unaccelerated)"),
            (10, "event7 GESTURE_SWIPE_END +1.0s 3 cancelled"),
        ],
    );
    assert!(actions.is_empty());
    assert!(engine.session().is_none());
}

#[test]
fn cancelled_hook_gesture_runs_no_end_hook() {
    let mut engine = engine_from(
        r#"
        [gestures]
        swipe_begin = ["all 3 xdotool mousedown 1"]
        swipe_end = ["all 3 xdotool mouseup 1"]
        "#,
    );
    let actions = feed(
        &mut engine,
        &[
            (0, "event7 GESTURE_SWIPE_BEGIN +1.0s 3"),
            (10, "event7 GESTURE_SWIPE_END +1.0s 3 cancelled"),
        ],
    );

    let argv: Vec<Vec<String>> = actions.iter().map(Action::argv).collect();
    assert_eq!(argv, vec![vec!["xdotool", "mousedown", "1"]]);
    assert!(engine.session().is_none());
}

#[test]
fn slow_swipe_times_out() {
    let mut engine = engine_from(
        r#"
        timeout = 200
        [gestures]
        swipe = ["up echo up"]
        "#,
    );
    let actions = feed(
        &mut engine,
        &[
            (1000, "event7 GESTURE_SWIPE_BEGIN +1.0s 3"),
            (1100, "event7 GESTURE_SWIPE_UPDATE +1.1s 3 0.0/ -9.0 (0.0/ -300.0 unaccelerated)"),
            (1250, "event7 GESTURE_SWIPE_END +1.25s 3"),
        ],
    );
    assert!(actions.is_empty());
}

#[test]
fn pinch_rotation_needs_rotation_bindings() {
    let lines = [
        (0, "event7 GESTURE_PINCH_BEGIN +1.0s 2"),
        (5, "event7 GESTURE_PINCH_UPDATE +1.0s 2 0.0/ 0.0 ( 0.0/ 0.0 unaccelerated)  0.85 @ 10.0"),
        (10, "event7 GESTURE_PINCH_UPDATE +1.0s 2 0.0/ 0.0 ( 0.0/ 0.0 unaccelerated)  0.85 @ 10.0"),
        (15, "event7 GESTURE_PINCH_END +1.0s 2"),
    ];

    let mut plain = engine_from(
        r#"
        [gestures]
        pinch = ["in echo in", "out echo out"]
        "#,
    );
    let actions = feed(&mut plain, &lines);
    assert_eq!(actions[0].motion, Motion::In);

    let mut rotating = engine_from(
        r#"
        [gestures]
        pinch = ["in echo in", "clockwise echo cw", "anticlockwise echo ccw"]
        "#,
    );
    let actions = feed(&mut rotating, &lines);
    assert_eq!(actions[0].motion, Motion::Clockwise);
    assert_eq!(actions[0].argv(), vec!["echo", "cw"]);
}

#[test]
fn arbitrated_drag_fires_begin_once_settled() {
    let mut engine = engine_from(
        r#"
        drag_delay = 50
        drag_delay_3 = true
        [gestures]
        swipe_begin = ["all 3 xdotool mousedown 1"]
        swipe_update = ["all 3 xdotool mousemove_relative -- x y"]
        swipe_end = ["all 3 xdotool mouseup 1"]
        "#,
    );

    let actions = feed(
        &mut engine,
        &[
            (1000, "event7 GESTURE_SWIPE_BEGIN +1.0s 3"),
            (1030, "event7 GESTURE_SWIPE_UPDATE +1.0s 3 1.0/ 2.0 (3.0/ 4.0 unaccelerated)"),
            (1060, "event7 GESTURE_SWIPE_UPDATE +1.0s 3 1.0/ 2.0 (3.0/ 4.0 unaccelerated)"),
            (1090, "event7 GESTURE_SWIPE_UPDATE +1.0s 3 5.0/ 6.0 (7.0/ 8.0 unaccelerated)"),
            (1120, "event7 GESTURE_SWIPE_END +1.1s 3"),
        ],
    );

    let families: Vec<GestureFamily> = actions.iter().map(|action| action.family).collect();
    assert_eq!(
        families,
        vec![
            GestureFamily::SwipeBeginHook,
            GestureFamily::SwipeUpdateHook,
            GestureFamily::SwipeEndHook,
        ]
    );
    assert_eq!(
        actions[1].argv(),
        vec!["xdotool", "mousemove_relative", "--", "5", "6"]
    );

    let quick = feed(
        &mut engine,
        &[
            (2000, "event7 GESTURE_SWIPE_BEGIN +2.0s 3"),
            (2010, "event7 GESTURE_SWIPE_UPDATE +2.0s 3 1.0/ 2.0 (3.0/ 4.0 unaccelerated)"),
            (2020, "event7 GESTURE_SWIPE_END +2.0s 3"),
        ],
    );
    assert!(quick.is_empty());
}

#[test]
fn line_config_file_loads_with_context() {
    let dir = std::env::temp_dir().join(format!("swipectl-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let good = dir.join("good.conf");
    std::fs::write(
        &good,
        "gesture swipe left 3 echo left\ngesture swipe left echo any\nswipe_threshold 10\n",
    )
    .unwrap();
    let config = Config::load(Some(good.as_path())).expect("loads");
    assert_eq!(config.source(), Some(good.as_path()));
    let table = config.action_table().unwrap();
    assert_eq!(
        table.resolve(GestureFamily::Swipe, Motion::Left, 4).unwrap().tokens(),
        &["echo", "any"]
    );

    let bad = dir.join("bad.conf");
    std::fs::write(&bad, "# header\ngesture swipe sideways echo\n").unwrap();
    let err = Config::load(Some(bad.as_path())).expect_err("unsupported motion");
    assert!(matches!(err, ConfigError::Line { line: 2, .. }));
    assert!(err.to_string().contains("bad.conf:2"));

    let bad_toml = dir.join("bad.toml");
    std::fs::write(&bad_toml, "[gestures]\nswipe = [\"up\"]\n").unwrap();
    let err = Config::load(Some(bad_toml.as_path())).expect_err("empty command");
    assert!(matches!(err, ConfigError::Binding { .. }));

    std::fs::remove_dir_all(&dir).ok();
}
