use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use behavior_tree::{
    Behavior, NodeRegistry, Scheduler, SchedulerConfig, Status, TickContext, Tree, TriggerEvent,
    Value, compile,
};

/// Leaf reporting a fixed status while counting ticks and aborts.
struct Recorder {
    status: Status,
    counters: Arc<Counters>,
}

#[derive(Default)]
struct Counters {
    ticks: AtomicUsize,
    aborts: AtomicUsize,
}

impl Counters {
    fn ticks(&self) -> usize {
        self.ticks.load(Ordering::SeqCst)
    }

    fn aborts(&self) -> usize {
        self.aborts.load(Ordering::SeqCst)
    }
}

impl Behavior for Recorder {
    fn tick(&mut self, _ctx: &mut TickContext<'_>) -> Status {
        self.counters.ticks.fetch_add(1, Ordering::SeqCst);
        self.status
    }

    fn abort(&mut self, _ctx: &mut TickContext<'_>) {
        self.counters.aborts.fetch_add(1, Ordering::SeqCst);
    }
}

/// Registry with `recorder <success|failure|running>` sharing one set of counters.
fn registry_with_recorder() -> (NodeRegistry, Arc<Counters>) {
    let counters = Arc::new(Counters::default());
    let shared = Arc::clone(&counters);
    let mut registry = NodeRegistry::with_defaults();
    registry.register_leaf("recorder", move |params| {
        let status = match params.first().map(String::as_str) {
            Some("failure") => Status::Failure,
            Some("running") => Status::Running,
            _ => Status::Success,
        };
        Ok(Box::new(Recorder {
            status,
            counters: Arc::clone(&shared),
        }))
    });
    (registry, counters)
}

fn build(text: &str, registry: &NodeRegistry) -> Tree {
    let compiled = compile(text, registry);
    assert!(compiled.is_clean(), "{:?}", compiled.issues);
    compiled.tree
}

#[test]
fn sequence_stops_at_running_child() {
    let (registry, untouched) = registry_with_recorder();
    let mut tree = build("->\n--succeed\n--running\n--recorder\n", &registry);

    tree.tick();

    let seq = tree.node_at(1).unwrap();
    assert_eq!(seq.status(), Status::Running);
    assert_eq!(tree.current_node().index(), 3);
    assert_eq!(tree.current_node().token(), "running");
    assert_eq!(untouched.ticks(), 0);
}

#[test]
fn selector_succeeds_on_second_child_and_exits_once() {
    let registry = NodeRegistry::with_defaults();
    let mut tree = build("-?\n--fail\n--succeed\n", &registry);

    tree.tick();

    let selector = tree.id_at(1).unwrap();
    assert_eq!(tree.node(selector).unwrap().status(), Status::Success);
    assert_eq!(tree.current_node().index(), 3);
    let exits = tree.exits().iter().filter(|&&id| id == selector).count();
    assert_eq!(exits, 1);
}

#[test]
fn invert_maps_every_child_status() {
    let registry = NodeRegistry::with_defaults();
    for (child, expected) in [
        ("succeed", Status::Failure),
        ("fail", Status::Success),
        ("running", Status::Running),
    ] {
        let mut tree = build(&format!("-invertify\n--{child}\n"), &registry);
        tree.tick();
        assert_eq!(tree.node_at(1).unwrap().status(), expected, "child {child}");
    }
}

#[test]
fn regression_aborts_preempted_leaf() {
    let (registry, recorder) = registry_with_recorder();
    let text = "\
-?
--trigger Player true
--?
---fail
--->
----recorder running
----succeed
";
    let compiled = compile(text, &registry);
    assert!(compiled.is_clean());
    let tree = &compiled.tree;
    assert_eq!(tree.node_at(5).unwrap().token(), ">");
    assert_eq!(tree.node_at(6).unwrap().token(), "recorder");

    let mut scheduler = Scheduler::new(SchedulerConfig::default());
    scheduler.load(compiled.tree);

    // The recorder runs; enclosing selectors report their running branch.
    let first = scheduler.cross_tree().unwrap();
    assert_eq!(first.out_index, 3);
    assert!(!first.aborted);
    assert_eq!(recorder.aborts(), 0);

    let preempted = scheduler
        .trigger("Player", TriggerEvent::Enter, "hero")
        .unwrap();
    assert_eq!((preempted.in_index, preempted.out_index), (3, 2));
    assert!(preempted.aborted);
    assert_eq!(recorder.aborts(), 1);
}

#[test]
fn once_latches_after_first_tick() {
    let (registry, recorder) = registry_with_recorder();
    let mut tree = build("-onceify\n--recorder failure\n", &registry);

    tree.tick();
    assert_eq!(tree.node_at(1).unwrap().status(), Status::Failure);

    tree.tick();
    tree.tick();
    assert_eq!(tree.node_at(1).unwrap().status(), Status::Success);
    assert_eq!(recorder.ticks(), 1);
}

#[test]
fn repeat_keeps_running_and_restarts_child() {
    let (registry, recorder) = registry_with_recorder();
    let mut tree = build("-repeatify\n--recorder\n", &registry);

    for _ in 0..3 {
        assert_eq!(tree.tick(), Status::Running);
        assert_eq!(tree.node_at(1).unwrap().status(), Status::Running);
    }
    assert_eq!(recorder.aborts(), 3);
}

#[test]
fn row_reset_rearms_when_row_completes() {
    let (registry, recorder) = registry_with_recorder();
    let compiled = compile("->\n--rowresetify\n---recorder\n--wait 0.05 Skip\n", &registry);
    assert!(compiled.is_clean());
    let mut scheduler = Scheduler::new(SchedulerConfig::default());
    scheduler.load(compiled.tree);

    // t=0: recorder succeeds and latches, wait starts. t=0.1: wait succeeds,
    // the sequence completes and becomes current, ahead of the decorator.
    assert_eq!(scheduler.advance(0.15).len(), 2);
    assert_eq!(recorder.ticks(), 1);
    assert_eq!(scheduler.tree().unwrap().current_node().token(), ">");

    scheduler.advance(0.1);
    assert_eq!(recorder.ticks(), 2);
}

#[test]
fn expression_leaf_uses_boot_variables() {
    let registry = NodeRegistry::with_defaults();
    let mut tree = build("-$ y = speed * 2 + 1\n*speed = 2.5 # comment\n", &registry);

    assert_eq!(tree.variables().get("speed"), Some(&Value::Float(2.5)));

    tree.tick();
    assert_eq!(tree.variables().get("y"), Some(&Value::Float(6.0)));
}

#[test]
fn velocity_reads_variables_at_tick_time() {
    let registry = NodeRegistry::with_defaults();
    let mut tree = build("-velocity speed 0\n", &registry);

    assert_eq!(tree.tick(), Status::Running);
    assert_eq!(tree.node_at(1).unwrap().status(), Status::Failure);

    tree.variables_mut().set("speed", 4_i64);
    tree.tick();
    assert_eq!(tree.node_at(1).unwrap().status(), Status::Success);
    assert_eq!(tree.agent().motion.vx, 4.0);
}

#[test]
fn threshold_codes_come_from_the_script_text() {
    let registry = NodeRegistry::with_defaults();
    let mut tree = build("-thresholdify ntn\n--trigger Player true\n", &registry);

    // Nobody around: entering Failure fires once.
    tree.tick();
    assert_eq!(tree.node_at(1).unwrap().status(), Status::Success);
    tree.tick();
    assert_eq!(tree.node_at(1).unwrap().status(), Status::Failure);

    // A variable with the same name as the codes is not consulted.
    let mut named = build("-thresholdify edges\n--succeed\n*edges = tnn\n", &registry);
    named.tick();
    assert_eq!(named.node_at(1).unwrap().status(), Status::Failure);
}
