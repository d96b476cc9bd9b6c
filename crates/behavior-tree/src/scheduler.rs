//! Tick scheduler.
//!
//! One traversal ("cross tree") ticks the root once, then compares the
//! current node before and after. When the traversal ended on a leaf with a
//! lower index than before, a higher-priority branch took over and the tree
//! is aborted from that index so the preempted branch can cancel its side
//! effects.
//!
//! Traversals run periodically through [`Scheduler::advance`] and
//! immediately on trigger events through [`Scheduler::trigger`]. Both paths
//! share [`Scheduler::cross_tree`].

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::{Status, Tree, TriggerEvent};

/// Most periodic traversals one [`Scheduler::advance`] call runs. A host that
/// falls further behind gets a single traversal and the schedule restarts
/// from the current time.
pub const MAX_CATCH_UP: u64 = 5;

/// Scheduler settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between periodic traversals.
    pub tick_period: f32,
    /// Reset statuses before each traversal and publish the last processed node.
    pub diagnostics: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_period: 0.1,
            diagnostics: false,
        }
    }
}

/// The node a traversal ended on, as published to observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub traversal: u64,
    pub index: usize,
    pub short_name: String,
    pub params: String,
    pub comment: String,
    pub status: Status,
}

/// Receives one [`Diagnostic`] per traversal in diagnostic mode.
pub trait DiagnosticObserver: Send {
    fn publish(&mut self, diagnostic: &Diagnostic);
}

impl<F> DiagnosticObserver for F
where
    F: FnMut(&Diagnostic) + Send,
{
    fn publish(&mut self, diagnostic: &Diagnostic) {
        self(diagnostic)
    }
}

/// Observer that keeps every published record.
///
/// Clones share the same storage, so a clone can be handed to the scheduler
/// and this handle read afterwards.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticLog {
    records: Arc<Mutex<Vec<Diagnostic>>>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the records published so far.
    pub fn records(&self) -> Vec<Diagnostic> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl DiagnosticObserver for DiagnosticLog {
    fn publish(&mut self, diagnostic: &Diagnostic) {
        let mut records = self
            .records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        records.push(diagnostic.clone());
    }
}

/// Summary of one traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Traversal {
    /// 1-based traversal counter.
    pub number: u64,
    /// Index of the current node before the traversal.
    pub in_index: usize,
    /// Index of the current node after the traversal.
    pub out_index: usize,
    /// True if the traversal preempted a branch and issued an abort.
    pub aborted: bool,
}

/// Drives a [`Tree`] over time.
pub struct Scheduler {
    config: SchedulerConfig,
    tree: Option<Tree>,
    observer: Option<Box<dyn DiagnosticObserver>>,
    clock: f64,
    next_tick: f64,
    traversals: u64,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            tree: None,
            observer: None,
            clock: 0.0,
            next_tick: 0.0,
            traversals: 0,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Installs a tree, returning the previous one.
    pub fn load(&mut self, mut tree: Tree) -> Option<Tree> {
        tree.agent.tick_period = self.config.tick_period;
        tree.agent.now = self.clock;
        self.next_tick = self.clock;
        self.tree.replace(tree)
    }

    pub fn unload(&mut self) -> Option<Tree> {
        self.tree.take()
    }

    pub fn tree(&self) -> Option<&Tree> {
        self.tree.as_ref()
    }

    pub fn tree_mut(&mut self) -> Option<&mut Tree> {
        self.tree.as_mut()
    }

    /// Attaches a diagnostic observer and turns diagnostic mode on.
    pub fn set_observer(&mut self, observer: impl DiagnosticObserver + 'static) {
        self.observer = Some(Box::new(observer));
        self.config.diagnostics = true;
    }

    /// Simulated time in seconds.
    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn traversals(&self) -> u64 {
        self.traversals
    }

    /// Runs one traversal. Returns `None` when no tree is loaded.
    pub fn cross_tree(&mut self) -> Option<Traversal> {
        let tree = self.tree.as_mut()?;
        self.traversals += 1;
        tree.agent.now = self.clock;

        let in_index = tree.current_node().index();
        if self.config.diagnostics {
            tree.reset_statuses();
        }

        tree.tick();

        let out_index = tree.current_node().index();
        let aborted = out_index < in_index && tree.current_node().is_leaf();
        if aborted {
            tracing::debug!(in_index, out_index, "higher priority branch took over");
            tree.abort(out_index);
        }

        let last = if self.config.diagnostics {
            tree.last_processed()
        } else {
            None
        };
        if let Some(node) = last {
            let diagnostic = Diagnostic {
                traversal: self.traversals,
                index: node.index(),
                short_name: node.token().to_string(),
                params: node.params_text(),
                comment: node.comment().to_string(),
                status: node.status(),
            };
            if let Some(observer) = self.observer.as_mut() {
                observer.publish(&diagnostic);
            }
        }

        Some(Traversal {
            number: self.traversals,
            in_index,
            out_index,
            aborted,
        })
    }

    /// Advances the clock by `dt` seconds and runs every periodic traversal
    /// that became due.
    pub fn advance(&mut self, dt: f32) -> Vec<Traversal> {
        self.clock += f64::from(dt.max(0.0));
        if self.tree.is_none() {
            return Vec::new();
        }

        let period = f64::from(self.config.tick_period);
        if period <= 0.0 {
            tracing::warn!(period, "non-positive tick period, running one traversal");
            return self.cross_tree().into_iter().collect();
        }
        if self.next_tick > self.clock {
            return Vec::new();
        }

        let due = ((self.clock - self.next_tick) / period).floor() as u64 + 1;
        if due > MAX_CATCH_UP {
            tracing::warn!(due, "scheduler fell behind, skipping missed traversals");
            self.next_tick = self.clock + period;
            return self.cross_tree().into_iter().collect();
        }

        self.next_tick += due as f64 * period;
        (0..due).filter_map(|_| self.cross_tree()).collect()
    }

    /// Records a trigger contact and runs an immediate traversal.
    pub fn trigger(&mut self, kind: &str, event: TriggerEvent, object: &str) -> Option<Traversal> {
        let tree = self.tree.as_mut()?;
        tree.agent.record_trigger(kind, event, object);
        self.cross_tree()
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("config", &self.config)
            .field("loaded", &self.tree.is_some())
            .field("observer", &self.observer.is_some())
            .field("clock", &self.clock)
            .field("traversals", &self.traversals)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NodeRegistry, compile};

    fn scheduler(text: &str) -> Scheduler {
        let compiled = compile(text, &NodeRegistry::with_defaults());
        assert!(compiled.is_clean(), "{:?}", compiled.issues);
        let mut scheduler = Scheduler::new(SchedulerConfig::default());
        scheduler.load(compiled.tree);
        scheduler
    }

    #[test]
    fn no_tree_no_traversal() {
        let mut scheduler = Scheduler::new(SchedulerConfig::default());
        assert_eq!(scheduler.cross_tree(), None);
        assert!(scheduler.advance(1.0).is_empty());
    }

    #[test]
    fn advance_runs_due_traversals() {
        let mut scheduler = scheduler("-wait 10\n");
        // Due at 0.0, 0.1, 0.2.
        assert_eq!(scheduler.advance(0.25).len(), 3);
        assert_eq!(scheduler.advance(0.02).len(), 0);
        assert_eq!(scheduler.traversals(), 3);
    }

    #[test]
    fn long_stalls_do_not_replay_every_period() {
        let mut scheduler = Scheduler::new(SchedulerConfig::default());
        assert!(scheduler.advance(3_000_000.0).is_empty());

        let compiled = compile("-wait 1\n", &NodeRegistry::with_defaults());
        scheduler.load(compiled.tree);
        // Due at clock, +0.1, +0.2, +0.3, +0.4 once the stall is behind us.
        assert_eq!(scheduler.advance(0.45).len(), 5);

        // A huge step collapses into a single traversal.
        assert_eq!(scheduler.advance(1_000_000.0).len(), 1);
        assert_eq!(scheduler.advance(0.05).len(), 0);
        assert_eq!(scheduler.advance(0.1).len(), 1);
        assert_eq!(scheduler.traversals(), 7);
        assert!(scheduler.clock() > 4_000_000.0);
    }

    #[test]
    fn preemption_aborts_running_leaf() {
        let mut scheduler = scheduler("-?\n--trigger Player true\n--velocity 2 0\n");

        // Nothing around: the velocity leaf runs.
        scheduler.cross_tree();
        let tree = scheduler.tree().unwrap();
        assert!(tree.agent().motion.apply_vx);
        assert_eq!(tree.current_node().token(), "velocity");

        // The player shows up: the trigger check wins and velocity is released.
        let traversal = scheduler
            .trigger("Player", TriggerEvent::Enter, "hero")
            .unwrap();
        assert!(traversal.aborted);
        assert_eq!((traversal.in_index, traversal.out_index), (3, 2));
        assert!(!scheduler.tree().unwrap().agent().motion.apply_vx);
    }

    #[test]
    fn diagnostics_publish_last_processed_node() {
        let mut scheduler = scheduler("->\n--succeed\n--wait [hold] 5\n");
        let log = DiagnosticLog::new();
        scheduler.set_observer(log.clone());

        scheduler.cross_tree();
        scheduler.cross_tree();

        let records = log.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].index, 3);
        assert_eq!(records[1].short_name, "wait");
        assert_eq!(records[1].params, "5");
        assert_eq!(records[1].comment, "hold");
        assert_eq!(records[1].status, Status::Running);
    }

    #[test]
    fn records_serialize_for_reports() {
        let mut scheduler = scheduler("-wait [idle] 2\n");
        let log = DiagnosticLog::new();
        scheduler.set_observer(log.clone());
        let traversal = scheduler.cross_tree().unwrap();

        let record = serde_json::to_value(&log.records()[0]).unwrap();
        assert_eq!(record["short_name"], "wait");
        assert_eq!(record["comment"], "idle");
        assert_eq!(record["status"], "Running");

        let traversal = serde_json::to_value(traversal).unwrap();
        assert_eq!(traversal["out_index"], 0);
    }

    #[test]
    fn closures_observe_diagnostics() {
        let mut scheduler = scheduler("-fail\n");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        scheduler.set_observer(move |d: &Diagnostic| sink.lock().unwrap().push(d.status));

        scheduler.cross_tree();
        assert_eq!(*seen.lock().unwrap(), vec![Status::Failure]);
    }
}
