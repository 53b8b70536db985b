//! Policies that record the order in which the scheduler visits nodes.

use remeasure_geometry::Size;
use remeasure_layout::{Constraints, MeasurePolicy, MeasureScope, NodeId, PlacementScope};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassEvent {
    Measure { node: NodeId, lookahead: bool },
    Place { node: NodeId, lookahead: bool },
}

impl PassEvent {
    pub fn node(&self) -> NodeId {
        match *self {
            PassEvent::Measure { node, .. } | PassEvent::Place { node, .. } => node,
        }
    }

    pub fn is_lookahead(&self) -> bool {
        match *self {
            PassEvent::Measure { lookahead, .. } | PassEvent::Place { lookahead, .. } => lookahead,
        }
    }
}

/// Shared, append-only list of pass events.
#[derive(Clone, Default)]
pub struct PassLog {
    events: Rc<RefCell<Vec<PassEvent>>>,
}

impl PassLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: PassEvent) {
        self.events.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<PassEvent> {
        self.events.borrow().clone()
    }

    /// Returns and clears everything recorded so far.
    pub fn take(&self) -> Vec<PassEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    /// Nodes measured in the regular pass, in visiting order.
    pub fn measured(&self) -> Vec<NodeId> {
        self.filtered(|event| matches!(event, PassEvent::Measure { lookahead: false, .. }))
    }

    /// Nodes placed in the regular pass, in visiting order.
    pub fn placed(&self) -> Vec<NodeId> {
        self.filtered(|event| matches!(event, PassEvent::Place { lookahead: false, .. }))
    }

    pub fn lookahead_measured(&self) -> Vec<NodeId> {
        self.filtered(|event| matches!(event, PassEvent::Measure { lookahead: true, .. }))
    }

    pub fn lookahead_placed(&self) -> Vec<NodeId> {
        self.filtered(|event| matches!(event, PassEvent::Place { lookahead: true, .. }))
    }

    fn filtered(&self, keep: impl Fn(&PassEvent) -> bool) -> Vec<NodeId> {
        self.events
            .borrow()
            .iter()
            .filter(|event| keep(event))
            .map(PassEvent::node)
            .collect()
    }
}

/// Delegates to `inner` and logs every measure and place call.
pub struct RecordingPolicy {
    inner: Rc<dyn MeasurePolicy>,
    log: PassLog,
}

impl RecordingPolicy {
    pub fn new(inner: Rc<dyn MeasurePolicy>, log: PassLog) -> Self {
        Self { inner, log }
    }
}

impl MeasurePolicy for RecordingPolicy {
    fn measure(&self, scope: &mut MeasureScope<'_>, constraints: Constraints) -> Size {
        self.log.push(PassEvent::Measure {
            node: scope.node(),
            lookahead: scope.is_lookahead(),
        });
        self.inner.measure(scope, constraints)
    }

    fn place(&self, scope: &mut PlacementScope<'_>, size: Size) {
        self.log.push(PassEvent::Place {
            node: scope.node(),
            lookahead: scope.is_lookahead(),
        });
        self.inner.place(scope, size);
    }
}
