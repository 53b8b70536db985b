//! Pointer input routed through hit testing.

use crate::hit_test::HitTestResult;
use crate::tree::LayoutTree;
use remeasure_core::collections::map::HashMap;
use remeasure_core::NodeId;
use remeasure_geometry::{Point, Rect, Size};
use std::cell::Cell;
use std::rc::Rc;

pub type PointerId = u64;

/// Distance in logical pixels a pointer may travel before a press stops
/// counting as a tap.
pub const DRAG_THRESHOLD: f32 = 8.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerEventKind {
    Down,
    Move,
    Up,
    Cancel,
}

/// Dispatch passes, in the order handlers see them.
///
/// `Initial` runs outermost to innermost so ancestors can intercept,
/// `Main` runs innermost to outermost, `Final` runs outermost to innermost
/// again so handlers can react to what others consumed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerEventPass {
    Initial,
    Main,
    Final,
}

/// Pointer event with consumption shared across copies.
#[derive(Clone, Debug)]
pub struct PointerEvent {
    pub id: PointerId,
    pub kind: PointerEventKind,
    /// Position in the receiving node's coordinates.
    pub position: Point,
    pub global_position: Point,
    pub uptime_millis: u64,
    consumed: Rc<Cell<bool>>,
}

impl PointerEvent {
    pub fn new(id: PointerId, kind: PointerEventKind, global_position: Point) -> Self {
        Self {
            id,
            kind,
            position: global_position,
            global_position,
            uptime_millis: 0,
            consumed: Rc::new(Cell::new(false)),
        }
    }

    pub fn at_time(mut self, uptime_millis: u64) -> Self {
        self.uptime_millis = uptime_millis;
        self
    }

    pub fn consume(&self) {
        self.consumed.set(true);
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed.get()
    }

    /// Copy with a new local position, sharing the consumption state.
    pub fn copy_with_local_position(&self, position: Point) -> Self {
        Self {
            position,
            consumed: Rc::clone(&self.consumed),
            ..self.clone()
        }
    }
}

pub trait PointerInputHandler {
    /// `bounds` is the size of the node the handler is attached to.
    fn on_pointer_event(&mut self, event: &PointerEvent, pass: PointerEventPass, bounds: Size);

    /// The gesture stream was interrupted (e.g. the node was removed).
    fn on_cancel_pointer_input(&mut self) {}
}

/// Fires a tap when a pointer goes down and up inside the node without
/// travelling further than [`DRAG_THRESHOLD`] and without anyone else
/// consuming the stream.
pub struct TapGestureDetector {
    on_tap: Box<dyn FnMut(Point)>,
    tracking: Option<(PointerId, Point)>,
}

impl TapGestureDetector {
    pub fn new(on_tap: impl FnMut(Point) + 'static) -> Self {
        Self {
            on_tap: Box::new(on_tap),
            tracking: None,
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking.is_some()
    }

    fn reset(&mut self) {
        self.tracking = None;
    }
}

impl PointerInputHandler for TapGestureDetector {
    fn on_pointer_event(&mut self, event: &PointerEvent, pass: PointerEventPass, bounds: Size) {
        match pass {
            PointerEventPass::Initial => {}
            PointerEventPass::Main => match event.kind {
                PointerEventKind::Down => {
                    if !event.is_consumed() {
                        self.tracking = Some((event.id, event.position));
                    }
                }
                PointerEventKind::Move => {
                    if let Some((id, start)) = self.tracking {
                        if id == event.id
                            && (event.is_consumed()
                                || start.distance_to(event.position) > DRAG_THRESHOLD)
                        {
                            self.reset();
                        }
                    }
                }
                PointerEventKind::Up => {
                    if let Some((id, _)) = self.tracking {
                        if id != event.id {
                            return;
                        }
                        self.reset();
                        let inside = Rect::from_size(bounds).contains(event.position.x, event.position.y);
                        if inside && !event.is_consumed() {
                            event.consume();
                            (self.on_tap)(event.position);
                        }
                    }
                }
                PointerEventKind::Cancel => self.reset(),
            },
            PointerEventPass::Final => {
                // An ancestor claimed the stream after our main pass.
                if event.is_consumed() && event.kind == PointerEventKind::Move {
                    self.reset();
                }
            }
        }
    }

    fn on_cancel_pointer_input(&mut self) {
        self.reset();
    }
}

/// Routes pointer events to handlers attached to layout nodes.
///
/// The set of nodes receiving a pointer is fixed by the hit test on `Down`
/// and kept until `Up` or `Cancel`, so a drag that leaves a node's bounds is
/// still delivered to it.
#[derive(Default)]
pub struct PointerInputDispatcher {
    handlers: HashMap<NodeId, Box<dyn PointerInputHandler>>,
    captured: HashMap<PointerId, Vec<NodeId>>,
}

impl PointerInputDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_handler(&mut self, node: NodeId, handler: Box<dyn PointerInputHandler>) {
        self.handlers.insert(node, handler);
    }

    /// Detaches the handler of a removed node, cancelling its gesture.
    pub fn remove_handler(&mut self, node: NodeId) {
        if let Some(mut handler) = self.handlers.remove(&node) {
            handler.on_cancel_pointer_input();
        }
        for nodes in self.captured.values_mut() {
            nodes.retain(|&id| id != node);
        }
    }

    pub fn has_handler(&self, node: NodeId) -> bool {
        self.handlers.contains_key(&node)
    }

    /// Delivers `event` (in root coordinates) through all three passes.
    ///
    /// Returns true if some handler consumed it.
    pub fn dispatch(&mut self, tree: &LayoutTree, event: PointerEvent) -> bool {
        let targets = match event.kind {
            PointerEventKind::Down => {
                let hits = self.handler_hits(tree.hit_test(event.global_position));
                self.captured.insert(event.id, hits.clone());
                hits
            }
            PointerEventKind::Move => self.captured.get(&event.id).cloned().unwrap_or_default(),
            PointerEventKind::Up | PointerEventKind::Cancel => {
                self.captured.remove(&event.id).unwrap_or_default()
            }
        };
        let targets: Vec<(NodeId, Point, Size)> = targets
            .into_iter()
            .filter(|&node| tree.contains(node))
            .map(|node| {
                let origin = tree.position_in_root(node);
                let size = tree
                    .get(node)
                    .and_then(|n| n.measured_size())
                    .unwrap_or(Size::ZERO);
                (node, origin, size)
            })
            .collect();

        log::trace!("pointer {:?} to {} handlers", event.kind, targets.len());
        for pass in [
            PointerEventPass::Initial,
            PointerEventPass::Main,
            PointerEventPass::Final,
        ] {
            let ordered: Box<dyn Iterator<Item = &(NodeId, Point, Size)>> = match pass {
                PointerEventPass::Main => Box::new(targets.iter().rev()),
                _ => Box::new(targets.iter()),
            };
            for &(node, origin, size) in ordered {
                if let Some(handler) = self.handlers.get_mut(&node) {
                    let local = event.copy_with_local_position(event.global_position - origin);
                    handler.on_pointer_event(&local, pass, size);
                }
            }
        }
        event.is_consumed()
    }

    fn handler_hits(&self, hits: HitTestResult) -> Vec<NodeId> {
        hits.iter()
            .map(|entry| entry.node_id)
            .filter(|node| self.handlers.contains_key(node))
            .collect()
    }
}

#[cfg(test)]
#[path = "tests/input_tests.rs"]
mod tests;
