// Per-agent route plan that survives between ticks.
use arrayvec::ArrayVec;
use log::debug;

use crate::game_interface::{Portal, Pos};

/// At most a portal entrance followed by the real destination.
pub const MAX_QUEUED: usize = 2;

pub type TargetQueue = ArrayVec<Pos, MAX_QUEUED>;

/// Observable phase of a memory between ticks. Planning only happens
/// inside a tick, while the selector fills an empty memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutePhase {
    Empty,
    Active,
    /// Queue drained, detour or portal bookkeeping left over.
    Consuming,
}

/// What reconciliation did with the agent's new position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteEvent {
    ArrivedAtBase,
    CrossedPortal,
    ReachedTarget,
    ReachedWaypoint,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteMemory {
    pub targets: TargetQueue,
    /// Portal we are walking into, cleared once we come out the other side.
    pub active_portal: Option<Portal>,
    /// One-tile detour around a hazard.
    pub waypoint: Option<Pos>,
    pub via_portal: bool,
}

impl RouteMemory {
    pub fn new() -> Self {
        RouteMemory::default()
    }

    pub fn clear(&mut self) {
        self.targets.clear();
        self.active_portal = None;
        self.waypoint = None;
        self.via_portal = false;
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
            && self.active_portal.is_none()
            && self.waypoint.is_none()
            && !self.via_portal
    }

    pub fn phase(&self) -> RoutePhase {
        if !self.targets.is_empty() {
            RoutePhase::Active
        } else if self.is_empty() {
            RoutePhase::Empty
        } else {
            RoutePhase::Consuming
        }
    }

    pub fn head(&self) -> Option<Pos> {
        self.targets.first().copied()
    }

    /// Replaces the queue. Anything past capacity is dropped.
    pub fn set_targets(&mut self, targets: &[Pos]) {
        self.targets.clear();
        self.targets.extend(targets.iter().copied().take(MAX_QUEUED));
    }

    /// Consumes whatever the agent reached since the last tick.
    /// `exit_of` resolves the exit of a portal on the current board.
    pub fn reconcile<F>(&mut self, position: Pos, base: Pos, exit_of: F) -> Vec<RouteEvent>
    where
        F: Fn(&Portal) -> Option<Pos>,
    {
        let mut events = Vec::new();
        if position == base {
            if !self.is_empty() {
                events.push(RouteEvent::ArrivedAtBase);
            }
            self.clear();
            return events;
        }

        if let Some(portal) = self.active_portal {
            if exit_of(&portal) == Some(position) {
                if let Some(idx) = self.targets.iter().position(|&t| t == portal.position) {
                    self.targets.remove(idx);
                }
                self.active_portal = None;
                events.push(RouteEvent::CrossedPortal);
            }
        }
        if self.active_portal.is_none() && self.head() == Some(position) {
            self.targets.remove(0);
            events.push(RouteEvent::ReachedTarget);
        }
        if self.waypoint == Some(position) {
            self.waypoint = None;
            events.push(RouteEvent::ReachedWaypoint);
        }
        if !events.is_empty() {
            debug!("[ROUTE] At {position:?}: {events:?}, remaining {:?}", self.targets);
        }
        events
    }
}
