use log::{debug, info, warn};
use std::time::Instant;
use thiserror::Error;

use crate::base_return::BaseReturnPlanner;
use crate::config::{EngineConfig, HazardClass};
use crate::deviation::ObstacleDeviator;
use crate::game_interface::{Board, Move, Pos, MAX_CARRIED};
use crate::movement::{AxisFirst, StepFn, Wanderer};
use crate::route_memory::{RouteEvent, RouteMemory};
use crate::selector::TargetSelector;
use crate::tick::TickView;

/// A stalled decision is retried once with a wiped plan.
const MAX_DECISION_ATTEMPTS: usize = 2;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Agent {0} is not on the board")]
    AgentNotFound(u32),
}

/// Decision engine for a single agent. Owns everything that persists
/// between that agent's ticks.
pub struct Bot {
    config: EngineConfig,
    state: AgentMemory,
}

/// Mutable per-agent state, kept apart from the config so a tick can read
/// one while updating the other.
struct AgentMemory {
    step_fn: Box<dyn StepFn>,
    deviator: ObstacleDeviator,
    route: RouteMemory,
    wanderer: Wanderer,
    /// Distance to the first target of the last selection.
    tracked_distance: Option<u32>,
}

impl Default for Bot {
    fn default() -> Self {
        Bot::new(EngineConfig::default())
    }
}

impl Bot {
    pub fn new(config: EngineConfig) -> Self {
        Bot::with_step_fn(config, Box::new(AxisFirst))
    }

    /// Bot that moves with the host's own stepping rule.
    pub fn with_step_fn(config: EngineConfig, step_fn: Box<dyn StepFn>) -> Self {
        info!("Initializing bot with {:?} scoring, {:?} return policy",
              config.scoring, config.return_policy);
        Bot {
            state: AgentMemory {
                step_fn,
                deviator: ObstacleDeviator::new(config.hazard_order),
                route: RouteMemory::new(),
                wanderer: Wanderer::new(),
                tracked_distance: None,
            },
            config,
        }
    }

    pub fn memory(&self) -> &RouteMemory {
        &self.state.route
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Next single-tile move for agent `agent_id` on this tick's board.
    pub fn next_move(&mut self, agent_id: u32, board: &Board) -> Result<Move, Error> {
        let start = Instant::now();
        let agent = board.agent(agent_id).ok_or(Error::AgentNotFound(agent_id))?;
        info!("Agent {id} at {pos:?}, carrying {carried}, {ms} ms left",
              id = agent.id, pos = agent.position, carried = agent.carried,
              ms = agent.milliseconds_left);
        let view = TickView::new(agent, board, &self.config);

        for attempt in 0..MAX_DECISION_ATTEMPTS {
            let game_move = self.state.decide(&view);
            if !game_move.is_stay() {
                debug!("Decision took {:?}", start.elapsed());
                return Ok(game_move);
            }
            warn!("Stalled on attempt {attempt} with {:?}, resetting route.", self.state.route);
            self.state.route.clear();
        }
        // Only reachable when the agent stands on its own base target.
        Ok(self.state.wanderer.round_robin())
    }
}

impl AgentMemory {
    fn decide(&mut self, view: &TickView) -> Move {
        let position = view.position();
        let board = view.board;
        let events = self.route.reconcile(position, view.base(), |portal| {
            board.paired_portal(portal).map(|exit| exit.position)
        });
        if events.contains(&RouteEvent::ArrivedAtBase) {
            self.tracked_distance = None;
        }

        let planner = BaseReturnPlanner::new(view);
        let mut target = match planner.primary_trigger() {
            Some(reason) => {
                info!("[RETURN] Going home: {reason:?}");
                Some(planner.choose_route(&mut self.route))
            },
            None => {
                if self.route.targets.is_empty() {
                    if let Some(selection) = TargetSelector::new(view).select() {
                        selection.write_to(&mut self.route);
                        self.tracked_distance =
                            Some(position.manhattan(&selection.first_target()));
                    }
                }
                self.route.head()
            },
        };
        if let Some(reason) = planner.secondary_trigger(self.tracked_distance) {
            info!("[RETURN] Cutting the trip short: {reason:?}");
            target = Some(planner.choose_route(&mut self.route));
        }
        if let Some(waypoint) = self.route.waypoint {
            target = Some(waypoint);
        }

        match target {
            Some(target) => {
                let target = self.avoid_hazards(view, target);
                self.step_fn.step(position, target).clamped()
            },
            None => self.wanderer.wander(view),
        }
    }

    /// Swaps `target` for a detour when a hazard sits in the way.
    fn avoid_hazards(&mut self, view: &TickView, target: Pos) -> Pos {
        let position = view.position();
        let mut target = target;
        if self.route.waypoint.is_none() {
            target = self.detour(HazardClass::Portal, view, position, target);
        }
        if view.carried() == MAX_CARRIED - 1 {
            target = self.detour(HazardClass::HazardousPickup, view, position, target);
        }
        target
    }

    fn detour(&mut self, class: HazardClass, view: &TickView, position: Pos, target: Pos) -> Pos {
        match self.deviator.deviate(class, position, target, view.board) {
            Some(detour) => {
                info!("[DEVIATE] Avoiding {class:?}, heading to {detour:?} instead of {target:?}");
                self.route.waypoint = Some(detour);
                detour
            },
            None => target,
        }
    }
}
