// Turns the chosen target (or lack of one) into a single-tile move.
use log::debug;

use crate::config::WanderPolicy;
use crate::game_interface::{Move, Pos};
use crate::scoring::ScoringEngine;
use crate::tick::TickView;

/// Cardinal directions, in round-robin order.
pub const HEADINGS: [Move; 4] = [
    Move { dx: 1, dy: 0 },
    Move { dx: 0, dy: 1 },
    Move { dx: -1, dy: 0 },
    Move { dx: 0, dy: -1 },
];

/// Host-provided stepping: one tile closer to `to` in Manhattan distance.
pub trait StepFn {
    fn step(&self, from: Pos, to: Pos) -> Move;
}

/// Closes the x gap first, then the y gap.
#[derive(Debug, Default, Clone, Copy)]
pub struct AxisFirst;

impl StepFn for AxisFirst {
    fn step(&self, from: Pos, to: Pos) -> Move {
        let dx = (to.x - from.x).signum();
        let dy = if dx != 0 { 0 } else { (to.y - from.y).signum() };
        Move { dx, dy }
    }
}

/// Moves taken when there is nothing to go for. Keeps its heading across ticks.
#[derive(Debug, Default, Clone)]
pub struct Wanderer {
    heading: usize,
}

impl Wanderer {
    pub fn new() -> Self {
        Wanderer::default()
    }

    pub fn heading(&self) -> Move {
        HEADINGS[self.heading]
    }

    fn advance(&mut self) -> Move {
        let current = self.heading();
        self.heading = (self.heading + 1) % HEADINGS.len();
        current
    }

    pub fn round_robin(&mut self) -> Move {
        self.advance()
    }

    pub fn wander(&mut self, view: &TickView) -> Move {
        let position = view.position();
        let fallback = self.advance();
        let mut in_bounds = HEADINGS.iter().copied()
            .filter(|step| view.board.contains(&position.offset(*step)));
        let chosen = match view.config.wander {
            WanderPolicy::RoundRobin => fallback,
            WanderPolicy::RiskMinimizing => {
                let scoring = ScoringEngine::new(view);
                let mut best: Option<(Move, f64)> = None;
                for step in in_bounds {
                    let risk = scoring.risk(&position.offset(step));
                    if best.map_or(true, |(_, lowest)| risk < lowest) {
                        best = Some((step, risk));
                    }
                }
                best.map_or(fallback, |(step, _)| step)
            },
            WanderPolicy::AvoidOpponents => {
                let radius = view.config.safety_radius;
                in_bounds
                    .find(|step| {
                        let next = position.offset(*step);
                        view.opponents()
                            .all(|opponent| opponent.position.manhattan(&next) > radius)
                    })
                    .unwrap_or(fallback)
            },
        };
        debug!("[WANDER] {:?} from {position:?}: {chosen:?}", view.config.wander);
        chosen
    }
}
