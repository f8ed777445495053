// Candidate scoring and the risk model behind it.
use log::debug;

use crate::config::ScoringMode;
use crate::game_interface::Pos;
use crate::tick::TickView;

/// Floor for every multiplicative penalty, so far targets stay comparable.
const MIN_MULTIPLIER: f64 = 0.1;

pub struct ScoringEngine<'v, 'a> {
    view: &'v TickView<'a>,
}

impl<'v, 'a> ScoringEngine<'v, 'a> {
    pub fn new(view: &'v TickView<'a>) -> Self {
        ScoringEngine { view }
    }

    /// Score of collecting `value` at `target`, `distance` steps away.
    /// Zero distance scores zero.
    pub fn score(&self, value: u8, distance: u32, target: &Pos) -> f64 {
        if distance == 0 {
            return 0.0;
        }
        let base = value as f64 / distance as f64;
        let score = match self.view.config.scoring {
            ScoringMode::Greedy => base,
            ScoringMode::RiskAverse => {
                base * f64::max(MIN_MULTIPLIER, 1.0 - self.risk(target))
            },
            ScoringMode::TimeWeighted => {
                base * time_weight(value, distance, self.view.time_ratio)
            },
        };
        debug!("[SCORE] value={value} distance={distance} target={target:?} -> {score:.4}");
        score
    }

    /// Risk in [0, 1] of heading to `target` from the agent's position.
    pub fn risk(&self, target: &Pos) -> f64 {
        let params = &self.view.config.risk;
        let opponent = self.opponent_proximity(target, params.opponent_threshold);
        let base_distance = self.view.base().manhattan(target) as f64;
        let base = f64::min(1.0, base_distance / params.max_map_span);
        let route = self.route_risk(&self.view.position(), target);
        let total = opponent * params.opponent_weight
            + base * params.base_distance_weight
            + route * params.route_weight;
        total.clamp(0.0, 1.0)
    }

    /// Linear decay from 1 (an opponent on `from`) to 0 at `threshold`.
    pub fn opponent_proximity(&self, from: &Pos, threshold: f64) -> f64 {
        let nearest = self.view.opponents()
            .map(|opponent| opponent.position.manhattan(from))
            .min();
        match nearest {
            Some(distance) if threshold > 0.0 => {
                f64::max(0.0, 1.0 - distance as f64 / threshold)
            },
            _ => 0.0,
        }
    }

    /// Summed opponent threat around the midpoint of `start -> end`, capped at 1.
    pub fn route_risk(&self, start: &Pos, end: &Pos) -> f64 {
        let radius = self.view.config.risk.threat_radius;
        let mid_x = (start.x + end.x) as f64 / 2.0;
        let mid_y = (start.y + end.y) as f64 / 2.0;
        let total: f64 = self.view.opponents()
            .map(|opponent| {
                let distance = (opponent.position.x as f64 - mid_x).abs()
                    + (opponent.position.y as f64 - mid_y).abs();
                if radius > 0.0 && distance <= radius {
                    1.0 - distance / radius
                } else {
                    0.0
                }
            })
            .sum();
        f64::min(1.0, total)
    }
}

/// Early on high value pays, mid-match urgency grows, late distance hurts.
pub fn time_weight(value: u8, distance: u32, time_ratio: f64) -> f64 {
    let urgency = 1.0 - time_ratio;
    if time_ratio > 0.7 {
        1.0 + value as f64 * 0.1
    } else if time_ratio > 0.3 {
        1.0 + urgency * 0.5
    } else {
        f64::max(MIN_MULTIPLIER, 1.0 - distance as f64 * urgency * 0.3)
    }
}
