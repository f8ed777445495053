// Decides when to stop foraging and how to get home.
use log::info;

use crate::config::{ReturnPolicy, RouteChoice};
use crate::game_interface::{Pos, MAX_CARRIED};
use crate::route_memory::RouteMemory;
use crate::scoring::ScoringEngine;
use crate::tick::TickView;

// distance-time policy
const LOW_TIME_MS: u64 = 5000;
const NEAR_BASE_TILES: u32 = 5;

// risk policy
const INVENTORY_WEIGHT: f64 = 0.3;
const BASE_DISTANCE_WEIGHT: f64 = 0.2;
const TIME_PRESSURE_WEIGHT: f64 = 0.2;
const OPPONENT_WEIGHT: f64 = 0.2;
const COMPETITION_WEIGHT: f64 = 0.1;
const RETURN_OPPONENT_THRESHOLD: f64 = 5.0;
const RETURN_MAX_DISTANCE: f64 = 40.0;

// urgency policy
const URGENCY_BASE_MS: f64 = 8000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReturnReason {
    /// Carrying as much as possible.
    Full,
    LowTime,
    NearBase,
    RiskThreshold { risk: f64, threshold: f64 },
    RiskTolerance { risk: f64, tolerance: f64 },
    Urgency { threshold_ms: f64 },
    TravelTime { needed_ms: f64 },
}

pub struct BaseReturnPlanner<'v, 'a> {
    view: &'v TickView<'a>,
    scoring: ScoringEngine<'v, 'a>,
}

impl<'v, 'a> BaseReturnPlanner<'v, 'a> {
    pub fn new(view: &'v TickView<'a>) -> Self {
        BaseReturnPlanner { view, scoring: ScoringEngine::new(view) }
    }

    /// Checked before target selection: full carry, or the policy's
    /// time/risk trigger.
    pub fn primary_trigger(&self) -> Option<ReturnReason> {
        let carried = self.view.carried();
        if carried >= MAX_CARRIED {
            return Some(ReturnReason::Full);
        }
        let ms_left = self.view.agent.milliseconds_left;
        match self.view.config.return_policy {
            ReturnPolicy::DistanceTime => {
                (ms_left < LOW_TIME_MS && carried > 1).then_some(ReturnReason::LowTime)
            },
            ReturnPolicy::Risk => {
                if carried == 0 {
                    return None;
                }
                let risk = self.composite_risk();
                let threshold = risk_threshold(carried);
                (risk > threshold).then_some(ReturnReason::RiskThreshold { risk, threshold })
            },
            ReturnPolicy::Urgency => {
                if carried == 0 {
                    return None;
                }
                let threshold_ms = self.urgency_threshold_ms();
                let needed_ms = self.return_travel_ms();
                if (ms_left as f64) < threshold_ms {
                    Some(ReturnReason::Urgency { threshold_ms })
                } else if (ms_left as f64) < needed_ms {
                    Some(ReturnReason::TravelTime { needed_ms })
                } else {
                    None
                }
            },
        }
    }

    /// Checked after target selection. `tracked_distance` is the distance to
    /// the pickup currently being chased, if any.
    pub fn secondary_trigger(&self, tracked_distance: Option<u32>) -> Option<ReturnReason> {
        let carried = self.view.carried();
        match self.view.config.return_policy {
            ReturnPolicy::DistanceTime => {
                let near = self.base_is_near(NEAR_BASE_TILES as f64, tracked_distance);
                (carried > 2 && near).then_some(ReturnReason::NearBase)
            },
            ReturnPolicy::Risk => {
                if carried == 0 {
                    return None;
                }
                let risk = self.composite_risk();
                let tolerance = self.risk_tolerance(risk);
                (risk > tolerance).then_some(ReturnReason::RiskTolerance { risk, tolerance })
            },
            ReturnPolicy::Urgency => {
                let threshold = 3.0 + (1.0 - self.view.time_ratio) * 7.0;
                let near = self.base_is_near(threshold, tracked_distance);
                (carried > 1 && near).then_some(ReturnReason::NearBase)
            },
        }
    }

    fn base_is_near(&self, threshold: f64, tracked_distance: Option<u32>) -> bool {
        let distance = self.view.optimal_base_distance();
        if distance == 0 {
            return false;
        }
        let closer_than_target = tracked_distance
            .map_or(false, |tracked| tracked > 0 && distance < tracked);
        distance as f64 <= threshold || closer_than_target
    }

    /// Overall danger of staying out, in [0, 1].
    pub fn composite_risk(&self) -> f64 {
        let carried = self.view.carried();
        let inventory = carried as f64 / MAX_CARRIED as f64;
        let distance = f64::min(
            1.0, self.view.optimal_base_distance() as f64 / RETURN_MAX_DISTANCE);
        let time_pressure = 1.0 - self.view.time_ratio;
        let opponents = self.scoring.opponent_proximity(
            &self.view.position(), RETURN_OPPONENT_THRESHOLD);
        let max_opponent_carried = self.view.opponents()
            .map(|opponent| opponent.carried)
            .max()
            .unwrap_or(0);
        let deficit = max_opponent_carried.saturating_sub(carried) as f64 / MAX_CARRIED as f64;
        let risk = inventory * INVENTORY_WEIGHT
            + distance * BASE_DISTANCE_WEIGHT
            + time_pressure * TIME_PRESSURE_WEIGHT
            + opponents * OPPONENT_WEIGHT
            + deficit * COMPETITION_WEIGHT;
        f64::min(1.0, risk)
    }

    /// How much risk is acceptable right now.
    pub fn risk_tolerance(&self, current_risk: f64) -> f64 {
        let inventory = 1.0 - (self.view.carried() as f64 / MAX_CARRIED as f64) * 0.3;
        let time = f64::max(0.5, self.view.time_ratio);
        let risk = f64::max(0.7, 1.0 - current_risk * 0.3);
        inventory * time * risk
    }

    pub fn urgency_threshold_ms(&self) -> f64 {
        let carried = self.view.carried() as f64;
        URGENCY_BASE_MS * (1.0 + 0.3 * carried) * (1.0 + 0.5 * (1.0 - self.view.time_ratio))
    }

    /// Time to walk home, at one tile per second, with a carry-dependent margin.
    pub fn return_travel_ms(&self) -> f64 {
        let seconds = self.view.optimal_base_distance() as f64;
        seconds * 1000.0 * (1.2 + 0.1 * self.view.carried() as f64)
    }

    /// Writes the way home into `memory` and returns the tile to head to.
    pub fn choose_route(&self, memory: &mut RouteMemory) -> Pos {
        let position = self.view.position();
        let base = self.view.base();
        let portal_wins = match self.view.portal_pair {
            None => false,
            Some(pair) => match self.view.config.route_choice {
                RouteChoice::Shortest => {
                    let direct = self.view.direct_base_distance() as f64;
                    let portal = pair.route_distance(&position, &base) as f64;
                    portal < direct * self.view.config.portal_discount
                },
                RouteChoice::Safest => {
                    let direct = self.scoring.route_risk(&position, &base);
                    let portal = (self.scoring.route_risk(&position, &pair.near.position)
                                  + self.scoring.route_risk(&pair.far, &base)) / 2.0;
                    portal < direct
                },
            },
        };

        match self.view.portal_pair.filter(|_| portal_wins) {
            Some(pair) => {
                info!("[RETURN] Heading home through portal {:?}", pair.near.position);
                memory.via_portal = true;
                memory.active_portal = Some(pair.near);
                memory.set_targets(&[pair.near.position, base]);
                pair.near.position
            },
            None => {
                info!("[RETURN] Heading straight home to {base:?}");
                memory.via_portal = false;
                memory.active_portal = None;
                memory.set_targets(&[base]);
                base
            },
        }
    }
}

/// Composite risk above which a carry of `carried` goes home.
pub fn risk_threshold(carried: u8) -> f64 {
    match carried {
        1 => 0.7,
        2 => 0.6,
        3 => 0.5,
        4 => 0.4,
        _ => 0.3,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use crate::config::{EngineConfig, Profile};
    use crate::game_interface::Board;
    use super::*;

    fn make_board(position: (i32, i32), carried: u8, ms_left: u64, portals: Value) -> Board {
        serde_json::from_value(json!({
            "width": 20,
            "height": 20,
            "portals": portals,
            "agents": [{
                "id": 1, "position": {"x": position.0, "y": position.1},
                "base": {"x": 5, "y": 5},
                "carried": carried, "millisecondsLeft": ms_left,
            }],
        })).expect("invalid board")
    }

    fn far_portals() -> Value {
        json!([
            {"id": 10, "pairId": 1, "position": {"x": 18, "y": 18}},
            {"id": 11, "pairId": 1, "position": {"x": 6, "y": 5}},
        ])
    }

    fn add_opponent(board: &mut Board, x: i32, y: i32) {
        let opponent = serde_json::from_value(json!({
            "id": 2, "position": {"x": x, "y": y}, "base": {"x": 0, "y": 19},
            "carried": 0, "millisecondsLeft": 30000,
        })).expect("invalid opponent");
        board.agents.push(opponent);
    }

    #[test]
    fn test_full_always_returns() {
        for profile in Profile::ALL {
            let config = EngineConfig::preset(profile);
            for ms_left in [0, 1000, 30_000, 1_000_000] {
                let board = make_board((19, 19), 5, ms_left, json!([]));
                let view = TickView::new(&board.agents[0], &board, &config);
                let planner = BaseReturnPlanner::new(&view);
                assert_eq!(planner.primary_trigger(), Some(ReturnReason::Full));
            }
        }
    }

    #[test]
    fn test_distance_time_policy() {
        let config = EngineConfig::default();
        let board = make_board((15, 15), 2, 4000, json!([]));
        let view = TickView::new(&board.agents[0], &board, &config);
        assert_eq!(BaseReturnPlanner::new(&view).primary_trigger(), Some(ReturnReason::LowTime));

        let board = make_board((15, 15), 1, 4000, json!([]));
        let view = TickView::new(&board.agents[0], &board, &config);
        assert_eq!(BaseReturnPlanner::new(&view).primary_trigger(), None);

        let board = make_board((7, 7), 3, 30_000, json!([]));
        let view = TickView::new(&board.agents[0], &board, &config);
        let planner = BaseReturnPlanner::new(&view);
        assert_eq!(planner.secondary_trigger(None), Some(ReturnReason::NearBase));

        // Base ten tiles away, but the pickup being chased is even farther.
        let board = make_board((10, 10), 3, 30_000, json!([]));
        let view = TickView::new(&board.agents[0], &board, &config);
        let planner = BaseReturnPlanner::new(&view);
        assert_eq!(planner.secondary_trigger(Some(4)), None);
        assert_eq!(planner.secondary_trigger(Some(12)), Some(ReturnReason::NearBase));
    }

    #[test]
    fn test_risk_policy_thresholds() {
        let config = EngineConfig::preset(Profile::RiskAverse);
        // 0.3 * 4/5 + 0.2 * 30/40 + 0.2 * 1.0 = 0.59 > 0.4
        let board = make_board((20, 20), 4, 0, json!([]));
        let view = TickView::new(&board.agents[0], &board, &config);
        let planner = BaseReturnPlanner::new(&view);
        assert!((planner.composite_risk() - 0.59).abs() < 1e-9);
        assert!(matches!(planner.primary_trigger(), Some(ReturnReason::RiskThreshold { .. })));

        let board = make_board((6, 6), 1, 30_000, json!([]));
        let view = TickView::new(&board.agents[0], &board, &config);
        let planner = BaseReturnPlanner::new(&view);
        assert_eq!(planner.primary_trigger(), None);
        assert_eq!(planner.secondary_trigger(None), None);
        assert_eq!(risk_threshold(7), 0.3);
    }

    #[test]
    fn test_risk_tolerance_floors() {
        let config = EngineConfig::preset(Profile::RiskAverse);
        let board = make_board((20, 20), 4, 0, json!([]));
        let view = TickView::new(&board.agents[0], &board, &config);
        let planner = BaseReturnPlanner::new(&view);
        // (1 - 0.8 * 0.3) * 0.5 * 0.7
        assert!((planner.risk_tolerance(1.0) - 0.266).abs() < 1e-9);
    }

    #[test]
    fn test_urgency_policy() {
        let config = EngineConfig::preset(Profile::TimeWeighted);
        // threshold = 8000 * 1.3 * 1.25 = 13000
        let board = make_board((6, 5), 1, 15_000, json!([]));
        let view = TickView::new(&board.agents[0], &board, &config);
        let planner = BaseReturnPlanner::new(&view);
        assert!((planner.urgency_threshold_ms() - 13_000.0).abs() < 1e-6);
        assert_eq!(planner.primary_trigger(), None);

        let board = make_board((6, 5), 1, 12_000, json!([]));
        let view = TickView::new(&board.agents[0], &board, &config);
        assert!(matches!(BaseReturnPlanner::new(&view).primary_trigger(),
                         Some(ReturnReason::Urgency { .. })));

        // 30 tiles away needs 30 * 1000 * 1.3 = 39000 ms, more than left.
        let mut long_match = config.clone();
        long_match.match_duration_ms = 100_000;
        let board = make_board((20, 20), 1, 38_000, json!([]));
        let view = TickView::new(&board.agents[0], &board, &long_match);
        assert!(matches!(BaseReturnPlanner::new(&view).primary_trigger(),
                         Some(ReturnReason::TravelTime { .. })));

        let board = make_board((5, 5), 0, 100, json!([]));
        let view = TickView::new(&board.agents[0], &board, &config);
        assert_eq!(BaseReturnPlanner::new(&view).primary_trigger(), None);
    }

    #[test]
    fn test_direct_route_home() {
        let config = EngineConfig::default();
        let board = make_board((2, 5), 5, 30_000, json!([]));
        let view = TickView::new(&board.agents[0], &board, &config);
        let mut memory = RouteMemory::new();
        let target = BaseReturnPlanner::new(&view).choose_route(&mut memory);
        assert_eq!(target, Pos::new(5, 5));
        assert_eq!(memory.targets.as_slice(), &[Pos::new(5, 5)]);
        assert!(!memory.via_portal);
    }

    #[test]
    fn test_portal_route_home() {
        let config = EngineConfig::default();
        let board = make_board((19, 19), 5, 30_000, far_portals());
        let view = TickView::new(&board.agents[0], &board, &config);
        let mut memory = RouteMemory::new();
        let target = BaseReturnPlanner::new(&view).choose_route(&mut memory);
        assert_eq!(target, Pos::new(18, 18));
        assert_eq!(memory.targets.as_slice(), &[Pos::new(18, 18), Pos::new(5, 5)]);
        assert!(memory.via_portal);
        assert_eq!(memory.active_portal.map(|portal| portal.id), Some(10));

        // A steep discount keeps us walking.
        let mut discounted = config.clone();
        discounted.portal_discount = 0.05;
        let view = TickView::new(&board.agents[0], &board, &discounted);
        let mut memory = RouteMemory::new();
        assert_eq!(BaseReturnPlanner::new(&view).choose_route(&mut memory), Pos::new(5, 5));
    }

    #[test]
    fn test_equal_routes_stay_direct() {
        let config = EngineConfig::default();
        // Direct: 4. Portal: 2 + 2.
        let board = make_board((5, 9), 5, 30_000, json!([
            {"id": 10, "pairId": 1, "position": {"x": 5, "y": 11}},
            {"id": 11, "pairId": 1, "position": {"x": 5, "y": 3}},
        ]));
        let view = TickView::new(&board.agents[0], &board, &config);
        let mut memory = RouteMemory::new();
        assert_eq!(BaseReturnPlanner::new(&view).choose_route(&mut memory), Pos::new(5, 5));
    }

    #[test]
    fn test_safest_route_avoids_threatened_direct_path() {
        let config = EngineConfig::preset(Profile::RiskAverse);
        let mut board = make_board((19, 19), 5, 30_000, far_portals());

        // Nobody around: both routes are risk free, so we walk.
        let view = TickView::new(&board.agents[0], &board, &config);
        let mut memory = RouteMemory::new();
        assert_eq!(BaseReturnPlanner::new(&view).choose_route(&mut memory), Pos::new(5, 5));
        assert!(!memory.via_portal);

        // Opponent sitting on the midpoint of the walk home.
        add_opponent(&mut board, 12, 12);
        let view = TickView::new(&board.agents[0], &board, &config);
        let mut memory = RouteMemory::new();
        let target = BaseReturnPlanner::new(&view).choose_route(&mut memory);
        assert_eq!(target, Pos::new(18, 18));
        assert!(memory.via_portal);
        assert_eq!(memory.targets.as_slice(), &[Pos::new(18, 18), Pos::new(5, 5)]);
    }

    #[test]
    fn test_urgency_secondary_near_base() {
        let config = EngineConfig::preset(Profile::TimeWeighted);
        // Start of the match: base counts as near within 3 tiles.
        let board = make_board((6, 7), 2, 30_000, json!([]));
        let view = TickView::new(&board.agents[0], &board, &config);
        assert_eq!(BaseReturnPlanner::new(&view).secondary_trigger(None),
                   Some(ReturnReason::NearBase));

        let board = make_board((6, 7), 1, 30_000, json!([]));
        let view = TickView::new(&board.agents[0], &board, &config);
        assert_eq!(BaseReturnPlanner::new(&view).secondary_trigger(None), None);

        let board = make_board((8, 8), 2, 30_000, json!([]));
        let view = TickView::new(&board.agents[0], &board, &config);
        assert_eq!(BaseReturnPlanner::new(&view).secondary_trigger(None), None);

        // Half time: the radius grows to 3 + 0.5 * 7 = 6.5.
        let board = make_board((8, 8), 2, 15_000, json!([]));
        let view = TickView::new(&board.agents[0], &board, &config);
        assert_eq!(BaseReturnPlanner::new(&view).secondary_trigger(None),
                   Some(ReturnReason::NearBase));
    }

    #[test]
    fn test_risk_secondary_fires_below_threshold() {
        let config = EngineConfig::preset(Profile::RiskAverse);
        // risk = 0.3 * 2/5 + 0.2 * 28/40 + 0.2 * 1.0 = 0.46, under the 0.6 threshold.
        // tolerance = (1 - 0.4 * 0.3) * 0.5 * (1 - 0.46 * 0.3) = 0.37928
        let board = make_board((19, 19), 2, 0, json!([]));
        let view = TickView::new(&board.agents[0], &board, &config);
        let planner = BaseReturnPlanner::new(&view);
        assert_eq!(planner.primary_trigger(), None);
        match planner.secondary_trigger(None) {
            Some(ReturnReason::RiskTolerance { risk, tolerance }) => {
                assert!((risk - 0.46).abs() < 1e-9);
                assert!((tolerance - 0.37928).abs() < 1e-9);
            },
            other => panic!("expected a risk tolerance return, got {other:?}"),
        }
    }
}
