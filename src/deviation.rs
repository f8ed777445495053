// Single-tile lateral detours around hazards sitting on the way to a target.
use log::debug;

use crate::config::{HazardClass, HazardOrder};
use crate::game_interface::{Board, Pos};

/// `value` lies on the way from `start` to `target` along one axis. The
/// bound nearer to the start is inclusive, the target bound is not.
fn between(value: i32, start: i32, target: i32) -> bool {
    (target < value && value <= start) || (start <= value && value < target)
}

/// Step one tile off `target` along an axis, back toward `start`. When
/// start and target agree on that axis, step down unless that would leave
/// the board edge.
fn sidestep(target: i32, start: i32) -> i32 {
    if target > start {
        target - 1
    } else if target < start {
        target + 1
    } else if target <= 1 {
        target + 1
    } else {
        target - 1
    }
}

/// Detour for one hazard, if it blocks the straight path.
pub fn detour_around(hazard: Pos, start: Pos, target: Pos) -> Option<Pos> {
    if hazard.x == target.x && between(hazard.y, start.y, target.y) {
        Some(Pos::new(sidestep(target.x, start.x), target.y))
    } else if hazard.y == target.y && between(hazard.x, start.x, target.x) {
        Some(Pos::new(target.x, sidestep(target.y, start.y)))
    } else if hazard.y == start.y && between(hazard.x, start.x, target.x) {
        if target.y != start.y {
            Some(Pos::new(start.x, target.y))
        } else {
            Some(Pos::new(start.x, sidestep(start.y, start.y)))
        }
    } else {
        None
    }
}

pub struct ObstacleDeviator {
    order: HazardOrder,
}

impl ObstacleDeviator {
    pub fn new(order: HazardOrder) -> Self {
        ObstacleDeviator { order }
    }

    fn hazards(class: HazardClass, board: &Board) -> Vec<Pos> {
        match class {
            HazardClass::Portal => {
                board.portals.iter().map(|portal| portal.position).collect()
            },
            HazardClass::HazardousPickup => {
                board.pickups.iter()
                    .filter(|pickup| pickup.is_hazardous())
                    .map(|pickup| pickup.position)
                    .collect()
            },
        }
    }

    /// Replacement target avoiding hazards of `class` between `start` and
    /// `target`, or None when the path is clear.
    pub fn deviate(&self, class: HazardClass, start: Pos, target: Pos,
                   board: &Board) -> Option<Pos> {
        let detours = Self::hazards(class, board).into_iter()
            .filter(|hazard| *hazard != start)
            .filter_map(|hazard| detour_around(hazard, start, target)
                        .map(|detour| (hazard, detour)));
        let chosen = match self.order {
            HazardOrder::Nearest => detours
                .min_by_key(|(hazard, _)| hazard.manhattan(&start)),
            HazardOrder::Last => detours.last(),
        };
        if let Some((hazard, detour)) = chosen {
            debug!("[DEVIATE] {class:?} at {hazard:?} blocks {start:?} -> {target:?}, \
                    detouring via {detour:?}");
        }
        chosen.map(|(_, detour)| detour)
    }
}
