// Picks the next objective when the route plan is empty.
use log::{debug, info};

use crate::game_interface::{Pickup, Portal, PortalPair, Pos};
use crate::route_memory::RouteMemory;
use crate::scoring::ScoringEngine;
use crate::tick::TickView;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Objective {
    Direct { pickup: Pos },
    ViaPortal { portal: Portal, pickup: Pos },
    Button { button: Pos },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub objective: Objective,
    pub score: f64,
}

impl Selection {
    /// First position the agent heads to.
    pub fn first_target(&self) -> Pos {
        match self.objective {
            Objective::Direct { pickup } => pickup,
            Objective::ViaPortal { portal, .. } => portal.position,
            Objective::Button { button } => button,
        }
    }

    pub fn write_to(&self, memory: &mut RouteMemory) {
        match self.objective {
            Objective::Direct { pickup } => memory.set_targets(&[pickup]),
            Objective::Button { button } => memory.set_targets(&[button]),
            Objective::ViaPortal { portal, pickup } => {
                memory.set_targets(&[portal.position, pickup]);
                memory.active_portal = Some(portal);
            },
        }
    }
}

pub struct TargetSelector<'v, 'a> {
    view: &'v TickView<'a>,
    scoring: ScoringEngine<'v, 'a>,
}

impl<'v, 'a> TargetSelector<'v, 'a> {
    pub fn new(view: &'v TickView<'a>) -> Self {
        TargetSelector { view, scoring: ScoringEngine::new(view) }
    }

    fn eligible(&self) -> impl Iterator<Item=&'a Pickup> + 'a {
        let carried = self.view.carried();
        let board = self.view.board;
        board.pickups.iter().filter(move |pickup| pickup.is_collectible(carried))
    }

    /// Highest scoring pickup, given how far each one is. Only strictly
    /// positive scores count; earlier pickups win ties.
    fn best_pickup<F>(&self, distance_to: F) -> Option<(Pos, f64)>
    where
        F: Fn(&Pos) -> u32,
    {
        let mut best: Option<(Pos, f64)> = None;
        for pickup in self.eligible() {
            let distance = distance_to(&pickup.position);
            let score = self.scoring.score(pickup.value, distance, &pickup.position);
            let best_score = best.map_or(0.0, |(_, score)| score);
            if score > best_score {
                best = Some((pickup.position, score));
            }
        }
        best
    }

    pub fn direct(&self) -> Option<Selection> {
        let from = self.view.position();
        self.best_pickup(|pickup| from.manhattan(pickup))
            .map(|(pickup, score)| Selection {
                objective: Objective::Direct { pickup },
                score,
            })
    }

    pub fn via_portal(&self) -> Option<Selection> {
        let pair: PortalPair = self.view.portal_pair?;
        let from = self.view.position();
        self.best_pickup(|pickup| pair.route_distance(&from, pickup))
            .map(|(pickup, score)| Selection {
                objective: Objective::ViaPortal { portal: pair.near, pickup },
                score,
            })
    }

    pub fn button(&self) -> Option<Selection> {
        let button = self.view.board.buttons.first()?.position;
        let distance = self.view.position().manhattan(&button);
        let score = self.scoring.score(self.view.config.button_value, distance, &button);
        (score > 0.0).then_some(Selection {
            objective: Objective::Button { button },
            score,
        })
    }

    /// Best of the direct, portal and button candidates. Ties go to the
    /// earlier of the three.
    pub fn select(&self) -> Option<Selection> {
        let candidates = [self.direct(), self.via_portal(), self.button()];
        debug!("[SELECT] Candidates: {candidates:?}");
        let mut best: Option<Selection> = None;
        for candidate in candidates.into_iter().flatten() {
            if best.map_or(true, |best| candidate.score > best.score) {
                best = Some(candidate);
            }
        }
        match &best {
            Some(selection) => info!("[SELECT] Going for {:?} (score {:.3})",
                                     selection.objective, selection.score),
            None => info!("[SELECT] Nothing worth going for."),
        }
        best
    }
}
