use crate::config::EngineConfig;
use crate::game_interface::{Agent, Board, PortalPair, Pos};

/// Everything a decision needs to know about the current tick, computed once.
pub struct TickView<'a> {
    pub agent: &'a Agent,
    pub board: &'a Board,
    pub config: &'a EngineConfig,
    pub time_ratio: f64,
    /// Nearest portal to the agent and its exit, when one resolves.
    pub portal_pair: Option<PortalPair>,
}

impl<'a> TickView<'a> {
    pub fn new(agent: &'a Agent, board: &'a Board, config: &'a EngineConfig) -> Self {
        TickView {
            agent,
            board,
            config,
            time_ratio: config.time_ratio(agent.milliseconds_left),
            portal_pair: board.nearest_portal_pair(&agent.position),
        }
    }

    pub fn position(&self) -> Pos {
        self.agent.position
    }

    pub fn base(&self) -> Pos {
        self.agent.base
    }

    pub fn carried(&self) -> u8 {
        self.agent.carried
    }

    pub fn opponents(&self) -> impl Iterator<Item=&'a Agent> + 'a {
        let board: &'a Board = self.board;
        board.opponents(self.agent.id)
    }

    pub fn direct_base_distance(&self) -> u32 {
        self.position().manhattan(&self.base())
    }

    pub fn portal_base_distance(&self) -> Option<u32> {
        self.portal_pair
            .map(|pair| pair.route_distance(&self.position(), &self.base()))
    }

    /// Shortest of the direct and portal-assisted distances to base.
    pub fn optimal_base_distance(&self) -> u32 {
        let direct = self.direct_base_distance();
        self.portal_base_distance().map_or(direct, |portal| direct.min(portal))
    }
}
