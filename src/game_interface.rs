use serde::{Deserialize, Serialize};

/// Carried count at which the agent must head home.
pub const MAX_CARRIED: u8 = 5;
/// Value of the hazardous (red) pickup class.
pub const HAZARDOUS_VALUE: u8 = 2;

#[derive(Deserialize, Serialize, Debug, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Copy, Clone)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    pub fn new(x: i32, y: i32) -> Self {
        Pos { x, y }
    }

    pub fn manhattan(&self, other: &Pos) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    pub fn offset(&self, step: Move) -> Pos {
        Pos { x: self.x + step.dx, y: self.y + step.dy }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct Pickup {
    pub value: u8,
    pub position: Pos,
}

impl Pickup {
    pub fn is_hazardous(&self) -> bool {
        self.value == HAZARDOUS_VALUE
    }

    /// Red pickups would overflow a carry of 4.
    pub fn is_collectible(&self, carried: u8) -> bool {
        !(self.is_hazardous() && carried == MAX_CARRIED - 1)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Portal {
    pub id: u32,
    pub pair_id: u32,
    pub position: Pos,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Button {
    pub position: Pos,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: u32,
    pub position: Pos,
    pub base: Pos,
    #[serde(default)]
    pub carried: u8,
    pub milliseconds_left: u64,
}

impl Agent {
    pub fn at_base(&self) -> bool {
        self.position == self.base
    }
}

/// Nearest portal to some origin, along with where it lets out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortalPair {
    pub near: Portal,
    pub far: Pos,
}

impl PortalPair {
    /// Distance from `from` to `to` when entering `near` and leaving at `far`.
    pub fn route_distance(&self, from: &Pos, to: &Pos) -> u32 {
        from.manhattan(&self.near.position) + self.far.manhattan(to)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    #[serde(default)]
    pub width: Option<i32>,
    #[serde(default)]
    pub height: Option<i32>,
    #[serde(default)]
    pub pickups: Vec<Pickup>,
    #[serde(default)]
    pub portals: Vec<Portal>,
    #[serde(default)]
    pub buttons: Vec<Button>,
    #[serde(default)]
    pub agents: Vec<Agent>,
}

impl Board {
    pub fn agent(&self, id: u32) -> Option<&Agent> {
        self.agents.iter().find(|agent| agent.id == id)
    }

    pub fn opponents(&self, id: u32) -> impl Iterator<Item=&Agent> + '_ {
        self.agents.iter().filter(move |agent| agent.id != id)
    }

    /// Unknown dimensions only bound the board at zero.
    pub fn contains(&self, pos: &Pos) -> bool {
        pos.x >= 0 && pos.y >= 0
            && self.width.map_or(true, |width| pos.x < width)
            && self.height.map_or(true, |height| pos.y < height)
    }

    pub fn paired_portal(&self, portal: &Portal) -> Option<&Portal> {
        self.portals.iter()
            .find(|other| other.pair_id == portal.pair_id && other.id != portal.id)
    }

    /// Nearest portal to `from` and its paired exit. None when there is no
    /// portal, when the nearest has no partner, or when `from` already sits
    /// on a portal.
    pub fn nearest_portal_pair(&self, from: &Pos) -> Option<PortalPair> {
        if self.portals.iter().any(|portal| portal.position == *from) {
            return None;
        }
        let near = self.portals.iter()
            .min_by_key(|portal| portal.position.manhattan(from))?;
        let far = self.paired_portal(near)?;
        Some(PortalPair { near: *near, far: far.position })
    }
}

/// Single-tile displacement sent back to the host.
#[derive(Deserialize, Serialize, Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct Move {
    pub dx: i32,
    pub dy: i32,
}

impl Move {
    pub const STAY: Move = Move { dx: 0, dy: 0 };

    pub fn new(dx: i32, dy: i32) -> Self {
        Move { dx: dx.signum(), dy: dy.signum() }
    }

    pub fn is_stay(&self) -> bool {
        self.dx == 0 && self.dy == 0
    }

    /// Host step functions are trusted, but not blindly.
    pub fn clamped(self) -> Self {
        Move::new(self.dx, self.dy)
    }
}

/// One line of host input.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TickRequest {
    pub agent_id: u32,
    pub board: Board,
}
