use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Canonical enumeration order for pursuer decisions; distance ties
    /// resolve to the earliest entry.
    pub const DECISION_ORDER: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn dx(self) -> i32 {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
            Direction::Up | Direction::Down => 0,
        }
    }

    pub fn dy(self) -> i32 {
        match self {
            Direction::Up => -1,
            Direction::Down => 1,
            Direction::Left | Direction::Right => 0,
        }
    }

    pub fn reverse(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Display angle in degrees for the render adapter, clockwise from
    /// facing right.
    pub fn angle(self) -> i32 {
        match self {
            Direction::Right => 0,
            Direction::Down => 90,
            Direction::Left => 180,
            Direction::Up => 270,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TileKind {
    Wall,
    Open,
    Pickup,
    PowerPickup,
    Den,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Playing,
    Won,
    Lost,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerAgent {
    pub pos: Vec2,
    pub dir: Direction,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PursuerAgent {
    pub id: &'static str,
    pub pos: Vec2,
    pub dir: Direction,
    pub color: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlayerView {
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
    pub angle: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PursuerView {
    pub id: String,
    pub x: i32,
    pub y: i32,
    pub dir: Direction,
    pub color: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PickupView {
    pub x: i32,
    pub y: i32,
    pub power: bool,
}

/// Per-frame read surface for the render adapter. Grid coordinates only;
/// tile-to-pixel mapping is the adapter's job.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub score: i32,
    pub state: SessionState,
    pub player: PlayerView,
    pub pursuers: Vec<PursuerView>,
    pub pickups: Vec<PickupView>,
    #[serde(rename = "pickupsRemaining")]
    pub pickups_remaining: usize,
}

/// Static grid data handed to the sizing/render adapters at startup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MazeInit {
    pub width: i32,
    pub height: i32,
    pub tiles: Vec<String>,
}
