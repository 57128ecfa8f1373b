use crate::types::{Direction, MazeInit, PlayerAgent, PursuerAgent, TileKind, Vec2};

pub const COLS: i32 = 19;
pub const ROWS: i32 = 21;

/// Row holding the two tunnel cells that wrap agents across the grid.
pub const WRAP_ROW: i32 = 10;

// '#' wall, '.' pickup, 'o' power pickup, ' ' open floor, '-' pursuer den.
const LAYOUT: [&str; ROWS as usize] = [
    "###################",
    "#........#........#",
    "#.###.#######.###.#",
    "#o###.#######.###o#",
    "#.................#",
    "#.###.#.###.#.###.#",
    "#.....#..#..#.....#",
    "#####.### ###.#####",
    "    #.#     #.#    ",
    "#####.# ### #.#####",
    "......  #-#  ......",
    "#####.# ### #.#####",
    "    #.#     #.#    ",
    "#####.# ### #.#####",
    "#........#........#",
    "#.###.#######.###.#",
    "#o..#.........#..o#",
    "###.#.#.###.#.#.###",
    "#.....#..#..#.....#",
    "#.###############.#",
    "###################",
];

pub const PLAYER_SPAWN: PlayerAgent = PlayerAgent {
    pos: Vec2 { x: 9, y: 16 },
    dir: Direction::Left,
};

// Three of these tiles are wall/den cells; the decision rule walks each
// pursuer onto the open grid within its first move.
pub const PURSUER_SPAWNS: [PursuerAgent; 4] = [
    PursuerAgent {
        id: "blinky",
        pos: Vec2 { x: 9, y: 9 },
        dir: Direction::Left,
        color: "#FF0000",
    },
    PursuerAgent {
        id: "pinky",
        pos: Vec2 { x: 8, y: 10 },
        dir: Direction::Up,
        color: "#FFB8FF",
    },
    PursuerAgent {
        id: "inky",
        pos: Vec2 { x: 9, y: 10 },
        dir: Direction::Up,
        color: "#00FFFF",
    },
    PursuerAgent {
        id: "clyde",
        pos: Vec2 { x: 10, y: 10 },
        dir: Direction::Up,
        color: "#FFB852",
    },
];

pub fn in_bounds(pos: Vec2) -> bool {
    pos.x >= 0 && pos.y >= 0 && pos.x < COLS && pos.y < ROWS
}

pub fn tile_at(pos: Vec2) -> Option<TileKind> {
    if !in_bounds(pos) {
        return None;
    }
    let row = LAYOUT[pos.y as usize].as_bytes();
    Some(match row[pos.x as usize] {
        b'#' => TileKind::Wall,
        b'.' => TileKind::Pickup,
        b'o' => TileKind::PowerPickup,
        b'-' => TileKind::Den,
        _ => TileKind::Open,
    })
}

pub fn is_wall(pos: Vec2) -> bool {
    matches!(tile_at(pos), Some(TileKind::Wall))
}

/// The pursuer enclosure. Excluded from pursuer moves only; the player is
/// never blocked by it.
pub fn is_den(pos: Vec2) -> bool {
    matches!(tile_at(pos), Some(TileKind::Den))
}

/// The two sanctioned off-grid cells, one step past either end of the
/// wrap row.
pub fn is_wrap_cell(pos: Vec2) -> bool {
    pos.y == WRAP_ROW && (pos.x == -1 || pos.x == COLS)
}

/// Walls block, and so does any out-of-range cell that is not one of the
/// wrap cells.
pub fn is_blocked(pos: Vec2) -> bool {
    if is_wrap_cell(pos) {
        return false;
    }
    match tile_at(pos) {
        None | Some(TileKind::Wall) => true,
        Some(_) => false,
    }
}

pub fn neighbor(pos: Vec2, dir: Direction) -> Vec2 {
    Vec2 {
        x: pos.x + dir.dx(),
        y: pos.y + dir.dy(),
    }
}

/// Teleport a wrap cell to the opposite column of its row; any other
/// position passes through unchanged.
pub fn wrap(pos: Vec2) -> Vec2 {
    if pos.y == WRAP_ROW {
        if pos.x == -1 {
            return Vec2 {
                x: COLS - 1,
                y: pos.y,
            };
        }
        if pos.x == COLS {
            return Vec2 { x: 0, y: pos.y };
        }
    }
    pos
}

pub fn to_maze_init() -> MazeInit {
    MazeInit {
        width: COLS,
        height: ROWS,
        tiles: LAYOUT.iter().map(|row| row.to_string()).collect(),
    }
}
