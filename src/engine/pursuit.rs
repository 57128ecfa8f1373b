use crate::maze;
use crate::types::{Direction, PursuerAgent, Vec2};

fn distance_sq(a: Vec2, b: Vec2) -> i64 {
    let dx = (a.x - b.x) as i64;
    let dy = (a.y - b.y) as i64;
    dx * dx + dy * dy
}

/// Resolve one pursuit decision toward `target`.
///
/// Greedy single-step chase: no lookahead, no pathfinding. Candidates that
/// reverse the current facing, or lead into a wall, a blocked off-grid
/// cell, or the den, are dropped; the survivor whose cell lies closest to
/// the target (straight-line) wins, earliest entry in
/// `Direction::DECISION_ORDER` on ties. When nothing survives the reverse
/// is forced so a dead-ended pursuer is never stuck; the escape move is not
/// wall-checked, and the den-spawned pursuer leaves the enclosure through
/// it.
pub fn next_pursuer_state(current: &PursuerAgent, target: Vec2) -> PursuerAgent {
    let reverse = current.dir.reverse();
    let mut best: Option<(Direction, i64)> = None;
    for dir in Direction::DECISION_ORDER {
        if dir == reverse {
            continue;
        }
        let cell = maze::neighbor(current.pos, dir);
        if maze::is_blocked(cell) || maze::is_den(cell) {
            continue;
        }
        let dist = distance_sq(cell, target);
        if best.map_or(true, |(_, lead)| dist < lead) {
            best = Some((dir, dist));
        }
    }

    let dir = best.map(|(dir, _)| dir).unwrap_or(reverse);
    let stepped = maze::wrap(maze::neighbor(current.pos, dir));
    let pos = if maze::in_bounds(stepped) {
        stepped
    } else {
        current.pos
    };
    PursuerAgent {
        pos,
        dir,
        ..*current
    }
}
