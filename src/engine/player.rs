use crate::maze;
use crate::types::{Direction, PlayerAgent};

/// Resolve one movement tick for the player.
///
/// The requested direction wins when its cell is open; otherwise the agent
/// keeps rolling along its current facing, and stays put when both are
/// blocked. A queued turn is honored on the first tick it becomes legal.
pub fn next_player_state(current: PlayerAgent, requested: Direction) -> PlayerAgent {
    let turned = maze::neighbor(current.pos, requested);
    if !maze::is_blocked(turned) {
        return PlayerAgent {
            pos: maze::wrap(turned),
            dir: requested,
        };
    }
    let ahead = maze::neighbor(current.pos, current.dir);
    if maze::is_blocked(ahead) {
        return current;
    }
    PlayerAgent {
        pos: maze::wrap(ahead),
        dir: current.dir,
    }
}
