use crate::constants::{PICKUP_SCORE, PURSUER_SPEED_RATIO};
use crate::maze;
use crate::types::{
    Direction, PickupView, PlayerAgent, PlayerView, PursuerAgent, PursuerView, SessionState,
    Snapshot, TileKind, Vec2,
};

mod player;
mod pursuit;

pub use player::next_player_state;
pub use pursuit::next_pursuer_state;

/// Boolean mask over the grid, true where an uncollected pickup remains.
/// A cell transitions true to false exactly once and never back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PickupField {
    mask: Vec<bool>,
    remaining: usize,
}

impl PickupField {
    fn full() -> Self {
        let mut mask = vec![false; (maze::COLS * maze::ROWS) as usize];
        let mut remaining = 0;
        for y in 0..maze::ROWS {
            for x in 0..maze::COLS {
                let pos = Vec2 { x, y };
                if matches!(
                    maze::tile_at(pos),
                    Some(TileKind::Pickup | TileKind::PowerPickup)
                ) {
                    mask[Self::index(pos)] = true;
                    remaining += 1;
                }
            }
        }
        Self { mask, remaining }
    }

    fn index(pos: Vec2) -> usize {
        (pos.y * maze::COLS + pos.x) as usize
    }

    pub fn is_set(&self, pos: Vec2) -> bool {
        maze::in_bounds(pos) && self.mask[Self::index(pos)]
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    fn take(&mut self, pos: Vec2) -> bool {
        if !self.is_set(pos) {
            return false;
        }
        self.mask[Self::index(pos)] = false;
        self.remaining -= 1;
        true
    }
}

/// The whole owned simulation state of one session. All mutation goes
/// through `step`, `set_requested_direction` and `reset`.
#[derive(Clone, Debug, PartialEq)]
pub struct GameEngine {
    tick_counter: u64,
    player: PlayerAgent,
    pursuers: Vec<PursuerAgent>,
    pickups: PickupField,
    score: i32,
    state: SessionState,
    requested_dir: Direction,
}

impl GameEngine {
    pub fn new() -> Self {
        Self {
            tick_counter: 0,
            player: maze::PLAYER_SPAWN,
            pursuers: maze::PURSUER_SPAWNS.to_vec(),
            pickups: PickupField::full(),
            score: 0,
            state: SessionState::Playing,
            requested_dir: maze::PLAYER_SPAWN.dir,
        }
    }

    /// Reinitialize everything to the documented starting state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Input boundary. Not validated here; the movement resolver checks
    /// legality when the next tick consumes it. Last write wins.
    pub fn set_requested_direction(&mut self, dir: Direction) {
        self.requested_dir = dir;
    }

    pub fn session_state(&self) -> SessionState {
        self.state
    }

    pub fn is_ended(&self) -> bool {
        self.state != SessionState::Playing
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn tick_counter(&self) -> u64 {
        self.tick_counter
    }

    pub fn pickups(&self) -> &PickupField {
        &self.pickups
    }

    /// Advance the simulation by one tick: player movement, pickup
    /// consumption at the resolved position, pursuer decisions on every
    /// `PURSUER_SPEED_RATIO`th tick, then the termination check. A no-op
    /// once the session is over.
    pub fn step(&mut self) {
        if self.state != SessionState::Playing {
            return;
        }
        self.tick_counter += 1;

        self.player = player::next_player_state(self.player, self.requested_dir);
        if self.pickups.take(self.player.pos) {
            self.score += PICKUP_SCORE;
        }

        if self.tick_counter % PURSUER_SPEED_RATIO == 0 {
            // Pursuers target the position the player just moved to.
            let target = self.player.pos;
            for pursuer in &mut self.pursuers {
                *pursuer = pursuit::next_pursuer_state(pursuer, target);
            }
        }

        self.refresh_session_state();
    }

    // Collision is checked first, so clearing the board on the same tick a
    // pursuer lands on the player is still a loss.
    fn refresh_session_state(&mut self) {
        if self
            .pursuers
            .iter()
            .any(|pursuer| pursuer.pos == self.player.pos)
        {
            self.state = SessionState::Lost;
        } else if self.pickups.remaining() == 0 {
            self.state = SessionState::Won;
        }
    }

    pub fn build_snapshot(&self) -> Snapshot {
        let mut pickups = Vec::with_capacity(self.pickups.remaining());
        for y in 0..maze::ROWS {
            for x in 0..maze::COLS {
                let pos = Vec2 { x, y };
                if self.pickups.is_set(pos) {
                    pickups.push(PickupView {
                        x,
                        y,
                        power: matches!(maze::tile_at(pos), Some(TileKind::PowerPickup)),
                    });
                }
            }
        }

        Snapshot {
            tick: self.tick_counter,
            score: self.score,
            state: self.state,
            player: PlayerView {
                x: self.player.pos.x,
                y: self.player.pos.y,
                dir: self.player.dir,
                angle: self.player.dir.angle(),
            },
            pursuers: self
                .pursuers
                .iter()
                .map(|pursuer| PursuerView {
                    id: pursuer.id.to_string(),
                    x: pursuer.pos.x,
                    y: pursuer.pos.y,
                    dir: pursuer.dir,
                    color: pursuer.color.to_string(),
                })
                .collect(),
            pickups,
            pickups_remaining: self.pickups.remaining(),
        }
    }
}

impl Default for GameEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::{PLAYER_SPAWN, PURSUER_SPAWNS};

    fn clear_pickups_except(engine: &mut GameEngine, keep: &[Vec2]) {
        for y in 0..maze::ROWS {
            for x in 0..maze::COLS {
                let pos = Vec2 { x, y };
                if engine.pickups.is_set(pos) && !keep.contains(&pos) {
                    engine.pickups.take(pos);
                }
            }
        }
    }

    #[test]
    fn starts_in_the_documented_initial_state() {
        let engine = GameEngine::new();
        assert_eq!(engine.player, PLAYER_SPAWN);
        assert_eq!(engine.pursuers, PURSUER_SPAWNS.to_vec());
        assert_eq!(engine.score, 0);
        assert_eq!(engine.state, SessionState::Playing);
        assert_eq!(engine.requested_dir, Direction::Left);
        assert_eq!(engine.tick_counter, 0);
        assert!(engine.pickups.is_set(PLAYER_SPAWN.pos));
    }

    #[test]
    fn first_tick_consumes_the_first_corridor_pickup() {
        let mut engine = GameEngine::new();
        engine.step();
        assert_eq!(engine.player.pos, Vec2 { x: 8, y: 16 });
        assert_eq!(engine.score, 10);
        assert!(!engine.pickups.is_set(Vec2 { x: 8, y: 16 }));
        // The pickup under the spawn tile is only collected on a revisit.
        assert!(engine.pickups.is_set(PLAYER_SPAWN.pos));
    }

    #[test]
    fn consuming_a_cell_twice_scores_once() {
        let mut engine = GameEngine::new();
        engine.step();
        let score_after_first = engine.score;

        // Walk back over the already-cleared cell.
        engine.set_requested_direction(Direction::Right);
        engine.step();
        assert_eq!(engine.player.pos, PLAYER_SPAWN.pos);
        // The spawn pickup is still there, so exactly one more reward.
        assert_eq!(engine.score, score_after_first + 10);
        engine.set_requested_direction(Direction::Left);
        engine.step();
        assert_eq!(engine.player.pos, Vec2 { x: 8, y: 16 });
        assert_eq!(engine.score, score_after_first + 10);
    }

    #[test]
    fn pursuers_hold_still_until_the_ratio_tick() {
        let mut engine = GameEngine::new();
        for _ in 0..PURSUER_SPEED_RATIO - 1 {
            engine.step();
            assert_eq!(engine.pursuers, PURSUER_SPAWNS.to_vec());
        }
        engine.step();
        assert_ne!(engine.pursuers, PURSUER_SPAWNS.to_vec());
    }

    #[test]
    fn fourth_tick_moves_every_pursuer_exactly_one_decision() {
        let mut engine = GameEngine::new();
        for _ in 0..PURSUER_SPEED_RATIO {
            engine.step();
        }
        // Player has slid left to (5,16); each pursuer has applied one
        // greedy move from its spawn.
        assert_eq!(engine.player.pos, Vec2 { x: 5, y: 16 });
        let by_id: Vec<(&str, Vec2, Direction)> = engine
            .pursuers
            .iter()
            .map(|p| (p.id, p.pos, p.dir))
            .collect();
        assert_eq!(
            by_id,
            vec![
                ("blinky", Vec2 { x: 9, y: 8 }, Direction::Up),
                ("pinky", Vec2 { x: 7, y: 10 }, Direction::Left),
                ("inky", Vec2 { x: 9, y: 11 }, Direction::Down),
                ("clyde", Vec2 { x: 11, y: 10 }, Direction::Right),
            ]
        );
    }

    #[test]
    fn collision_ends_the_session_as_lost() {
        let mut engine = GameEngine::new();
        engine.pursuers[0].pos = Vec2 { x: 8, y: 16 };
        engine.step();
        assert_eq!(engine.player.pos, Vec2 { x: 8, y: 16 });
        assert_eq!(engine.state, SessionState::Lost);
    }

    #[test]
    fn loss_takes_precedence_over_a_simultaneous_clear() {
        let mut engine = GameEngine::new();
        let last = Vec2 { x: 8, y: 16 };
        clear_pickups_except(&mut engine, &[last]);
        engine.pursuers[0].pos = last;
        engine.step();
        assert_eq!(engine.pickups.remaining(), 0);
        assert_eq!(engine.state, SessionState::Lost);
    }

    #[test]
    fn clearing_the_field_wins() {
        let mut engine = GameEngine::new();
        clear_pickups_except(&mut engine, &[Vec2 { x: 8, y: 16 }]);
        engine.step();
        assert_eq!(engine.score, 10);
        assert_eq!(engine.state, SessionState::Won);
    }

    #[test]
    fn terminal_state_freezes_the_simulation() {
        let mut engine = GameEngine::new();
        engine.pursuers[0].pos = Vec2 { x: 8, y: 16 };
        engine.step();
        assert!(engine.is_ended());

        let frozen = engine.clone();
        for _ in 0..5 {
            engine.step();
            engine.set_requested_direction(Direction::Up);
            engine.step();
        }
        assert_eq!(engine.player, frozen.player);
        assert_eq!(engine.pursuers, frozen.pursuers);
        assert_eq!(engine.pickups, frozen.pickups);
        assert_eq!(engine.score, frozen.score);
        assert_eq!(engine.tick_counter, frozen.tick_counter);
        assert_eq!(engine.state, frozen.state);
    }

    #[test]
    fn reset_matches_a_freshly_constructed_engine() {
        let mut engine = GameEngine::new();
        engine.set_requested_direction(Direction::Up);
        for _ in 0..17 {
            engine.step();
        }
        assert_ne!(engine, GameEngine::new());

        engine.reset();
        assert_eq!(engine, GameEngine::new());
    }

    #[test]
    fn reset_recovers_from_a_lost_session() {
        let mut engine = GameEngine::new();
        engine.pursuers[0].pos = Vec2 { x: 8, y: 16 };
        engine.step();
        assert_eq!(engine.state, SessionState::Lost);

        engine.reset();
        assert_eq!(engine.state, SessionState::Playing);
        let mut replay = GameEngine::new();
        engine.step();
        replay.step();
        assert_eq!(engine, replay);
    }

    #[test]
    fn player_never_moves_more_than_one_axis_step_per_tick() {
        let mut engine = GameEngine::new();
        let dirs = Direction::DECISION_ORDER;
        for tick in 0..400u64 {
            let before = engine.player.pos;
            engine.set_requested_direction(dirs[(tick % 4) as usize]);
            engine.step();
            if engine.is_ended() {
                break;
            }
            let after = engine.player.pos;
            let dx = (after.x - before.x).abs();
            let dy = (after.y - before.y).abs();
            let wrap_jump =
                dy == 0 && after.y == maze::WRAP_ROW && dx == maze::COLS - 1;
            assert!(
                dx + dy <= 1 || wrap_jump,
                "illegal displacement at tick {tick}: {before:?} -> {after:?}"
            );
        }
    }

    #[test]
    fn score_tracks_consumed_pickups_exactly() {
        let mut engine = GameEngine::new();
        let total = engine.pickups.remaining();
        let dirs = Direction::DECISION_ORDER;
        for tick in 0..600u64 {
            engine.set_requested_direction(dirs[(tick % 3) as usize]);
            engine.step();
            let consumed = total - engine.pickups.remaining();
            assert_eq!(engine.score, consumed as i32 * 10);
            if engine.is_ended() {
                break;
            }
        }
    }

    #[test]
    fn pursuers_never_reverse_unless_dead_ended() {
        let mut engine = GameEngine::new();
        for _ in 0..400u64 {
            let before: Vec<Direction> = engine.pursuers.iter().map(|p| p.dir).collect();
            let positions: Vec<Vec2> = engine.pursuers.iter().map(|p| p.pos).collect();
            let moved = (engine.tick_counter + 1) % PURSUER_SPEED_RATIO == 0;
            engine.step();
            if engine.is_ended() {
                break;
            }
            if !moved {
                continue;
            }
            for (idx, pursuer) in engine.pursuers.iter().enumerate() {
                if pursuer.dir != before[idx].reverse() {
                    continue;
                }
                // A reversal is only legal when no other candidate was open.
                let open_non_reverse = Direction::DECISION_ORDER.iter().any(|&dir| {
                    let cell = maze::neighbor(positions[idx], dir);
                    dir != before[idx].reverse()
                        && !maze::is_blocked(cell)
                        && !maze::is_den(cell)
                });
                assert!(
                    !open_non_reverse,
                    "pursuer {idx} reversed with open candidates at {:?}",
                    positions[idx]
                );
            }
        }
    }

    #[test]
    fn snapshot_reflects_engine_state() {
        let mut engine = GameEngine::new();
        engine.step();
        let snapshot = engine.build_snapshot();
        assert_eq!(snapshot.tick, 1);
        assert_eq!(snapshot.score, 10);
        assert_eq!(snapshot.state, SessionState::Playing);
        assert_eq!(snapshot.player.x, 8);
        assert_eq!(snapshot.player.y, 16);
        assert_eq!(snapshot.player.angle, 180);
        assert_eq!(snapshot.pursuers.len(), 4);
        assert_eq!(snapshot.pickups.len(), snapshot.pickups_remaining);
        assert!(snapshot
            .pickups
            .iter()
            .all(|p| !(p.x == 8 && p.y == 16)));
        let power_count = snapshot.pickups.iter().filter(|p| p.power).count();
        assert_eq!(power_count, 4);
    }
}
