pub const TICK_MS: u64 = 180;

/// Number of player ticks per pursuer decision.
/// 1 = pursuers move every tick (same speed as the player),
/// 4 = pursuers move every 4th tick (quarter speed).
pub const PURSUER_SPEED_RATIO: u64 = 4;

pub const PICKUP_SCORE: i32 = 10;

pub const ANIM_TICK_MS: u64 = 60;
pub const MOUTH_PHASE_STEP: f32 = 0.2;
pub const MOUTH_MAX_ANGLE: f32 = 40.0;
