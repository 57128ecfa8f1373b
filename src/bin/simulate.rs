use clap::Parser;
use maze_chase::constants::{PICKUP_SCORE, TICK_MS};
use maze_chase::engine::GameEngine;
use maze_chase::maze;
use maze_chase::scheduler;
use maze_chase::types::{Direction, SessionState, Snapshot};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Number of games to run.
    #[arg(long, default_value_t = 3)]
    games: u32,
    /// Tick cap per game.
    #[arg(long, default_value_t = 2_000)]
    ticks: u64,
    #[arg(long)]
    seed: Option<u64>,
    /// Per-tick chance that the wander policy requests a new direction.
    #[arg(long, default_value_t = 0.2)]
    turn_chance: f64,
    #[arg(long)]
    summary_out: Option<PathBuf>,
    /// Drive one game per slot through the timer-based session loop at the
    /// real tick cadence instead of stepping the engine directly.
    #[arg(long)]
    realtime: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum Outcome {
    Won,
    Lost,
    TickCap,
}

#[derive(Clone, Debug, Serialize)]
struct GameResultLine {
    game: u32,
    seed: u64,
    outcome: Outcome,
    ticks: u64,
    score: i32,
    #[serde(rename = "pickupsRemaining")]
    pickups_remaining: usize,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug)]
struct GameRun {
    result: GameResultLine,
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "gameCount")]
    game_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageTicks")]
    average_ticks: u64,
    #[serde(rename = "outcomeCounts")]
    outcome_counts: BTreeMap<String, usize>,
    games: Vec<GameResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    game: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

/// Seeded random-walk input source: occasionally asks for a new direction,
/// otherwise lets the engine keep its last request.
struct WanderPolicy {
    rng: StdRng,
    turn_chance: f64,
}

impl WanderPolicy {
    fn new(seed: u64, turn_chance: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            turn_chance: turn_chance.clamp(0.0, 1.0),
        }
    }

    fn next_request(&mut self) -> Option<Direction> {
        if !self.rng.random_bool(self.turn_chance) {
            return None;
        }
        Some(Direction::DECISION_ORDER[self.rng.random_range(0..4)])
    }
}

fn main() {
    let cli = Cli::parse();
    let run_started_at_ms = now_ms();
    let base_seed = cli.seed.unwrap_or(run_started_at_ms);
    let run_id = format!("sim-{base_seed}-{run_started_at_ms}");

    emit_log(
        "info",
        "run_started",
        &run_id,
        None,
        None,
        None,
        json!({
            "games": cli.games,
            "ticks": cli.ticks,
            "turnChance": cli.turn_chance,
            "realtime": cli.realtime,
        }),
    );

    let mut has_anomaly = false;
    let mut results = Vec::new();
    let mut outcome_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_ticks = 0u64;
    let mut total_anomalies = 0usize;

    for game in 0..cli.games {
        let seed = base_seed.wrapping_add(game as u64);
        emit_log(
            "info",
            "game_started",
            &run_id,
            Some(game),
            Some(seed),
            None,
            json!({}),
        );

        let run = if cli.realtime {
            run_game_realtime(game, seed, cli.ticks, cli.turn_chance)
        } else {
            run_game(game, seed, cli.ticks, cli.turn_chance)
        };

        for anomaly in &run.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &run_id,
                Some(game),
                Some(seed),
                Some(anomaly.tick),
                json!({ "message": anomaly.message }),
            );
        }

        if !run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += run.anomaly_records.len();
        total_ticks += run.result.ticks;
        *outcome_counts
            .entry(outcome_key(run.result.outcome))
            .or_insert(0) += 1;

        emit_log(
            "info",
            "game_finished",
            &run_id,
            Some(game),
            Some(seed),
            Some(run.result.ticks),
            json!({
                "outcome": run.result.outcome,
                "score": run.result.score,
                "anomalyCount": run.anomaly_records.len(),
            }),
        );

        println!(
            "{}",
            serde_json::to_string(&run.result).expect("game result should serialize")
        );
        results.push(run.result);
    }

    let run_finished_at_ms = now_ms();
    let summary = build_run_summary(
        run_id.clone(),
        run_started_at_ms,
        run_finished_at_ms,
        results,
        outcome_counts,
        total_anomalies,
        total_ticks,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &run_id,
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &run_id,
        None,
        None,
        None,
        json!({
            "gameCount": summary.game_count,
            "anomalyCount": summary.anomaly_count,
            "averageTicks": summary.average_ticks,
            "outcomeCounts": summary.outcome_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_game(game: u32, seed: u64, max_ticks: u64, turn_chance: f64) -> GameRun {
    let mut engine = GameEngine::new();
    let mut policy = WanderPolicy::new(seed, turn_chance);
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();

    let mut prev = engine.build_snapshot();
    let total_pickups = prev.pickups_remaining;

    while engine.tick_counter() < max_ticks && !engine.is_ended() {
        if let Some(dir) = policy.next_request() {
            engine.set_requested_direction(dir);
        }
        engine.step();
        let cur = engine.build_snapshot();
        for message in collect_transition_anomalies(&prev, &cur, total_pickups) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                cur.tick,
                message,
            );
        }
        prev = cur;
    }

    if engine.is_ended() {
        let frozen = engine.build_snapshot();
        engine.step();
        engine.step();
        if engine.build_snapshot() != frozen {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                frozen.tick,
                "terminal state mutated after freeze".to_string(),
            );
        }
    }

    let last = engine.build_snapshot();
    GameRun {
        result: GameResultLine {
            game,
            seed,
            outcome: outcome_of(&last),
            ticks: last.tick,
            score: last.score,
            pickups_remaining: last.pickups_remaining,
            anomalies,
        },
        anomaly_records,
    }
}

// Sampled reads race the tick loop here, so only per-sample invariants are
// checked; the direct-stepping path covers the per-tick transitions.
fn run_game_realtime(game: u32, seed: u64, max_ticks: u64, turn_chance: f64) -> GameRun {
    let runtime = tokio::runtime::Runtime::new().expect("tokio runtime should start");
    runtime.block_on(async move {
        let session = scheduler::start_session();
        let mut policy = WanderPolicy::new(seed, turn_chance);
        let mut anomalies = Vec::new();
        let mut anomaly_records = Vec::new();
        let mut anomaly_seen = HashSet::new();
        let total_pickups = GameEngine::new().build_snapshot().pickups_remaining;

        let mut interval = tokio::time::interval(Duration::from_millis(TICK_MS));
        let last = loop {
            interval.tick().await;
            if let Some(dir) = policy.next_request() {
                session.set_requested_direction(dir).await;
            }
            let cur = session.snapshot().await;
            for message in collect_sample_anomalies(&cur, total_pickups) {
                push_anomaly(
                    &mut anomalies,
                    &mut anomaly_records,
                    &mut anomaly_seen,
                    cur.tick,
                    message,
                );
            }
            if cur.state != SessionState::Playing || cur.tick >= max_ticks {
                break cur;
            }
        };

        GameRun {
            result: GameResultLine {
                game,
                seed,
                outcome: outcome_of(&last),
                ticks: last.tick,
                score: last.score,
                pickups_remaining: last.pickups_remaining,
                anomalies,
            },
            anomaly_records,
        }
    })
}

fn outcome_of(snapshot: &Snapshot) -> Outcome {
    match snapshot.state {
        SessionState::Won => Outcome::Won,
        SessionState::Lost => Outcome::Lost,
        SessionState::Playing => Outcome::TickCap,
    }
}

fn collect_transition_anomalies(
    prev: &Snapshot,
    cur: &Snapshot,
    total_pickups: usize,
) -> Vec<String> {
    let mut anomalies = Vec::new();

    let dx = (cur.player.x - prev.player.x).abs();
    let dy = (cur.player.y - prev.player.y).abs();
    let wrap_jump = dy == 0 && cur.player.y == maze::WRAP_ROW && dx == maze::COLS - 1;
    if dx + dy > 1 && !wrap_jump {
        anomalies.push(format!(
            "player displacement out of bounds: ({},{}) -> ({},{})",
            prev.player.x, prev.player.y, cur.player.x, cur.player.y
        ));
    }

    if cur.pickups_remaining > prev.pickups_remaining {
        anomalies.push(format!(
            "pickup field grew: {} -> {}",
            prev.pickups_remaining, cur.pickups_remaining
        ));
    } else {
        let consumed = (prev.pickups_remaining - cur.pickups_remaining) as i32;
        if cur.score - prev.score != consumed * PICKUP_SCORE {
            anomalies.push(format!(
                "score delta {} does not match {} consumed pickups",
                cur.score - prev.score,
                consumed
            ));
        }
    }

    anomalies.extend(collect_sample_anomalies(cur, total_pickups));
    anomalies
}

fn collect_sample_anomalies(cur: &Snapshot, total_pickups: usize) -> Vec<String> {
    let mut anomalies = Vec::new();

    if !maze::in_bounds(player_pos(cur)) {
        anomalies.push(format!(
            "player out of grid: ({},{})",
            cur.player.x, cur.player.y
        ));
    }
    if cur.pursuers.len() != maze::PURSUER_SPAWNS.len() {
        anomalies.push(format!("pursuer count changed: {}", cur.pursuers.len()));
    }

    if cur.score < 0 {
        anomalies.push(format!("negative score: {}", cur.score));
    }
    let consumed = total_pickups.saturating_sub(cur.pickups_remaining) as i32;
    if cur.score != consumed * PICKUP_SCORE {
        anomalies.push(format!(
            "score {} does not match {} consumed pickups",
            cur.score, consumed
        ));
    }

    if cur.state == SessionState::Lost
        && !cur
            .pursuers
            .iter()
            .any(|pursuer| pursuer.x == cur.player.x && pursuer.y == cur.player.y)
    {
        anomalies.push("lost without a pursuer on the player cell".to_string());
    }
    if cur.state == SessionState::Won && cur.pickups_remaining != 0 {
        anomalies.push(format!(
            "won with {} pickups remaining",
            cur.pickups_remaining
        ));
    }

    anomalies
}

fn player_pos(snapshot: &Snapshot) -> maze_chase::types::Vec2 {
    maze_chase::types::Vec2 {
        x: snapshot.player.x,
        y: snapshot.player.y,
    }
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn outcome_key(outcome: Outcome) -> String {
    match outcome {
        Outcome::Won => "won",
        Outcome::Lost => "lost",
        Outcome::TickCap => "tick_cap",
    }
    .to_string()
}

fn build_run_summary(
    run_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    games: Vec<GameResultLine>,
    outcome_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
    total_ticks: u64,
) -> RunSummary {
    let game_count = games.len();
    let average_ticks = if game_count == 0 {
        0
    } else {
        total_ticks / game_count as u64
    };
    RunSummary {
        run_id,
        started_at_ms,
        finished_at_ms,
        game_count,
        anomaly_count,
        average_ticks,
        outcome_counts,
        games,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    run_id: &str,
    game: Option<u32>,
    seed: Option<u64>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        run_id: run_id.to_string(),
        game,
        seed,
        tick,
        details,
    };
    eprintln!(
        "{}",
        serde_json::to_string(&log_line).expect("structured log should serialize")
    );
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).expect("run summary should serialize");
    std::fs::write(path, summary_text)
}
