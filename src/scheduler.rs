use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::animation::MouthAnimator;
use crate::constants::{ANIM_TICK_MS, TICK_MS};
use crate::engine::GameEngine;
use crate::maze;
use crate::types::{Direction, MazeInit, SessionState, Snapshot};

struct SessionTasks {
    tick: JoinHandle<()>,
    anim: JoinHandle<()>,
}

impl Drop for SessionTasks {
    fn drop(&mut self) {
        self.tick.abort();
        self.anim.abort();
    }
}

/// Shared handle over a running session: the boundary the input, render
/// and reset collaborators talk to. Cloneable; the timer tasks stop when
/// the last clone is dropped.
#[derive(Clone)]
pub struct SessionHandle {
    engine: Arc<Mutex<GameEngine>>,
    mouth: Arc<Mutex<MouthAnimator>>,
    _tasks: Arc<SessionTasks>,
}

/// Spawn the fixed-cadence tick loop and the cosmetic animation loop over
/// a fresh engine. Must be called from within a tokio runtime.
///
/// The two loops share no state: the tick loop owns the simulation, the
/// animation loop owns only the mouth oscillator.
pub fn start_session() -> SessionHandle {
    let engine = Arc::new(Mutex::new(GameEngine::new()));
    let mouth = Arc::new(Mutex::new(MouthAnimator::new()));

    let tick = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(TICK_MS));
            loop {
                interval.tick().await;
                // step() checks the session state itself, so a tick landing
                // on a finished session mutates nothing.
                engine.lock().await.step();
            }
        })
    };

    let anim = {
        let mouth = Arc::clone(&mouth);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(ANIM_TICK_MS));
            loop {
                interval.tick().await;
                mouth.lock().await.advance();
            }
        })
    };

    SessionHandle {
        engine,
        mouth,
        _tasks: Arc::new(SessionTasks { tick, anim }),
    }
}

impl SessionHandle {
    /// Input adapter boundary; last write before a tick wins.
    pub async fn set_requested_direction(&self, dir: Direction) {
        self.engine.lock().await.set_requested_direction(dir);
    }

    /// Render adapter boundary.
    pub async fn snapshot(&self) -> Snapshot {
        self.engine.lock().await.build_snapshot()
    }

    pub async fn session_state(&self) -> SessionState {
        self.engine.lock().await.session_state()
    }

    /// Reset control boundary. Serializes on the engine lock, so it can
    /// never interleave with a half-applied tick.
    pub async fn reset(&self) {
        self.engine.lock().await.reset();
    }

    /// Cosmetic oscillation value for the render adapter.
    pub async fn mouth_angle(&self) -> f32 {
        self.mouth.lock().await.angle()
    }

    /// Static grid data for the sizing/render adapters.
    pub fn maze_init(&self) -> MazeInit {
        maze::to_maze_init()
    }
}
