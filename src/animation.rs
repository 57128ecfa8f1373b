use crate::constants::{MOUTH_MAX_ANGLE, MOUTH_PHASE_STEP};

/// Cosmetic chomp oscillator. Runs on its own cadence, never touches
/// simulation state; the render adapter samples the angle once per frame.
#[derive(Clone, Debug, Default)]
pub struct MouthAnimator {
    phase: f32,
}

impl MouthAnimator {
    pub fn new() -> Self {
        Self { phase: 0.0 }
    }

    pub fn advance(&mut self) {
        self.phase += MOUTH_PHASE_STEP;
    }

    /// Current mouth opening in degrees, swinging between 0 and
    /// `MOUTH_MAX_ANGLE`.
    pub fn angle(&self) -> f32 {
        self.phase.sin().abs() * MOUTH_MAX_ANGLE
    }
}
