use crate::roots::{self, RootSet};

/// Describes a single constant-jerk phase of a profile.
///
/// `pos`, `vel` and `acc` hold the state at the start of the phase,
/// `time` is the phase duration and `jrk` the jerk applied during it.
#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct MotionPolynomial {
    pub time: f64,
    pub pos: f64,
    pub vel: f64,
    pub acc: f64,
    pub jrk: f64,
}

impl MotionPolynomial {
    /// Creates a new phase.
    pub fn new(time: f64, pos: f64, vel: f64, acc: f64, jrk: f64) -> Self {
        Self {
            time,
            pos,
            vel,
            acc,
            jrk,
        }
    }

    /// Evaluates `(pos, vel, acc)` at `t` seconds into the phase.
    pub fn state_at(&self, t: f64) -> (f64, f64, f64) {
        // acc(t) = a0 + j0*t
        let acc = self.acc + self.jrk * t;

        // vel(t) = v0 + a0*t + j0*t^2/2
        let vel = self.vel + (self.acc + acc) * t * 0.5;

        // pos(t) = s0 + v0*t + a0*t^2/2 + j0*t^3/6
        let vel_avg = self.vel + (2.0 * self.acc + acc) * t / 6.0;
        let pos = self.pos + vel_avg * t;

        (pos, vel, acc)
    }

    /// State at the end of the phase.
    pub fn end_state(&self) -> (f64, f64, f64) {
        self.state_at(self.time)
    }

    /// Builds the phase that follows this one with the given duration and jerk.
    pub fn next(&self, time: f64, jrk: f64) -> Self {
        let (pos, vel, acc) = self.end_state();
        Self::new(time, pos, vel, acc, jrk)
    }

    /// Times strictly inside the phase at which the velocity crosses zero.
    pub fn velocity_roots(&self) -> RootSet {
        let mut inside = RootSet::default();
        for &t in roots::solve_quadratic(0.5 * self.jrk, self.acc, self.vel).as_slice() {
            if t > 0.0 && t < self.time {
                inside.push(t);
            }
        }
        inside
    }

    /// Time strictly inside the phase at which the acceleration crosses zero.
    pub fn acceleration_root(&self) -> Option<f64> {
        if self.jrk == 0.0 {
            return None;
        }
        let t = -self.acc / self.jrk;
        (t > 0.0 && t < self.time).then_some(t)
    }
}
