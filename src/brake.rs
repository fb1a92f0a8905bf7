//! Pre-phases that bring a limit-violating start state back into the
//! admissible set before the actual profile starts.
//!
//! A brake never clamps the state: it ramps the acceleration with the
//! maximum jerk (and holds it if needed), so the motion stays continuous.

use crate::input_parameter::Limits;
use crate::motion_polynomial::MotionPolynomial;

/// At most two constant-jerk phases: a jerk ramp and an acceleration hold.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Brake {
    pub t: [f64; 2],
    pub j: [f64; 2],
}

impl Brake {
    pub fn duration(&self) -> f64 {
        self.t[0] + self.t[1]
    }

    pub fn is_active(&self) -> bool {
        self.duration() > 0.0
    }

    /// Phases starting at `(p0, v0, a0)`.
    pub fn phases(&self, p0: f64, v0: f64, a0: f64) -> [MotionPolynomial; 2] {
        let first = MotionPolynomial::new(self.t[0], p0, v0, a0, self.j[0]);
        let second = first.next(self.t[1], self.j[1]);
        [first, second]
    }

    /// State once the brake has finished.
    pub fn apply(&self, p0: f64, v0: f64, a0: f64) -> (f64, f64, f64) {
        self.phases(p0, v0, a0)[1].end_state()
    }
}

/// Collects brake phases, merging consecutive phases with equal jerk.
#[derive(Default)]
struct BrakeBuilder {
    t: [f64; 3],
    j: [f64; 3],
    len: usize,
}

impl BrakeBuilder {
    fn push(&mut self, t: f64, j: f64) {
        if t <= 0.0 {
            return;
        }
        if self.len > 0 && self.j[self.len - 1] == j {
            self.t[self.len - 1] += t;
            return;
        }
        if self.len < self.t.len() {
            self.t[self.len] = t;
            self.j[self.len] = j;
            self.len += 1;
        }
    }

    fn build(self) -> Option<Brake> {
        if self.len > 2 {
            return None;
        }
        Some(Brake {
            t: [self.t[0], self.t[1]],
            j: [self.j[0], self.j[1]],
        })
    }
}

/// Brings an acceleration outside `[min_acceleration, max_acceleration]`
/// back to the violated bound with maximum jerk.
///
/// Returns the state after the ramp.
fn limit_acceleration(builder: &mut BrakeBuilder, v: f64, a: f64, limits: &Limits) -> (f64, f64) {
    let j = limits.max_jerk;
    let (jerk, target) = if a > limits.max_acceleration {
        (-j, limits.max_acceleration)
    } else if a < limits.min_acceleration {
        (j, limits.min_acceleration)
    } else {
        return (v, a);
    };
    let t = (target - a) / jerk;
    builder.push(t, jerk);
    (v + 0.5 * (a + target) * t, target)
}

/// Brake for the velocity interface: only acceleration violations matter there.
pub fn velocity_brake(a0: f64, limits: &Limits) -> Option<Brake> {
    let mut builder = BrakeBuilder::default();
    limit_acceleration(&mut builder, 0.0, a0, limits);
    builder.build()
}

/// Brake for the position interface.
///
/// After fixing the acceleration, a state whose velocity would overshoot
/// a velocity bound even with an immediate maximum-jerk stop of the
/// acceleration is slowed down until that stop lands exactly on the bound.
pub fn position_brake(v0: f64, a0: f64, limits: &Limits) -> Option<Brake> {
    let j = limits.max_jerk;
    let mut builder = BrakeBuilder::default();
    let (v, a) = limit_acceleration(&mut builder, v0, a0, limits);

    let v_stop = v + a * a.abs() / (2.0 * j);
    if v_stop > limits.max_velocity {
        brake_down(&mut builder, v, a, limits.max_velocity, limits.min_acceleration, j, 1.0);
    } else if v_stop < limits.min_velocity {
        // Mirrored problem: brake "down" from -v towards -min_velocity
        brake_down(&mut builder, -v, -a, -limits.min_velocity, -limits.max_acceleration, j, -1.0);
    }
    builder.build()
}

/// Ramps the acceleration down to `a_x` (or to `a_min` plus a hold) so
/// that the remaining stop ends at `v_max`. `sign` maps the mirrored
/// jerks back to the real axis.
fn brake_down(builder: &mut BrakeBuilder, v: f64, a: f64, v_max: f64, a_min: f64, j: f64, sign: f64) {
    let c = v + a * a / (2.0 * j);
    let a_x = -(j * (c - v_max)).max(0.0).sqrt();

    if a_x >= a_min {
        builder.push((a - a_x) / j, -j * sign);
    } else {
        builder.push((a - a_min) / j, -j * sign);
        let hold = (c - a_min * a_min / j - v_max) / (-a_min);
        builder.push(hold, 0.0);
    }
}
