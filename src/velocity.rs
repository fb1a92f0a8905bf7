//! Jerk-limited velocity legs.
//!
//! A leg moves the state `(v0, a0)` to `(vf, af)` with at most three
//! constant-jerk phases: a ramp, an acceleration plateau and a ramp.
//! Legs are the building block of every profile: the velocity interface
//! uses a single leg, the position interface joins two of them with an
//! optional cruise phase in between.

use crate::brake;
use crate::input_parameter::Limits;
use crate::motion_polynomial::MotionPolynomial;
use crate::profile::{AxisProblem, Profile};
use crate::roots;

/// Negative durations down to this value are treated as rounding noise.
pub(crate) const TIME_EPS: f64 = 1e-10;

/// Three constant-jerk phases changing velocity and acceleration.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VelocityLeg {
    /// Phase durations (ramp, plateau, ramp)
    pub t: [f64; 3],
    /// Jerk applied in each phase
    pub j: [f64; 3],
}

impl VelocityLeg {
    pub fn duration(&self) -> f64 {
        self.t.iter().sum()
    }

    /// Integrates the leg from `(v0, a0)`, returning `(distance, v, a)` at its end.
    pub fn integrate(&self, v0: f64, a0: f64) -> (f64, f64, f64) {
        let mut phase = MotionPolynomial::new(self.t[0], 0.0, v0, a0, self.j[0]);
        for i in 1..3 {
            phase = phase.next(self.t[i], self.j[i]);
        }
        phase.end_state()
    }

    /// Distance travelled by the leg when started at `(v0, a0)`.
    pub fn distance(&self, v0: f64, a0: f64) -> f64 {
        self.integrate(v0, a0).0
    }

    /// Lowest and highest acceleration reached inside the leg.
    fn acceleration_range(&self, a0: f64) -> (f64, f64) {
        let mut acc = a0;
        let (mut lo, mut hi) = (a0, a0);
        for (t, j) in self.t.iter().zip(self.j.iter()) {
            acc += j * t;
            lo = lo.min(acc);
            hi = hi.max(acc);
        }
        (lo, hi)
    }

    fn mirrored(self) -> Self {
        Self {
            t: self.t,
            j: [-self.j[0], -self.j[1], -self.j[2]],
        }
    }

    /// Accepts the leg only if every phase has a non-negative duration
    /// (small negative noise is clamped away).
    fn validated(t: [f64; 3], j: [f64; 3]) -> Option<Self> {
        let mut clamped = [0.0; 3];
        for (out, &ti) in clamped.iter_mut().zip(t.iter()) {
            if !ti.is_finite() || ti < -TIME_EPS {
                return None;
            }
            *out = ti.max(0.0);
        }
        Some(Self { t: clamped, j })
    }
}

/// Minimum-time leg from `(v0, a0)` to `(vf, af)`.
///
/// Both acceleration extremes are tried: ramping up first ("up-down") and
/// ramping down first ("down-up"). Together they cover every velocity change.
pub fn time_optimal(v0: f64, a0: f64, vf: f64, af: f64, limits: &Limits) -> Option<VelocityLeg> {
    let j = limits.max_jerk;
    let dv = vf - v0;

    let mut best: Option<VelocityLeg> = None;
    let mut consider = |leg: VelocityLeg| {
        if best.map_or(true, |b| leg.duration() < b.duration()) {
            best = Some(leg);
        }
    };

    for leg in up_down(dv, a0, af, limits.max_acceleration, j).into_iter().flatten() {
        consider(leg);
    }
    // Mirror the problem so the same solver produces the down-up shapes
    for leg in up_down(-dv, -a0, -af, -limits.min_acceleration, j).into_iter().flatten() {
        consider(leg.mirrored());
    }
    best
}

/// Up-down shapes: jerk `+j` to a peak acceleration, optionally hold it at
/// `a_lim`, then jerk `-j` down to `af`.
fn up_down(dv: f64, a0: f64, af: f64, a_lim: f64, j: f64) -> [Option<VelocityLeg>; 2] {
    let mut radicand = j * dv + 0.5 * (a0 * a0 + af * af);
    if radicand < 0.0 {
        // Tolerate rounding right at the double root
        if radicand > -1e-12 * (1.0 + a0 * a0 + af * af) {
            radicand = 0.0;
        } else {
            return [None, None];
        }
    }
    let root = radicand.sqrt();
    let mut legs = [None, None];

    for (slot, peak) in legs.iter_mut().zip([root, -root]) {
        if peak > a_lim {
            // => acceleration limit reached, insert a plateau at a_lim
            let t0 = (a_lim - a0) / j;
            let t2 = (a_lim - af) / j;
            let t1 = (dv - (2.0 * a_lim * a_lim - a0 * a0 - af * af) / (2.0 * j)) / a_lim;
            *slot = VelocityLeg::validated([t0, t1, t2], [j, 0.0, -j]);
        } else {
            let t0 = (peak - a0) / j;
            let t2 = (peak - af) / j;
            *slot = VelocityLeg::validated([t0, 0.0, t2], [j, 0.0, -j]);
        }
    }
    legs
}

/// Leg from `(v0, a0)` to `(vf, af)` lasting exactly `duration`.
///
/// Among all feasible shapes the one with the smallest peak acceleration
/// is returned, which keeps stretched axes as gentle as possible.
pub fn with_duration(
    v0: f64,
    a0: f64,
    vf: f64,
    af: f64,
    duration: f64,
    limits: &Limits,
) -> Option<VelocityLeg> {
    if !duration.is_finite() || duration < -TIME_EPS {
        return None;
    }
    let duration = duration.max(0.0);
    let j_max = limits.max_jerk;
    let dv = vf - v0;
    let (a_min, a_max) = (limits.min_acceleration, limits.max_acceleration);
    let within = |a: f64| {
        let tol = 1e-9 * (1.0 + a_max.abs().max(a_min.abs()));
        a <= a_max + tol && a >= a_min - tol
    };

    let mut best: Option<(f64, VelocityLeg)> = None;
    let mut consider = |leg: Option<VelocityLeg>| {
        let Some(leg) = leg else { return };
        if (leg.duration() - duration).abs() > 1e-9 * duration.max(1.0) {
            return;
        }
        let (_, v_end, a_end) = leg.integrate(v0, a0);
        if (v_end - vf).abs() > 1e-8 * (1.0 + vf.abs()) || (a_end - af).abs() > 1e-9 * (1.0 + af.abs()) {
            return;
        }
        let (lo, hi) = leg.acceleration_range(a0);
        if !within(lo) || !within(hi) {
            return;
        }
        let peak = lo.abs().max(hi.abs());
        if best.map_or(true, |(p, _)| peak < p) {
            best = Some((peak, leg));
        }
    };

    // a) Opposite ramps with a plateau at a_p: +J up then -J down (or mirrored)
    for jerk in [j_max, -j_max] {
        let roots = roots::solve_quadratic(
            1.0,
            -(jerk * duration + a0 + af),
            jerk * dv + 0.5 * (a0 * a0 + af * af),
        );
        for &a_p in roots.as_slice() {
            if !within(a_p) {
                continue;
            }
            let t0 = (a_p - a0) / jerk;
            let t2 = (a_p - af) / jerk;
            let t1 = duration - t0 - t2;
            consider(VelocityLeg::validated([t0, t1, t2], [jerk, 0.0, -jerk]));
        }
    }

    // b) Ramps in the same direction with a plateau in between
    if af != a0 {
        let jerk = j_max.copysign(af - a0);
        let t1 = duration - (af - a0) / jerk;
        if t1 > 0.0 {
            let a_p = (dv - (af * af - a0 * a0) / (2.0 * jerk)) / t1;
            let between = (a_p - a0) * (af - a_p) >= 0.0;
            if between && within(a_p) {
                let t0 = (a_p - a0) / jerk;
                let t2 = (af - a_p) / jerk;
                consider(VelocityLeg::validated([t0, t1, t2], [jerk, 0.0, jerk]));
            }
        }

        // c) Reduced-jerk ramp to af, then hold af
        let t0 = 2.0 * (dv - af * duration) / (a0 - af);
        if t0 > 0.0 && t0 <= duration + TIME_EPS {
            let jerk = (af - a0) / t0;
            if jerk.abs() <= j_max * (1.0 + 1e-12) {
                consider(VelocityLeg::validated([t0, duration - t0, 0.0], [jerk, 0.0, 0.0]));
            }
        }

        // d) Hold a0, then a reduced-jerk ramp to af
        let t2 = 2.0 * (dv - a0 * duration) / (af - a0);
        if t2 > 0.0 && t2 <= duration + TIME_EPS {
            let jerk = (af - a0) / t2;
            if jerk.abs() <= j_max * (1.0 + 1e-12) {
                consider(VelocityLeg::validated([0.0, duration - t2, t2], [0.0, 0.0, jerk]));
            }
        }
    }

    best.map(|(_, leg)| leg)
}

// -----------------------------------------------------------------
//  Velocity interface
// -----------------------------------------------------------------

/// Minimum-time profile reaching the target velocity and acceleration.
pub(crate) fn time_optimal_profile(problem: &AxisProblem) -> Option<Profile> {
    let brake = brake::velocity_brake(problem.a0, &problem.limits)?;
    let (_, vb, ab) = brake.apply(problem.p0, problem.v0, problem.a0);
    let leg = time_optimal(vb, ab, problem.vf, problem.af, &problem.limits)?;
    let profile = Profile::from_velocity_leg(problem, &brake, &leg);
    profile.check(problem).then_some(profile)
}

/// Profile reaching the target velocity and acceleration after exactly `duration`.
pub(crate) fn fixed_duration_profile(problem: &AxisProblem, duration: f64) -> Option<Profile> {
    let brake = brake::velocity_brake(problem.a0, &problem.limits)?;
    let (_, vb, ab) = brake.apply(problem.p0, problem.v0, problem.a0);
    let leg = with_duration(vb, ab, problem.vf, problem.af, duration - brake.duration(), &problem.limits)?;
    let profile = Profile::from_velocity_leg(problem, &brake, &leg);
    profile.check(problem).then_some(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn limits(a: f64, j: f64) -> Limits {
        Limits::new(f64::INFINITY, a, j)
    }

    #[test]
    fn pure_jerk_velocity_change() {
        // 0 -> 1 with j = 1 and a loose acceleration limit: peak a = 1, t = 2
        let leg = time_optimal(0.0, 0.0, 1.0, 0.0, &limits(10.0, 1.0)).unwrap();
        assert_relative_eq!(leg.duration(), 2.0, epsilon = 1e-12);
        assert_eq!(leg.t[1], 0.0);
        let (_, v, a) = leg.integrate(0.0, 0.0);
        assert_relative_eq!(v, 1.0, epsilon = 1e-12);
        assert_relative_eq!(a, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn acceleration_plateau_when_limit_is_reached() {
        // 0 -> 4 with a = 1, j = 1: ramps of 1 s and a 3 s plateau
        let leg = time_optimal(0.0, 0.0, 4.0, 0.0, &limits(1.0, 1.0)).unwrap();
        assert_relative_eq!(leg.t[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(leg.t[1], 3.0, epsilon = 1e-12);
        assert_relative_eq!(leg.t[2], 1.0, epsilon = 1e-12);
        // average velocity 2 over 5 s
        assert_relative_eq!(leg.distance(0.0, 0.0), 10.0, epsilon = 1e-12);
    }

    #[test]
    fn deceleration_uses_min_acceleration() {
        let mut bounds = limits(1.0, 1.0);
        bounds.min_acceleration = -0.5;
        let leg = time_optimal(2.0, 0.0, 0.0, 0.0, &bounds).unwrap();
        assert!(leg.j[0] < 0.0);
        // ramps of 0.5 s and a plateau of (2 - 0.25) / 0.5 = 3.5 s
        assert_relative_eq!(leg.duration(), 4.5, epsilon = 1e-12);
        let (_, v, _) = leg.integrate(2.0, 0.0);
        assert_relative_eq!(v, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn starting_acceleration_is_unwound() {
        // Already accelerating at the target velocity: ramp down and back up
        let leg = time_optimal(0.0, 1.0, 0.0, 0.0, &limits(2.0, 1.0)).unwrap();
        let (_, v, a) = leg.integrate(0.0, 1.0);
        assert_relative_eq!(v, 0.0, epsilon = 1e-12);
        assert_relative_eq!(a, 0.0, epsilon = 1e-12);
        assert!(leg.duration() > 1.0);
    }

    #[test]
    fn zero_change_takes_zero_time() {
        let leg = time_optimal(3.0, 0.0, 3.0, 0.0, &limits(1.0, 1.0)).unwrap();
        assert_eq!(leg.duration(), 0.0);
    }

    #[test]
    fn stretched_leg_matches_requested_duration() {
        let bounds = limits(1.0, 1.0);
        let fastest = time_optimal(0.0, 0.0, 1.0, 0.0, &bounds).unwrap();
        for duration in [fastest.duration(), 3.0, 10.0] {
            let leg = with_duration(0.0, 0.0, 1.0, 0.0, duration, &bounds).unwrap();
            assert_relative_eq!(leg.duration(), duration, epsilon = 1e-9);
            let (_, v, a) = leg.integrate(0.0, 0.0);
            assert_relative_eq!(v, 1.0, epsilon = 1e-9);
            assert_relative_eq!(a, 0.0, epsilon = 1e-9);
            let (lo, hi) = leg.acceleration_range(0.0);
            assert!(lo >= -1e-9 && hi <= 1.0 + 1e-9);
        }
    }

    #[test]
    fn stretched_leg_can_hold_current_acceleration() {
        // a0 = 1 must come down to 0 while gaining exactly 0.5 m/s in 10 s
        let leg = with_duration(0.0, 1.0, 0.5, 0.0, 10.0, &limits(2.0, 1.0)).unwrap();
        let (_, v, a) = leg.integrate(0.0, 1.0);
        assert_relative_eq!(v, 0.5, epsilon = 1e-9);
        assert_relative_eq!(a, 0.0, epsilon = 1e-9);
        assert_relative_eq!(leg.duration(), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn too_short_duration_is_rejected() {
        assert!(with_duration(0.0, 0.0, 1.0, 0.0, 1.0, &limits(1.0, 1.0)).is_none());
    }
}
