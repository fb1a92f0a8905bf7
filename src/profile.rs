use crate::brake::Brake;
use crate::input_parameter::{Interface, Limits};
use crate::motion_polynomial::MotionPolynomial;
use crate::velocity::VelocityLeg;

/// One axis of a trajectory request: start state, target state and bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisProblem {
    pub p0: f64,
    pub v0: f64,
    pub a0: f64,
    pub pf: f64,
    pub vf: f64,
    pub af: f64,
    pub limits: Limits,
    pub interface: Interface,
}

/// Which bounds are saturated over a non-zero interval of the profile.
///
/// `Acc0` is the acceleration plateau of the first leg, `Acc1` the one of
/// the second leg, `Vel` a cruise phase at a velocity bound.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReachedLimits {
    Acc0Acc1Vel,
    Acc0Vel,
    Acc1Vel,
    Vel,
    Acc0Acc1,
    Acc0,
    Acc1,
    #[default]
    None,
}

impl ReachedLimits {
    fn from_flags(acc0: bool, acc1: bool, vel: bool) -> Self {
        match (acc0, acc1, vel) {
            (true, true, true) => ReachedLimits::Acc0Acc1Vel,
            (true, false, true) => ReachedLimits::Acc0Vel,
            (false, true, true) => ReachedLimits::Acc1Vel,
            (false, false, true) => ReachedLimits::Vel,
            (true, true, false) => ReachedLimits::Acc0Acc1,
            (true, false, false) => ReachedLimits::Acc0,
            (false, true, false) => ReachedLimits::Acc1,
            (false, false, false) => ReachedLimits::None,
        }
    }
}

/// Jerk pattern of the two legs.
///
/// `Uddu` (up-down, down-up) is the classic accelerate-then-decelerate
/// shape; `Udud` keeps pushing in the same direction in both legs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JerkSigns {
    #[default]
    Uddu,
    Udud,
}

/// How an axis moves on once its profile has ended, while longer axes of the
/// same trajectory are still running.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Continuation {
    /// Stays at the final state, so the target is still met when the trajectory ends.
    #[default]
    Hold,
    /// Keeps the final velocity and acceleration; only the position moves on.
    Cruise,
    /// Keeps integrating the final acceleration.
    Extrapolate,
}

/// Global position extrema of one axis over a trajectory.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PositionExtrema {
    pub min: f64,
    pub max: f64,
    pub t_min: f64,
    pub t_max: f64,
}

impl PositionExtrema {
    fn at(t: f64, p: f64) -> Self {
        Self {
            min: p,
            max: p,
            t_min: t,
            t_max: t,
        }
    }

    fn include(&mut self, t: f64, p: f64) {
        if p < self.min {
            self.min = p;
            self.t_min = t;
        }
        if p > self.max {
            self.max = p;
            self.t_max = t;
        }
    }
}

/// Motion law of a single axis.
///
/// Up to two brake phases are followed by seven main phases: the first
/// velocity leg (0..=2), a cruise (3) and the second velocity leg (4..=6).
/// Unused phases have zero duration. Past its end the axis moves on
/// according to its [`Continuation`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Profile {
    brake: [MotionPolynomial; 2],
    phases: [MotionPolynomial; 7],
    reached_limits: ReachedLimits,
    jerk_signs: JerkSigns,
    continuation: Continuation,
    duration: f64,
}

impl Profile {
    /// A profile without any phase, used for disabled axes. These keep
    /// their current acceleration.
    pub(crate) fn idle(p0: f64, v0: f64, a0: f64) -> Self {
        let start = MotionPolynomial::new(0.0, p0, v0, a0, 0.0);
        Self {
            brake: [start; 2],
            phases: [start; 7],
            continuation: Continuation::Extrapolate,
            ..Self::default()
        }
    }

    /// Position-interface layout: leg, cruise, leg.
    pub(crate) fn from_legs(
        problem: &AxisProblem,
        brake: &Brake,
        first: &VelocityLeg,
        cruise: f64,
        second: &VelocityLeg,
    ) -> Self {
        let t = [
            first.t[0], first.t[1], first.t[2], cruise, second.t[0], second.t[1], second.t[2],
        ];
        let j = [
            first.j[0], first.j[1], first.j[2], 0.0, second.j[0], second.j[1], second.j[2],
        ];
        Self::assemble(problem, brake, t, j)
    }

    /// Velocity-interface layout: a single leg, the rest of the phases stay empty.
    pub(crate) fn from_velocity_leg(problem: &AxisProblem, brake: &Brake, leg: &VelocityLeg) -> Self {
        let t = [leg.t[0], leg.t[1], leg.t[2], 0.0, 0.0, 0.0, 0.0];
        let j = [leg.j[0], leg.j[1], leg.j[2], 0.0, 0.0, 0.0, 0.0];
        Self::assemble(problem, brake, t, j)
    }

    fn assemble(problem: &AxisProblem, brake: &Brake, t: [f64; 7], j: [f64; 7]) -> Self {
        let brake_phases = brake.phases(problem.p0, problem.v0, problem.a0);

        let mut phases = [MotionPolynomial::default(); 7];
        let mut previous = brake_phases[1];
        for (i, phase) in phases.iter_mut().enumerate() {
            *phase = previous.next(t[i], j[i]);
            previous = *phase;
        }

        let duration = brake.duration() + t.iter().sum::<f64>();
        let mut profile = Self {
            brake: brake_phases,
            phases,
            reached_limits: ReachedLimits::None,
            jerk_signs: JerkSigns::Uddu,
            continuation: match problem.interface {
                Interface::Position => Continuation::Hold,
                Interface::Velocity => Continuation::Cruise,
            },
            duration,
        };
        profile.reached_limits = profile.classify_limits(&problem.limits, problem.interface);
        profile.jerk_signs = Self::classify_jerks(&j);
        profile
    }

    fn classify_limits(&self, limits: &Limits, interface: Interface) -> ReachedLimits {
        let a_tol = 1e-9 * limits.max_acceleration.abs().max(limits.min_acceleration.abs()).max(1.0);
        let v_tol = 1e-9 * limits.max_velocity.abs().max(limits.min_velocity.abs()).max(1.0);
        let at_acc_limit = |phase: &MotionPolynomial| {
            phase.time > 0.0
                && ((phase.acc - limits.max_acceleration).abs() < a_tol
                    || (phase.acc - limits.min_acceleration).abs() < a_tol)
        };
        let acc0 = at_acc_limit(&self.phases[1]);
        if interface == Interface::Velocity {
            return ReachedLimits::from_flags(acc0, false, false);
        }
        let acc1 = at_acc_limit(&self.phases[5]);
        let cruise = &self.phases[3];
        let vel = cruise.time > 0.0
            && ((cruise.vel - limits.max_velocity).abs() < v_tol
                || (cruise.vel - limits.min_velocity).abs() < v_tol);
        ReachedLimits::from_flags(acc0, acc1, vel)
    }

    fn classify_jerks(j: &[f64; 7]) -> JerkSigns {
        let first = j[..3].iter().copied().find(|&x| x != 0.0);
        let second = j[4..].iter().copied().find(|&x| x != 0.0);
        match (first, second) {
            (Some(a), Some(b)) if a.signum() == b.signum() => JerkSigns::Udud,
            _ => JerkSigns::Uddu,
        }
    }

    /// Verifies the profile against the bounds and the target state.
    pub(crate) fn check(&self, problem: &AxisProblem) -> bool {
        let limits = &problem.limits;
        let jerk_bound = limits.max_jerk * (1.0 + 1e-12);
        for phase in self.brake.iter().chain(self.phases.iter()) {
            if !(phase.time.is_finite() && phase.time >= 0.0) || phase.jrk.abs() > jerk_bound {
                return false;
            }
        }

        // Acceleration is linear within a phase, boundaries are enough
        let a_tol = 1e-9 * limits.max_acceleration.abs().max(limits.min_acceleration.abs()).max(1.0);
        let acc_ok = |a: f64| a <= limits.max_acceleration + a_tol && a >= limits.min_acceleration - a_tol;
        for phase in &self.phases {
            let (_, _, a_end) = phase.end_state();
            if !acc_ok(phase.acc) || !acc_ok(a_end) {
                return false;
            }
        }

        let position = problem.interface == Interface::Position;
        if position {
            // The brake may hand over a velocity beyond the bound, which then only decreases
            let v_start = self.phases[0].vel;
            let v_tol = 1e-8 * limits.max_velocity.abs().max(limits.min_velocity.abs()).max(1.0);
            let v_hi = limits.max_velocity.max(v_start) + v_tol;
            let v_lo = limits.min_velocity.min(v_start) - v_tol;
            for phase in &self.phases {
                let (_, v_end, _) = phase.end_state();
                let v_peak = phase.acceleration_root().map_or(phase.vel, |t| phase.state_at(t).1);
                for v in [phase.vel, v_end, v_peak] {
                    if !(v.is_finite() && v <= v_hi && v >= v_lo) {
                        return false;
                    }
                }
            }
        }

        let (p, v, a) = self.end_state();
        if position {
            let p_tol = 1e-8 * problem.pf.abs().max(problem.p0.abs()).max(1.0);
            let arrived = (p - problem.pf).abs() <= p_tol;
            if !arrived {
                return false;
            }
        }
        let v_tol = 1e-8 * problem.vf.abs().max(1.0);
        let a_tol = 1e-9 * problem.af.abs().max(1.0);
        (v - problem.vf).abs() <= v_tol && (a - problem.af).abs() <= a_tol
    }

    /// Total duration including the brake.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn brake_duration(&self) -> f64 {
        self.brake[0].time + self.brake[1].time
    }

    pub fn brake_phases(&self) -> &[MotionPolynomial; 2] {
        &self.brake
    }

    pub fn phases(&self) -> &[MotionPolynomial; 7] {
        &self.phases
    }

    pub fn reached_limits(&self) -> ReachedLimits {
        self.reached_limits
    }

    pub fn jerk_signs(&self) -> JerkSigns {
        self.jerk_signs
    }

    pub fn continuation(&self) -> Continuation {
        self.continuation
    }

    /// State at the end of the last phase.
    pub fn end_state(&self) -> (f64, f64, f64) {
        self.phases[6].end_state()
    }

    /// Evaluates `(pos, vel, acc)` at time `t`. Past the end of the profile
    /// the state follows the [`Continuation`].
    pub fn state_at(&self, t: f64) -> (f64, f64, f64) {
        if t <= 0.0 {
            let start = &self.brake[0];
            return (start.pos, start.vel, start.acc);
        }
        let mut remaining = t;
        for phase in self.brake.iter().chain(self.phases.iter()) {
            if remaining <= phase.time {
                return phase.state_at(remaining);
            }
            remaining -= phase.time;
        }
        self.continued(remaining)
    }

    /// State `time` after the profile end.
    fn continued(&self, time: f64) -> (f64, f64, f64) {
        let (p, v, a) = self.end_state();
        match self.continuation {
            Continuation::Hold => (p, v, a),
            Continuation::Cruise => (p + v * time, v, a),
            Continuation::Extrapolate => self.tail(time).end_state(),
        }
    }

    /// Constant-acceleration continuation lasting `time` after the profile end.
    fn tail(&self, time: f64) -> MotionPolynomial {
        self.phases[6].next(time, 0.0)
    }

    /// Position extrema over `[0, horizon]`, including the continuation
    /// when the horizon exceeds the profile duration.
    pub fn position_extrema(&self, horizon: f64) -> PositionExtrema {
        let start = &self.brake[0];
        let mut extrema = PositionExtrema::at(0.0, start.pos);

        let mut offset = 0.0;
        for phase in self.brake.iter().chain(self.phases.iter()) {
            if phase.time > 0.0 {
                extrema.include(offset, phase.pos);
                for &t in phase.velocity_roots().as_slice() {
                    extrema.include(offset + t, phase.state_at(t).0);
                }
                offset += phase.time;
            }
        }
        let (p_end, _, _) = self.end_state();
        extrema.include(self.duration, p_end);

        if horizon > self.duration {
            let time = horizon - self.duration;
            match self.continuation {
                Continuation::Hold => {}
                Continuation::Cruise => extrema.include(horizon, self.continued(time).0),
                Continuation::Extrapolate => {
                    let tail = self.tail(time);
                    for &t in tail.velocity_roots().as_slice() {
                        extrema.include(self.duration + t, tail.state_at(t).0);
                    }
                    extrema.include(horizon, tail.end_state().0);
                }
            }
        }
        extrema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::velocity;
    use approx::assert_relative_eq;

    fn problem(pf: f64) -> AxisProblem {
        AxisProblem {
            p0: 0.0,
            v0: 0.0,
            a0: 0.0,
            pf,
            vf: 0.0,
            af: 0.0,
            limits: Limits::new(1.0, 1.0, 1.0),
            interface: Interface::Position,
        }
    }

    fn trapezoid() -> (AxisProblem, Profile) {
        // 0 -> 1 m/s takes 2 s and 1 m, cruise 8 m, 1 -> 0 m/s another 1 m
        let problem = problem(10.0);
        let up = velocity::time_optimal(0.0, 0.0, 1.0, 0.0, &problem.limits).unwrap();
        let down = velocity::time_optimal(1.0, 0.0, 0.0, 0.0, &problem.limits).unwrap();
        let profile = Profile::from_legs(&problem, &Brake::default(), &up, 8.0, &down);
        (problem, profile)
    }

    #[test]
    fn assembled_trapezoid_passes_check() {
        let (problem, profile) = trapezoid();
        assert!(profile.check(&problem));
        assert_relative_eq!(profile.duration(), 12.0, epsilon = 1e-12);
        assert_eq!(profile.reached_limits(), ReachedLimits::Vel);
        assert_eq!(profile.jerk_signs(), JerkSigns::Uddu);

        let (p, v, a) = profile.state_at(6.0);
        assert_relative_eq!(p, 5.0, epsilon = 1e-12);
        assert_relative_eq!(v, 1.0, epsilon = 1e-12);
        assert_relative_eq!(a, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn check_rejects_wrong_target() {
        let (mut problem, profile) = trapezoid();
        problem.pf = 10.5;
        assert!(!profile.check(&problem));
    }

    #[test]
    fn check_rejects_velocity_overshoot() {
        let (mut problem, profile) = trapezoid();
        problem.limits.max_velocity = 0.9;
        assert!(!profile.check(&problem));
    }

    #[test]
    fn idle_profile_extrapolates_constant_acceleration() {
        let idle = Profile::idle(1.0, 2.0, 0.5);
        assert_eq!(idle.duration(), 0.0);
        let (p, v, a) = idle.state_at(2.0);
        assert_relative_eq!(p, 1.0 + 4.0 + 1.0);
        assert_relative_eq!(v, 3.0);
        assert_relative_eq!(a, 0.5);
    }

    #[test]
    fn extrema_cover_reversal_and_tail() {
        // Moving forward while braking: turns around at t = 2, p = 1
        let idle = Profile::idle(0.0, 1.0, -0.5);
        let extrema = idle.position_extrema(6.0);
        assert_relative_eq!(extrema.max, 1.0, epsilon = 1e-12);
        assert_relative_eq!(extrema.t_max, 2.0, epsilon = 1e-12);
        // p(6) = 6 - 9 = -3
        assert_relative_eq!(extrema.min, -3.0, epsilon = 1e-12);
        assert_relative_eq!(extrema.t_min, 6.0);
    }

    #[test]
    fn finished_position_profile_holds_its_target() {
        let mut problem = problem(1.0);
        problem.vf = 0.5;
        problem.af = 0.2;
        problem.limits = Limits::new(1.0, 1.0, 1.0);
        let profile = crate::position::time_optimal_profile(&problem).unwrap();
        assert_eq!(profile.continuation(), Continuation::Hold);

        let end = profile.end_state();
        assert_eq!(profile.state_at(profile.duration() + 10.0), end);
        assert_eq!(
            profile.position_extrema(profile.duration() + 10.0),
            profile.position_extrema(profile.duration())
        );
    }

    #[test]
    fn finished_velocity_profile_cruises() {
        let problem = AxisProblem {
            vf: 1.0,
            af: 0.5,
            interface: Interface::Velocity,
            ..problem(0.0)
        };
        let profile = crate::velocity::time_optimal_profile(&problem).unwrap();
        assert_eq!(profile.continuation(), Continuation::Cruise);

        let (p, _, _) = profile.end_state();
        let (p2, v2, a2) = profile.state_at(profile.duration() + 2.0);
        assert_relative_eq!(p2, p + 2.0, epsilon = 1e-7);
        assert_relative_eq!(v2, 1.0, epsilon = 1e-8);
        assert_relative_eq!(a2, 0.5, epsilon = 1e-8);
    }

    #[test]
    fn extrema_of_monotone_move_are_its_endpoints() {
        let (_, profile) = trapezoid();
        let extrema = profile.position_extrema(profile.duration());
        assert_eq!(extrema.min, 0.0);
        assert_eq!(extrema.t_min, 0.0);
        assert_relative_eq!(extrema.max, 10.0, epsilon = 1e-12);
        assert_relative_eq!(extrema.t_max, 12.0, epsilon = 1e-12);
    }
}
