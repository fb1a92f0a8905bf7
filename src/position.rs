//! Position-interface profiles.
//!
//! Every profile is built as: brake, a velocity leg to a junction state
//! `(vm, am)`, an optional cruise at `vm` (only when `am == 0`), and a
//! second leg to the target velocity and acceleration. The synthesizer
//! searches the junction state so that the distance matches the target.

use crate::brake::{self, Brake};
use crate::profile::{AxisProblem, Profile};
use crate::roots;
use crate::velocity::{self, VelocityLeg, TIME_EPS};

/// Two legs meeting at a junction state.
#[derive(Clone, Copy, Debug)]
struct Plan {
    first: VelocityLeg,
    second: VelocityLeg,
    distance: f64,
}

impl Plan {
    fn duration(&self) -> f64 {
        self.first.duration() + self.second.duration()
    }
}

/// Shared state of one synthesis run: the brake and where it hands over.
struct Planner<'a> {
    problem: &'a AxisProblem,
    brake: Brake,
    vb: f64,
    ab: f64,
    /// Distance still to cover after the brake
    distance: f64,
}

impl<'a> Planner<'a> {
    fn new(problem: &'a AxisProblem) -> Option<Self> {
        let brake = brake::position_brake(problem.v0, problem.a0, &problem.limits)?;
        let (pb, vb, ab) = brake.apply(problem.p0, problem.v0, problem.a0);
        Some(Self {
            problem,
            brake,
            vb,
            ab,
            distance: problem.pf - pb,
        })
    }

    /// Fastest legs through the junction `(vm, am)`.
    fn plan(&self, vm: f64, am: f64) -> Option<Plan> {
        let limits = &self.problem.limits;
        let first = velocity::time_optimal(self.vb, self.ab, vm, am, limits)?;
        let second = velocity::time_optimal(vm, am, self.problem.vf, self.problem.af, limits)?;
        let distance = first.distance(self.vb, self.ab) + second.distance(vm, am);
        Some(Plan {
            first,
            second,
            distance,
        })
    }

    /// Assembles the full profile and keeps it only if it is valid.
    fn profile(&self, plan: &Plan, cruise: f64) -> Option<Profile> {
        let profile = Profile::from_legs(self.problem, &self.brake, &plan.first, cruise, &plan.second);
        profile.check(self.problem).then_some(profile)
    }

    fn velocity_grid_roots<F>(&self, f: F) -> roots::RootSet
    where
        F: FnMut(f64) -> Option<f64>,
    {
        let limits = &self.problem.limits;
        roots::grid_roots(
            limits.min_velocity,
            limits.max_velocity,
            &[self.vb, self.problem.vf, 0.0],
            f,
        )
    }

    /// Junction velocity for the two-step shape with junction acceleration
    /// `am`, chosen so the distance matches. The junction velocity lies
    /// between the start and target velocities.
    fn two_step(&self, am: f64) -> Option<Plan> {
        let (v_lo, v_hi) = (self.vb.min(self.problem.vf), self.vb.max(self.problem.vf));
        let mut f = |vm: f64| self.plan(vm, am).map(|plan| plan.distance - self.distance);

        let f_lo = f(v_lo)?;
        let f_hi = f(v_hi)?;
        let vm = if f_lo == 0.0 {
            v_lo
        } else if f_hi == 0.0 {
            v_hi
        } else if f_lo.signum() != f_hi.signum() {
            roots::bisect(&mut f, v_lo, v_hi, f_lo)?
        } else {
            return None;
        };
        self.plan(vm, am)
    }

    /// Acceleration bound in the direction from the start to the target velocity.
    fn two_step_acceleration_limit(&self) -> f64 {
        let limits = &self.problem.limits;
        if self.problem.vf > self.vb {
            limits.max_acceleration
        } else {
            limits.min_acceleration
        }
    }

    /// Junction acceleration minimizing the two-step duration.
    fn fastest_two_step(&self) -> Option<(f64, Plan)> {
        let cost = |am: f64| self.two_step(am).map_or(f64::INFINITY, |plan| plan.duration());
        let am = roots::golden_section_min(0.0, self.two_step_acceleration_limit(), cost);
        self.two_step(am).map(|plan| (am, plan))
    }
}

/// Keeps the shorter of the stored and the candidate profile.
fn keep_shorter(best: &mut Option<(Profile, f64)>, candidate: Option<Profile>, vm: f64) {
    let Some(profile) = candidate else { return };
    if best.as_ref().map_or(true, |(b, _)| profile.duration() < b.duration()) {
        *best = Some((profile, vm));
    }
}

/// Minimum-time profile reaching the target position, velocity and acceleration.
pub(crate) fn time_optimal_profile(problem: &AxisProblem) -> Option<Profile> {
    let planner = Planner::new(problem)?;
    let limits = &problem.limits;
    let mut best: Option<(Profile, f64)> = None;

    // 1) Cruise at a velocity bound for the remaining distance
    for v_cruise in [limits.max_velocity, limits.min_velocity] {
        if let Some(plan) = planner.plan(v_cruise, 0.0) {
            let cruise = (planner.distance - plan.distance) / v_cruise;
            if cruise >= -TIME_EPS {
                keep_shorter(&mut best, planner.profile(&plan, cruise.max(0.0)), v_cruise);
            }
        }
    }

    // 2) No cruise: the peak velocity alone has to cover the distance
    let peaks = planner.velocity_grid_roots(|vp| {
        planner.plan(vp, 0.0).map(|plan| plan.distance - planner.distance)
    });
    for &vp in peaks.as_slice() {
        if let Some(plan) = planner.plan(vp, 0.0) {
            keep_shorter(&mut best, planner.profile(&plan, 0.0), vp);
        }
    }

    // 3) A peak between start and target velocity wastes time stopping the
    //    acceleration halfway, keep pushing through a non-zero junction instead
    let (v_lo, v_hi) = (planner.vb.min(problem.vf), planner.vb.max(problem.vf));
    let between = |vm: f64| vm > v_lo && vm < v_hi;
    if v_lo < v_hi && best.as_ref().map_or(true, |(_, vm)| between(*vm)) {
        if let Some((_, plan)) = planner.fastest_two_step() {
            keep_shorter(&mut best, planner.profile(&plan, 0.0), 0.5 * (v_lo + v_hi));
        }
    }

    best.map(|(profile, _)| profile)
}

/// Profile reaching the target state after exactly `duration` seconds.
///
/// Searches the cruise velocity that stretches the motion to the requested
/// duration; slower cruise velocities are preferred.
pub(crate) fn fixed_duration_profile(problem: &AxisProblem, duration: f64) -> Option<Profile> {
    let planner = Planner::new(problem)?;
    let t = duration - planner.brake.duration();
    if !t.is_finite() || t < -TIME_EPS {
        return None;
    }

    // Negative cruise durations are allowed here so the function stays
    // continuous, those roots are dropped below
    let residual = |vp: f64| {
        planner
            .plan(vp, 0.0)
            .map(|plan| plan.distance + vp * (t - plan.duration()) - planner.distance)
    };
    let mut candidates = planner.velocity_grid_roots(residual);
    candidates.as_mut_slice().sort_unstable_by(|a, b| a.abs().total_cmp(&b.abs()));

    let matches = |profile: &Profile| (profile.duration() - duration).abs() <= 1e-8 * duration.max(1.0);
    for &vp in candidates.as_slice() {
        let Some(plan) = planner.plan(vp, 0.0) else { continue };
        let cruise = t - plan.duration();
        if cruise < -TIME_EPS {
            continue;
        }
        if let Some(profile) = planner.profile(&plan, cruise.max(0.0)) {
            if matches(&profile) {
                return Some(profile);
            }
        }
    }

    // Between the fastest two-step shape and the zero-acceleration junction
    // the duration changes continuously with the junction acceleration
    if planner.vb != problem.vf {
        let (am_fast, fast) = planner.fastest_two_step()?;
        let slow = planner.two_step(0.0)?;
        let (t_fast, t_slow) = (fast.duration(), slow.duration());
        if t_fast <= t + TIME_EPS && t <= t_slow + TIME_EPS {
            let mut f = |am: f64| planner.two_step(am).map(|plan| plan.duration() - t);
            let f_slow = t_slow - t;
            let am = if f_slow.abs() <= TIME_EPS {
                0.0
            } else if (t_fast - t).abs() <= TIME_EPS {
                am_fast
            } else {
                roots::bisect(&mut f, 0.0, am_fast, f_slow)?
            };
            let plan = planner.two_step(am)?;
            let profile = planner.profile(&plan, 0.0)?;
            return matches(&profile).then_some(profile);
        }
    }
    None
}
