//! Bounded-iteration numeric helpers used by the profile synthesizers.
//!
//! Every search here terminates after a fixed number of steps so one
//! calculation cycle has a hard upper bound on its cost.

/// Depth of binary search used for numeric approximation
pub(crate) const BISECTION_DEPTH: usize = 100;

/// Number of cells used to bracket sign changes on an interval
pub(crate) const GRID_CELLS: usize = 64;

/// Depth of the golden-section search over junction accelerations
pub(crate) const GOLDEN_DEPTH: usize = 32;

const MAX_ROOTS: usize = 8;
const MAX_EXTRA_POINTS: usize = 6;
const MAX_POINTS: usize = GRID_CELLS + 1 + MAX_EXTRA_POINTS;

/// A small fixed-capacity set of real roots.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RootSet {
    values: [f64; MAX_ROOTS],
    len: usize,
}

impl RootSet {
    /// Adds a root, silently dropping it once the set is full.
    pub fn push(&mut self, value: f64) {
        if self.len < MAX_ROOTS {
            self.values[self.len] = value;
            self.len += 1;
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values[..self.len]
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.values[..self.len]
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Real roots of `a*x^2 + b*x + c = 0`, falling back to the linear case.
pub fn solve_quadratic(a: f64, b: f64, c: f64) -> RootSet {
    let mut roots = RootSet::default();
    if a == 0.0 {
        if b != 0.0 {
            roots.push(-c / b);
        }
        return roots;
    }

    let mut discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        // Allow a double root that rounding pushed slightly below zero
        if discriminant > -f64::EPSILON * b * b {
            discriminant = 0.0;
        } else {
            return roots;
        }
    }

    // Numerically stable form, avoids cancellation between b and sqrt
    let q = -0.5 * (b + b.signum() * discriminant.sqrt());
    if q == 0.0 {
        roots.push(0.0);
        return roots;
    }
    roots.push(q / a);
    if discriminant > 0.0 {
        roots.push(c / q);
    }
    roots
}

/// Binary search for a sign change of `f` inside `[lo, hi]`.
///
/// `f_lo` is `f(lo)`; the caller guarantees `f(hi)` has the opposite sign.
/// Returns `None` as soon as `f` is undefined at a sampled point.
pub fn bisect<F>(f: &mut F, mut lo: f64, mut hi: f64, mut f_lo: f64) -> Option<f64>
where
    F: FnMut(f64) -> Option<f64>,
{
    for _ in 0..BISECTION_DEPTH {
        let mid = 0.5 * (lo + hi);
        if mid <= lo || mid >= hi {
            break;
        }
        let f_mid = f(mid)?;
        if f_mid == 0.0 {
            return Some(mid);
        }
        if f_mid.signum() == f_lo.signum() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    Some(0.5 * (lo + hi))
}

/// Scans `[lo, hi]` on a uniform grid (plus `extra` points that fall inside)
/// and refines every sign change of `f` by bisection.
pub fn grid_roots<F>(lo: f64, hi: f64, extra: &[f64], mut f: F) -> RootSet
where
    F: FnMut(f64) -> Option<f64>,
{
    let mut roots = RootSet::default();
    if !(lo.is_finite() && hi.is_finite()) || hi < lo {
        return roots;
    }

    let mut points = [0.0; MAX_POINTS];
    let mut count = 0;
    for i in 0..=GRID_CELLS {
        points[count] = lo + (hi - lo) * (i as f64) / (GRID_CELLS as f64);
        count += 1;
    }
    for &x in extra.iter().take(MAX_EXTRA_POINTS) {
        if x > lo && x < hi {
            points[count] = x;
            count += 1;
        }
    }
    let points = &mut points[..count];
    points.sort_unstable_by(f64::total_cmp);

    let mut values = [None; MAX_POINTS];
    for (value, &x) in values.iter_mut().zip(points.iter()) {
        *value = f(x);
    }

    for i in 0..count {
        let Some(f_a) = values[i] else { continue };
        if f_a == 0.0 {
            roots.push(points[i]);
            continue;
        }
        if i + 1 == count {
            break;
        }
        if let Some(f_b) = values[i + 1] {
            if f_b != 0.0 && f_a.signum() != f_b.signum() {
                if let Some(root) = bisect(&mut f, points[i], points[i + 1], f_a) {
                    roots.push(root);
                }
            }
        }
    }
    roots
}

/// Golden-section search for the minimum of `f` on `[a, b]`.
///
/// The bounds may be given in either order.
pub fn golden_section_min<F>(a: f64, b: f64, mut f: F) -> f64
where
    F: FnMut(f64) -> f64,
{
    const INV_PHI: f64 = 0.618_033_988_749_894_9;

    let (mut lo, mut hi) = if a <= b { (a, b) } else { (b, a) };
    let mut x1 = hi - INV_PHI * (hi - lo);
    let mut x2 = lo + INV_PHI * (hi - lo);
    let mut f1 = f(x1);
    let mut f2 = f(x2);

    for _ in 0..GOLDEN_DEPTH {
        if f1 <= f2 {
            hi = x2;
            x2 = x1;
            f2 = f1;
            x1 = hi - INV_PHI * (hi - lo);
            f1 = f(x1);
        } else {
            lo = x1;
            x1 = x2;
            f1 = f2;
            x2 = lo + INV_PHI * (hi - lo);
            f2 = f(x2);
        }
    }

    if f1 <= f2 {
        x1
    } else {
        x2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn quadratic_with_two_roots() {
        let mut found = solve_quadratic(1.0, -3.0, 2.0);
        found.as_mut_slice().sort_unstable_by(f64::total_cmp);
        assert_eq!(found.as_slice().len(), 2);
        assert_relative_eq!(found.as_slice()[0], 1.0);
        assert_relative_eq!(found.as_slice()[1], 2.0);
    }

    #[test]
    fn quadratic_degenerates_to_linear() {
        let roots = solve_quadratic(0.0, 2.0, -4.0);
        assert_eq!(roots.as_slice(), &[2.0]);
        assert!(solve_quadratic(0.0, 0.0, 1.0).is_empty());
        assert!(solve_quadratic(1.0, 0.0, 1.0).is_empty());
    }

    #[test]
    fn bisection_converges_on_cube_root() {
        let mut f = |x: f64| Some(x * x * x - 2.0);
        let root = bisect(&mut f, 0.0, 2.0, -2.0).unwrap();
        assert_relative_eq!(root, 2f64.cbrt(), epsilon = 1e-12);
    }

    #[test]
    fn bisection_aborts_on_undefined_point() {
        let mut f = |x: f64| if x > 0.9 && x < 1.1 { None } else { Some(x - 1.0) };
        assert_eq!(bisect(&mut f, 0.0, 2.0, -1.0), None);
    }

    #[test]
    fn grid_finds_every_sign_change() {
        let roots = grid_roots(-3.0, 3.0, &[], |x| Some((x - 1.0) * (x + 2.0)));
        let mut found = roots.as_slice().to_vec();
        found.sort_by(f64::total_cmp);
        assert_eq!(found.len(), 2);
        assert_relative_eq!(found[0], -2.0, epsilon = 1e-12);
        assert_relative_eq!(found[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn grid_reports_exact_zero_at_extra_point() {
        let roots = grid_roots(-1.0, 1.0, &[0.3], |x| Some((x - 0.3).powi(2)));
        assert_eq!(roots.as_slice(), &[0.3]);
    }

    #[test]
    fn golden_section_locates_parabola_minimum() {
        let x = golden_section_min(4.0, -4.0, |x| (x - 1.5).powi(2));
        assert_relative_eq!(x, 1.5, epsilon = 1e-5);
    }
}
