//! Host-side NURBS curve value and its two constructors.
//!
//! The host stores knot vectors in trimmed form: a curve with `n` control
//! points of degree `d` carries `n + d - 1` knots. The conventional clamped
//! vector of `n + d + 1` entries is reconstructed from the boundary spacing
//! whenever the curve is evaluated.

use super::core::{Point3, Tolerance};

/// Epsilon for the periodicity validation. Deliberately tight: knot values
/// produced with single-precision arithmetic accumulate enough error to fail
/// this check, so all knot math must stay in `f64`.
pub const PERIODIC_EPSILON: f64 = 1e-9;

/// Shape of a curve's parameter space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveForm {
    Open,
    Periodic,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CurveError {
    #[error("curve requires at least 2 control points, got {count}")]
    TooFewControlPoints { count: usize },
    #[error("curve degree must be >= 1")]
    DegreeTooLow,
    #[error("degree {degree} requires more control points than {count}")]
    DegreeTooHigh { degree: usize, count: usize },
    #[error("expected {expected} knots for {cvs} control points of degree {degree}, got {got}")]
    KnotCountMismatch {
        expected: usize,
        got: usize,
        cvs: usize,
        degree: usize,
    },
    #[error("knots must be non-decreasing (knot {index} decreases)")]
    DecreasingKnots { index: usize },
    #[error("control points and knots must be finite")]
    NonFiniteInput,
    #[error("periodic curve requires at least {required} control points including the wrap, got {count}")]
    TooFewPeriodicPoints { required: usize, count: usize },
    #[error("periodic knot spacing is not uniform at knot {index}")]
    AperiodicKnots { index: usize },
    #[error("periodic curve seam mismatch at control point {index}")]
    SeamMismatch { index: usize },
    #[error("rational curves are not supported by this constructor")]
    RationalUnsupported,
    #[error("2D curves are not supported by this constructor")]
    TwoDimensionalUnsupported,
    #[error("periodic edit-point curves require uniform parameterization")]
    NonUniformPeriodic,
    #[error("edit-point construction requires at least 2 points, got {count}")]
    TooFewEditPoints { count: usize },
    #[error("singular interpolation system")]
    SingularSystem,
}

/// A non-rational 3-D NURBS curve in the host's representation.
#[derive(Debug, Clone, PartialEq)]
pub struct NurbsCurve3 {
    pub degree: usize,
    pub control_points: Vec<Point3>,
    pub knots: Vec<f64>,
    pub form: CurveForm,
}

impl NurbsCurve3 {
    /// The CV constructor: control points and knots are taken as given and
    /// validated strictly. Periodic curves must carry their wrapped control
    /// points and uniformly spaced knots; see [`PERIODIC_EPSILON`].
    pub fn create(
        control_points: Vec<Point3>,
        knots: Vec<f64>,
        degree: usize,
        form: CurveForm,
        rational: bool,
        in_2d: bool,
    ) -> Result<Self, CurveError> {
        if rational {
            return Err(CurveError::RationalUnsupported);
        }
        if in_2d {
            return Err(CurveError::TwoDimensionalUnsupported);
        }

        let count = control_points.len();
        if count < 2 {
            return Err(CurveError::TooFewControlPoints { count });
        }
        if degree == 0 {
            return Err(CurveError::DegreeTooLow);
        }
        if degree > count - 1 {
            return Err(CurveError::DegreeTooHigh { degree, count });
        }

        let expected = count + degree - 1;
        if knots.len() != expected {
            return Err(CurveError::KnotCountMismatch {
                expected,
                got: knots.len(),
                cvs: count,
                degree,
            });
        }

        if control_points.iter().any(|p| !p.is_finite()) || knots.iter().any(|k| !k.is_finite()) {
            return Err(CurveError::NonFiniteInput);
        }

        for i in 1..knots.len() {
            if knots[i] < knots[i - 1] {
                return Err(CurveError::DecreasingKnots { index: i });
            }
        }

        if form == CurveForm::Periodic {
            validate_periodic(&control_points, &knots, degree)?;
        }

        Ok(Self {
            degree,
            control_points,
            knots,
            form,
        })
    }

    /// The EP constructor: computes knots and control points so that the
    /// curve passes through every edit point.
    ///
    /// The fitter solves a global interpolation system over a clamped knot
    /// vector and assembles the result directly; the strict periodic seam
    /// validation of [`NurbsCurve3::create`] does not apply to its own
    /// output. Periodic fits require uniform parameterization. Open fits may
    /// use chord-length parameterization by passing `uniform_param = false`.
    pub fn create_with_edit_points(
        edit_points: &[Point3],
        degree: usize,
        form: CurveForm,
        in_2d: bool,
        rational: bool,
        uniform_param: bool,
    ) -> Result<Self, CurveError> {
        if rational {
            return Err(CurveError::RationalUnsupported);
        }
        if in_2d {
            return Err(CurveError::TwoDimensionalUnsupported);
        }
        if form == CurveForm::Periodic && !uniform_param {
            return Err(CurveError::NonUniformPeriodic);
        }

        let n = edit_points.len();
        if n < 2 {
            return Err(CurveError::TooFewEditPoints { count: n });
        }
        if edit_points.iter().any(|p| !p.is_finite()) {
            return Err(CurveError::NonFiniteInput);
        }
        if degree == 0 {
            return Err(CurveError::DegreeTooLow);
        }

        let p = degree.min(n - 1);
        let params = if uniform_param {
            uniform_parameters(n)
        } else {
            chord_length_parameters(edit_points)
        };

        let full_knots = averaging_knot_vector(&params, p);
        let control_points = solve_interpolation_system(edit_points, &params, &full_knots, p)?;

        // Trim to the host convention: the two boundary knots are implied.
        let knots = full_knots[1..full_knots.len() - 1].to_vec();

        Ok(Self {
            degree: p,
            control_points,
            knots,
            form,
        })
    }

    /// Parameter interval the curve is defined over.
    #[must_use]
    pub fn domain(&self) -> (f64, f64) {
        let full = self.full_knots();
        (full[self.degree], full[self.control_points.len()])
    }

    /// Evaluate the curve at parameter `t` (clamped to the domain) with de
    /// Boor's algorithm.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point3 {
        let p = self.degree;
        let full = self.full_knots();
        let n = self.control_points.len() - 1;

        let (min, max) = (full[p], full[n + 1]);
        let u = t.clamp(min, max);

        let span = find_span(n, p, u, &full);
        let mut d: Vec<Point3> = (0..=p)
            .map(|j| self.control_points[span - p + j])
            .collect();

        for r in 1..=p {
            for j in (r..=p).rev() {
                let i = span - p + j;
                let denom = full[i + p - r + 1] - full[i];
                let alpha = if denom.abs() > f64::EPSILON {
                    (u - full[i]) / denom
                } else {
                    0.0
                };
                let a = d[j - 1];
                let b = d[j];
                d[j] = Point3::new(
                    (1.0 - alpha) * a.x + alpha * b.x,
                    (1.0 - alpha) * a.y + alpha * b.y,
                    (1.0 - alpha) * a.z + alpha * b.z,
                );
            }
        }

        d[p]
    }

    /// Whether the curve starts and ends at the same point.
    #[must_use]
    pub fn is_closed(&self, tol: Tolerance) -> bool {
        let (a, b) = self.domain();
        tol.approx_eq_point3(self.point_at(a), self.point_at(b))
    }

    /// Reconstruct the conventional knot vector of `n + degree + 1` entries.
    /// Open curves duplicate the boundary knots; periodic curves extend the
    /// uniform spacing outward.
    #[must_use]
    pub fn full_knots(&self) -> Vec<f64> {
        let k = &self.knots;
        let mut full = Vec::with_capacity(k.len() + 2);
        match self.form {
            CurveForm::Open => {
                full.push(k[0]);
                full.extend_from_slice(k);
                full.push(k[k.len() - 1]);
            }
            CurveForm::Periodic => {
                full.push(k[0] - (k[1] - k[0]));
                full.extend_from_slice(k);
                full.push(k[k.len() - 1] + (k[k.len() - 1] - k[k.len() - 2]));
            }
        }
        full
    }
}

fn validate_periodic(
    control_points: &[Point3],
    knots: &[f64],
    degree: usize,
) -> Result<(), CurveError> {
    let count = control_points.len();
    let required = 2 * degree + 1;
    if count < required {
        return Err(CurveError::TooFewPeriodicPoints { required, count });
    }

    // Uniform knot spacing across the whole vector, to the host's epsilon.
    let step = knots[1] - knots[0];
    if step <= PERIODIC_EPSILON {
        return Err(CurveError::AperiodicKnots { index: 1 });
    }
    for i in 2..knots.len() {
        if ((knots[i] - knots[i - 1]) - step).abs() > PERIODIC_EPSILON {
            return Err(CurveError::AperiodicKnots { index: i });
        }
    }

    // The trailing `degree` control points must repeat the leading ones.
    let tol = Tolerance::new(PERIODIC_EPSILON);
    for i in 0..degree {
        if !tol.approx_eq_point3(control_points[count - degree + i], control_points[i]) {
            return Err(CurveError::SeamMismatch { index: i });
        }
    }

    Ok(())
}

/// Uniform parameterization: `n` evenly spaced values over [0, 1].
fn uniform_parameters(n: usize) -> Vec<f64> {
    let last = (n - 1) as f64;
    (0..n).map(|i| i as f64 / last).collect()
}

/// Chord-length parameterization: parameters proportional to the cumulative
/// distance along the point sequence, normalized to [0, 1].
fn chord_length_parameters(points: &[Point3]) -> Vec<f64> {
    let mut lengths = Vec::with_capacity(points.len());
    lengths.push(0.0);

    let mut total = 0.0;
    for window in points.windows(2) {
        total += window[1].distance_to(window[0]);
        lengths.push(total);
    }

    if total > 0.0 {
        for length in &mut lengths {
            *length /= total;
        }
    } else {
        // Coincident points: fall back to uniform spacing.
        return uniform_parameters(points.len());
    }

    lengths
}

/// Knot vector via the averaging method: clamped ends, each interior knot
/// the mean of `degree` consecutive parameters. Returns the conventional
/// `n + degree + 1` entries.
fn averaging_knot_vector(params: &[f64], degree: usize) -> Vec<f64> {
    let n = params.len();
    let p = degree;

    let mut knots = Vec::with_capacity(n + p + 1);
    for _ in 0..=p {
        knots.push(0.0);
    }

    let interior = if n > p + 1 { n - p - 1 } else { 0 };
    for j in 1..=interior {
        let sum: f64 = params[j..j + p].iter().sum();
        knots.push(sum / p as f64);
    }

    for _ in 0..=p {
        knots.push(1.0);
    }

    knots
}

/// Solve the global interpolation system: find control points such that the
/// curve passes through `data_points[i]` at `params[i]`.
fn solve_interpolation_system(
    data_points: &[Point3],
    params: &[f64],
    knots: &[f64],
    degree: usize,
) -> Result<Vec<Point3>, CurveError> {
    let n = data_points.len();

    let mut matrix = vec![vec![0.0; n]; n];
    for (i, row) in matrix.iter_mut().enumerate() {
        for (j, entry) in row.iter_mut().enumerate() {
            *entry = basis_function(j, degree, params[i], knots);
        }
    }

    let rhs_x: Vec<f64> = data_points.iter().map(|pt| pt.x).collect();
    let rhs_y: Vec<f64> = data_points.iter().map(|pt| pt.y).collect();
    let rhs_z: Vec<f64> = data_points.iter().map(|pt| pt.z).collect();

    let control_x = solve_linear_system(&matrix, &rhs_x)?;
    let control_y = solve_linear_system(&matrix, &rhs_y)?;
    let control_z = solve_linear_system(&matrix, &rhs_z)?;

    Ok((0..n)
        .map(|i| Point3::new(control_x[i], control_y[i], control_z[i]))
        .collect())
}

/// The B-spline basis function N_{i,p}(t) via the Cox-de Boor recursion.
fn basis_function(i: usize, p: usize, t: f64, knots: &[f64]) -> f64 {
    if p == 0 {
        if t >= knots[i] && t < knots[i + 1] {
            return 1.0;
        }
        // Only the last non-empty interval owns t == t_max.
        let t_max = knots[knots.len() - 1];
        if (t - t_max).abs() < 1e-14
            && (knots[i + 1] - t_max).abs() < 1e-14
            && knots[i] < knots[i + 1]
        {
            return 1.0;
        }
        return 0.0;
    }

    let mut result = 0.0;

    if i + p < knots.len() {
        let denom = knots[i + p] - knots[i];
        if denom.abs() > 1e-14 {
            result += (t - knots[i]) / denom * basis_function(i, p - 1, t, knots);
        }
    }

    if i + p + 1 < knots.len() {
        let denom = knots[i + p + 1] - knots[i + 1];
        if denom.abs() > 1e-14 {
            result += (knots[i + p + 1] - t) / denom * basis_function(i + 1, p - 1, t, knots);
        }
    }

    result
}

/// Find the knot span containing `u`, for de Boor evaluation.
fn find_span(n: usize, p: usize, u: f64, knots: &[f64]) -> usize {
    if u >= knots[n + 1] {
        return n;
    }
    if u <= knots[p] {
        return p;
    }

    let mut low = p;
    let mut high = n + 1;
    let mut mid = (low + high) / 2;
    while u < knots[mid] || u >= knots[mid + 1] {
        if u < knots[mid] {
            high = mid;
        } else {
            low = mid;
        }
        mid = (low + high) / 2;
    }
    mid
}

/// Gaussian elimination with partial pivoting on a dense system.
fn solve_linear_system(matrix: &[Vec<f64>], rhs: &[f64]) -> Result<Vec<f64>, CurveError> {
    let n = matrix.len();

    let mut aug: Vec<Vec<f64>> = matrix
        .iter()
        .zip(rhs)
        .map(|(row, &b)| {
            let mut r = row.clone();
            r.push(b);
            r
        })
        .collect();

    for k in 0..n {
        let mut max_row = k;
        let mut max_val = aug[k][k].abs();
        for i in (k + 1)..n {
            if aug[i][k].abs() > max_val {
                max_val = aug[i][k].abs();
                max_row = i;
            }
        }
        if max_val < 1e-14 {
            return Err(CurveError::SingularSystem);
        }
        if max_row != k {
            aug.swap(k, max_row);
        }

        let pivot = aug[k][k];
        for i in (k + 1)..n {
            let factor = aug[i][k] / pivot;
            for j in k..=n {
                aug[i][j] -= factor * aug[k][j];
            }
        }
    }

    let mut result = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = aug[i][n];
        for j in (i + 1)..n {
            sum -= aug[i][j] * result[j];
        }
        if aug[i][i].abs() < 1e-14 {
            return Err(CurveError::SingularSystem);
        }
        result[i] = sum / aug[i][i];
    }

    Ok(result)
}
