mod core;
pub mod nurbs;

pub use self::core::{Point3, Tolerance, Transform, Vec3};
pub use nurbs::{CurveError, CurveForm, NurbsCurve3, PERIODIC_EPSILON};

#[cfg(test)]
mod tests;
