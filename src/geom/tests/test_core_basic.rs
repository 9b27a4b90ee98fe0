use crate::geom::{Point3, Tolerance, Transform, Vec3};

#[test]
fn translation_lives_in_row_three() {
    let t = Transform::from_translation(1.0, 2.0, 3.0);
    assert_eq!(t.translation(), Point3::new(1.0, 2.0, 3.0));
    assert_eq!(t.entry(3, 0), 1.0);
    assert_eq!(t.entry(3, 1), 2.0);
    assert_eq!(t.entry(3, 2), 3.0);
    assert_eq!(t.entry(3, 3), 1.0);
}

#[test]
fn rotation_does_not_touch_translation() {
    let mut t = Transform::rotate_z(std::f64::consts::FRAC_PI_3);
    t.set_translation(5.0, -1.0, 0.5);
    assert_eq!(t.translation(), Point3::new(5.0, -1.0, 0.5));
}

#[test]
fn identity_translation_is_origin() {
    assert_eq!(Transform::identity().translation(), Point3::ORIGIN);
}

#[test]
fn point_vector_roundtrip() {
    let a = Point3::new(1.0, 2.0, 3.0);
    let b = Point3::new(4.0, 6.0, 3.0);
    let v = b.sub_point(a);
    assert_eq!(v, Vec3::new(3.0, 4.0, 0.0));
    assert_eq!(a.add_vec(v), b);
    assert_eq!(a.distance_to(b), 5.0);
}

#[test]
fn tolerance_compares_within_epsilon() {
    let tol = Tolerance::new(1e-6);
    assert!(tol.approx_eq_f64(1.0, 1.0 + 5e-7));
    assert!(!tol.approx_eq_f64(1.0, 1.0 + 5e-6));
    assert!(tol.approx_eq_point3(
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1e-7, -1e-7, 0.0)
    ));
}
