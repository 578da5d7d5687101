pub mod consts;
pub mod error;

pub mod tuple;
pub mod color;
pub mod ray;

pub mod material;
pub mod shape;
pub mod light;
pub mod scene;

pub mod tracer;
pub mod camera;

pub mod canvas;
pub mod parallel;

use consts::{EPSILON, FEQ_EPSILON};

/// Snaps a value to exactly zero when it is within `EPSILON` of it.
///
/// Intersection and shading math uses this everywhere to suppress
/// floating-point noise before sign tests.
pub fn align_zero(x: f64) -> f64 {
    if x.abs() < EPSILON { 0.0 } else { x }
}

/// Checks whether a value is zero up to `EPSILON`.
pub fn is_zero(x: f64) -> bool {
    x.abs() < EPSILON
}

/// Loose floating-point comparison, used by the value types' `PartialEq`.
pub fn feq(left: f64, right: f64) -> bool {
    (left - right).abs() < FEQ_EPSILON
}

/* Tests */

#[test]
fn align_zero_snaps_only_tiny_values() {
    assert_eq!(align_zero(1e-12), 0.0);
    assert_eq!(align_zero(-1e-12), 0.0);
    assert_eq!(align_zero(1e-6), 1e-6);
    assert_eq!(align_zero(-3.0), -3.0);
}

#[test]
fn feq_tolerance() {
    assert!(feq(1.0, 1.0 + 1e-5));
    assert!(!feq(1.0, 1.001));
}
