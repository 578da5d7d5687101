use std::ops::{Add, Mul};

use crate::feq;

/// A red-green-blue color.
///
/// Channels are unbounded during shading; they are only clamped when the
/// canvas is written out. `PartialEq` compares channels with the loose
/// `feq` tolerance so test assertions survive floating-point noise.
#[derive(Copy, Clone, Debug, Default)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl PartialEq for Color {
    fn eq(&self, other: &Color) -> bool {
        feq(self.r, other.r) && feq(self.g, other.g) && feq(self.b, other.b)
    }
}

impl Color {
    pub fn rgb(r: f64, g: f64, b: f64) -> Color {
        Color { r, g, b }
    }

    pub fn black() -> Color {
        Color { r: 0.0, g: 0.0, b: 0.0 }
    }

    pub fn white() -> Color {
        Color { r: 1.0, g: 1.0, b: 1.0 }
    }

    /// Scales every channel by the matching channel of a coefficient
    /// triple.
    pub fn scaled(self, k: Triple) -> Color {
        Color {
            r: self.r * k.0,
            g: self.g * k.1,
            b: self.b * k.2,
        }
    }

    /// Divides every channel by a sample count. Used to average the
    /// colors of a ray bundle.
    pub fn reduce(self, n: usize) -> Color {
        let inv = 1.0 / n as f64;
        Color { r: self.r * inv, g: self.g * inv, b: self.b * inv }
    }

    /// Exact channel equality, unlike the tolerance-based `PartialEq`.
    ///
    /// Adaptive supersampling subdivides a quadrant unless its corner
    /// colors are structurally identical.
    pub fn identical(&self, other: &Color) -> bool {
        self.r == other.r && self.g == other.g && self.b == other.b
    }
}

impl Add for Color {
    type Output = Color;

    fn add(self, other: Color) -> Color {
        Color {
            r: self.r + other.r,
            g: self.g + other.g,
            b: self.b + other.b,
        }
    }
}

/// Scalar scaling of a color.
impl Mul<f64> for Color {
    type Output = Color;

    fn mul(self, other: f64) -> Color {
        Color { r: self.r * other, g: self.g * other, b: self.b * other }
    }
}

/// A per-channel coefficient.
///
/// Material coefficients (kD, kS, kT, kR) and the accumulated recursion
/// weight `k` are triples so a surface can, say, transmit red more than
/// blue. Comparison is exact; triples are configuration, not results.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Triple(pub f64, pub f64, pub f64);

impl Triple {
    pub const ZERO: Triple = Triple(0.0, 0.0, 0.0);
    pub const ONE: Triple = Triple(1.0, 1.0, 1.0);

    pub fn product(self, other: Triple) -> Triple {
        Triple(self.0 * other.0, self.1 * other.1, self.2 * other.2)
    }

    pub fn scale(self, s: f64) -> Triple {
        Triple(self.0 * s, self.1 * s, self.2 * s)
    }

    /// True when every channel is strictly below the threshold. The
    /// shading recursion prunes a branch once its weight satisfies this.
    pub fn lower_than(self, threshold: f64) -> bool {
        self.0 < threshold && self.1 < threshold && self.2 < threshold
    }
}

impl From<f64> for Triple {
    fn from(v: f64) -> Triple {
        Triple(v, v, v)
    }
}

/* Tests */

#[test]
fn add_colors() {
    let c1 = Color::rgb(0.9, 0.6, 0.75);
    let c2 = Color::rgb(0.7, 0.1, 0.25);

    assert_eq!(c1 + c2, Color::rgb(1.6, 0.7, 1.0));
}

#[test]
fn scale_color() {
    let c = Color::rgb(0.2, 0.3, 0.4);

    assert_eq!(c * 2.0, Color::rgb(0.4, 0.6, 0.8));
}

#[test]
fn scale_by_triple() {
    let c = Color::rgb(1.0, 0.5, 0.25);

    assert_eq!(c.scaled(Triple(0.5, 1.0, 0.0)), Color::rgb(0.5, 0.5, 0.0));
}

#[test]
fn reduce_averages() {
    let sum = Color::rgb(1.0, 2.0, 3.0);

    assert_eq!(sum.reduce(4), Color::rgb(0.25, 0.5, 0.75));
}

#[test]
fn triple_lower_than() {
    assert!(Triple::ZERO.lower_than(0.001));
    assert!(Triple(0.0005, 0.0, 0.0009).lower_than(0.001));
    assert!(!Triple(0.0005, 0.1, 0.0).lower_than(0.001));
    assert!(!Triple::ONE.lower_than(0.001));
}

#[test]
fn triple_product_and_scale() {
    let k = Triple(0.5, 1.0, 0.2).product(Triple(0.5, 0.5, 0.5));
    assert_eq!(k, Triple(0.25, 0.5, 0.1));
    assert_eq!(k.scale(2.0), Triple(0.5, 1.0, 0.2));
    assert_eq!(Triple::from(0.3), Triple(0.3, 0.3, 0.3));
}

#[test]
fn identical_is_exact() {
    let c1 = Color::rgb(0.5, 0.5, 0.5);
    let c2 = Color::rgb(0.5 + 1e-6, 0.5, 0.5);

    assert_eq!(c1, c2);
    assert!(!c1.identical(&c2));
    assert!(c1.identical(&c1));
}
