use std::ops::{Add, Sub, Neg, Mul};

use crate::{feq, is_zero};

/// A location in 3D space.
#[derive(Debug, Default, Copy, Clone)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl PartialEq for Point {
    fn eq(&self, other: &Point) -> bool {
        feq(self.x, other.x) && feq(self.y, other.y) && feq(self.z, other.z)
    }
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Point {
        Point { x, y, z }
    }

    /// Exact coordinate equality, unlike the tolerance-based `PartialEq`.
    ///
    /// Intersection routines use this to guard subtractions that would
    /// otherwise construct a zero-length `Vector`.
    pub fn coincides(&self, other: &Point) -> bool {
        self.x == other.x && self.y == other.y && self.z == other.z
    }

    pub fn distance_squared(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    pub fn distance(&self, other: &Point) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// A non-zero displacement in 3D space.
///
/// The zero displacement is not a `Vector`; constructing one panics. This
/// is a fail-fast invariant of the arithmetic layer: shading and
/// intersection code guards degenerate cases with epsilon checks before
/// any vector is built from a subtraction.
#[derive(Debug, Copy, Clone)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl PartialEq for Vector {
    fn eq(&self, other: &Vector) -> bool {
        feq(self.x, other.x) && feq(self.y, other.y) && feq(self.z, other.z)
    }
}

impl Vector {
    /// Creates a vector from its components.
    ///
    /// # Panics
    ///
    /// Panics if all components are exactly zero.
    pub fn new(x: f64, y: f64, z: f64) -> Vector {
        if x == 0.0 && y == 0.0 && z == 0.0 {
            panic!("cannot create a zero vector");
        }

        Vector { x, y, z }
    }

    pub fn dot(&self, other: &Vector) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product. Panics when the operands are parallel, since the
    /// result would be the zero vector.
    pub fn cross(&self, other: &Vector) -> Vector {
        Vector::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn length_squared(&self) -> f64 {
        self.dot(self)
    }

    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    pub fn normalize(&self) -> Vector {
        let len = self.length();
        Vector::new(self.x / len, self.y / len, self.z / len)
    }

    /// An arbitrary unit vector orthogonal to this one.
    ///
    /// Beam sampling uses this to span a disc perpendicular to a ray.
    pub fn perpendicular(&self) -> Vector {
        if is_zero(self.x) && is_zero(self.y) {
            Vector::new(1.0, 0.0, 0.0)
        } else {
            Vector::new(-self.y, self.x, 0.0).normalize()
        }
    }
}

impl Sub for Point {
    type Output = Vector;

    fn sub(self, other: Point) -> Vector {
        Vector::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Add<Vector> for Point {
    type Output = Point;

    fn add(self, other: Vector) -> Point {
        Point::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub<Vector> for Point {
    type Output = Point;

    fn sub(self, other: Vector) -> Point {
        Point::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, other: Vector) -> Vector {
        Vector::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Vector {
    type Output = Vector;

    fn sub(self, other: Vector) -> Vector {
        Vector::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Neg for Vector {
    type Output = Vector;

    fn neg(self) -> Vector {
        Vector::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f64> for Vector {
    type Output = Vector;

    fn mul(self, other: f64) -> Vector {
        Vector::new(self.x * other, self.y * other, self.z * other)
    }
}

impl Mul<Vector> for f64 {
    type Output = Vector;

    fn mul(self, other: Vector) -> Vector {
        other * self
    }
}

/* Tests */

#[test]
fn sub_points_gives_vector() {
    let p1 = Point::new(3.0, 2.0, 1.0);
    let p2 = Point::new(5.0, 6.0, 7.0);

    assert_eq!(p1 - p2, Vector::new(-2.0, -4.0, -6.0));
}

#[test]
fn add_vector_to_point() {
    let p = Point::new(3.0, 2.0, 1.0);
    let v = Vector::new(5.0, 6.0, 7.0);

    assert_eq!(p + v, Point::new(8.0, 8.0, 8.0));
    assert_eq!(p - v, Point::new(-2.0, -4.0, -6.0));
}

#[test]
#[should_panic]
fn zero_vector_fails() {
    Vector::new(0.0, 0.0, 0.0);
}

#[test]
#[should_panic]
fn sub_point_from_itself_fails() {
    let p = Point::new(1.0, 2.0, 3.0);
    let _ = p - p;
}

#[test]
fn vector_length() {
    assert_eq!(Vector::new(1.0, 2.0, 3.0).length(), f64::sqrt(14.0));
    assert_eq!(Vector::new(-1.0, -2.0, -3.0).length_squared(), 14.0);
}

#[test]
fn normalize_vector() {
    let v = Vector::new(4.0, 0.0, 0.0);
    assert_eq!(v.normalize(), Vector::new(1.0, 0.0, 0.0));

    let w = Vector::new(1.0, 2.0, 3.0).normalize();
    assert!(feq(w.length(), 1.0));
}

#[test]
fn dot_vectors() {
    let a = Vector::new(1.0, 2.0, 3.0);
    let b = Vector::new(2.0, 3.0, 4.0);

    assert_eq!(a.dot(&b), 20.0);
}

#[test]
fn cross_vectors() {
    let a = Vector::new(1.0, 2.0, 3.0);
    let b = Vector::new(2.0, 3.0, 4.0);

    assert_eq!(a.cross(&b), Vector::new(-1.0, 2.0, -1.0));
    assert_eq!(b.cross(&a), Vector::new(1.0, -2.0, 1.0));
}

#[test]
#[should_panic]
fn cross_parallel_vectors_fails() {
    let a = Vector::new(1.0, 2.0, 3.0);
    let b = Vector::new(2.0, 4.0, 6.0);
    a.cross(&b);
}

#[test]
fn perpendicular_is_orthogonal_unit() {
    for v in [
        Vector::new(0.0, 0.0, 1.0),
        Vector::new(1.0, 2.0, 3.0),
        Vector::new(-0.3, 0.1, 7.0),
    ] {
        let p = v.perpendicular();
        assert!(is_zero(p.dot(&v)));
        assert!(feq(p.length(), 1.0));
    }
}

#[test]
fn point_distance() {
    let p1 = Point::new(1.0, 0.0, 0.0);
    let p2 = Point::new(1.0, 3.0, 4.0);

    assert_eq!(p1.distance(&p2), 5.0);
}

#[test]
fn coincides_is_exact() {
    let p = Point::new(1.0, 0.0, 0.0);
    let q = Point::new(1.0 + 1e-6, 0.0, 0.0);

    // Within PartialEq tolerance, but not coincident.
    assert_eq!(p, q);
    assert!(!p.coincides(&q));
    assert!(p.coincides(&p));
}
