use rand::Rng;

use crate::consts::DELTA;
use crate::shape::Hit;
use crate::tuple::{Point, Vector};
use crate::{align_zero, is_zero};

/// A ray: an origin and a unit direction.
///
/// The direction is normalized on construction and never mutated.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ray {
    pub origin: Point,
    pub direction: Vector,
}

impl Ray {
    pub fn new(origin: Point, direction: Vector) -> Ray {
        Ray { origin, direction: direction.normalize() }
    }

    /// Creates a ray whose origin is nudged by `DELTA` along the surface
    /// normal, on the side the direction leaves through. Rays spawned
    /// from a hit point (shadow, reflection, refraction rays) use this to
    /// avoid re-intersecting the surface they started on.
    pub fn offset(origin: Point, direction: Vector, normal: &Vector) -> Ray {
        let sign = if normal.dot(&direction) > 0.0 { DELTA } else { -DELTA };
        Ray::new(origin + *normal * sign, direction)
    }

    /// The point at parametric distance `t` along the ray.
    pub fn position(&self, t: f64) -> Point {
        if is_zero(t) {
            self.origin
        } else {
            self.origin + self.direction * t
        }
    }

    /// Selects the hit closest to this ray's origin. Ties keep the first
    /// hit encountered.
    pub fn closest<'a>(&self, hits: Vec<Hit<'a>>) -> Option<Hit<'a>> {
        let mut best = None;
        let mut best_distance = f64::INFINITY;

        for hit in hits {
            let distance = self.origin.distance(&hit.point);
            if distance < best_distance {
                best_distance = distance;
                best = Some(hit);
            }
        }

        best
    }

    /// Expands this ray into a glossy bundle.
    ///
    /// Perturbed rays aim at points sampled on a disc of shrinking radius,
    /// centered `distance` along this ray. Samples that would exit on the
    /// wrong side of the surface normal are discarded, so the bundle has
    /// at most `count` rays. The primary ray is always the first entry.
    pub fn beam<R: Rng>(
        &self,
        normal: &Vector,
        mut radius: f64,
        distance: f64,
        count: usize,
        rng: &mut R,
    ) -> Vec<Ray> {
        let mut rays = vec![*self];
        if count <= 1 || is_zero(radius) {
            return rays;
        }

        // Disc axes perpendicular to the ray.
        let nx = self.direction.perpendicular();
        let ny = self.direction.cross(&nx);

        let center = self.position(distance);
        let shrink = radius / (count - 1) as f64;
        let nv = normal.dot(&self.direction);

        for _ in 1..count {
            let x = rng.gen_range(-radius..=radius);
            let y = (radius * radius - x * x).sqrt();
            let y = if rng.gen::<bool>() { y } else { -y };

            let mut sample = center;
            if !is_zero(x) {
                sample = sample + nx * x;
            }
            if !is_zero(y) {
                sample = sample + ny * y;
            }

            if !sample.coincides(&self.origin) {
                let direction = (sample - self.origin).normalize();
                let nt = align_zero(normal.dot(&direction));

                // Keep only samples leaving on the same side as the
                // primary ray.
                if nv * nt > 0.0 {
                    rays.push(Ray::new(self.origin, direction));
                }
            }

            radius -= shrink;
        }

        rays
    }
}

/* Tests */

#[test]
fn ray_direction_is_normalized() {
    let r = Ray::new(Point::ORIGIN, Vector::new(0.0, 3.0, 4.0));

    assert_eq!(r.direction, Vector::new(0.0, 0.6, 0.8));
}

#[test]
fn ray_position() {
    let r = Ray::new(Point::new(2.0, 3.0, 4.0), Vector::new(1.0, 0.0, 0.0));

    assert_eq!(r.position(0.0), Point::new(2.0, 3.0, 4.0));
    assert_eq!(r.position(1.0), Point::new(3.0, 3.0, 4.0));
    assert_eq!(r.position(-1.0), Point::new(1.0, 3.0, 4.0));
    assert_eq!(r.position(2.5), Point::new(4.5, 3.0, 4.0));
}

#[test]
fn offset_moves_origin_along_normal() {
    let normal = Vector::new(0.0, 1.0, 0.0);

    // Direction leaving through the normal's side: offset is +DELTA.
    let up = Ray::offset(Point::ORIGIN, Vector::new(0.0, 1.0, 0.0), &normal);
    assert!(up.origin.y > 0.0);

    // Direction leaving through the other side: offset is -DELTA.
    let down = Ray::offset(Point::ORIGIN, Vector::new(0.0, -1.0, 0.0), &normal);
    assert!(down.origin.y < 0.0);
}

#[test]
fn closest_picks_minimum_distance() {
    use crate::shape::Shape;

    let sphere = Shape::sphere(Point::ORIGIN, 1.0).unwrap();
    let r = Ray::new(Point::new(-5.0, 0.0, 0.0), Vector::new(1.0, 0.0, 0.0));

    let far = Hit { shape: &sphere, point: Point::new(1.0, 0.0, 0.0) };
    let near = Hit { shape: &sphere, point: Point::new(-1.0, 0.0, 0.0) };

    assert_eq!(r.closest(vec![far, near]), Some(near));
    assert_eq!(r.closest(Vec::new()), None);
}

#[test]
fn beam_without_blur_is_just_the_primary_ray() {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    let mut rng = SmallRng::seed_from_u64(7);
    let r = Ray::new(Point::ORIGIN, Vector::new(0.0, 0.0, -1.0));
    let n = Vector::new(0.0, 0.0, 1.0);

    assert_eq!(r.beam(&n, 0.0, 10.0, 8, &mut rng), vec![r]);
    assert_eq!(r.beam(&n, 0.5, 10.0, 1, &mut rng), vec![r]);
}

#[test]
fn beam_rays_stay_on_the_primary_side() {
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    let mut rng = SmallRng::seed_from_u64(42);
    let r = Ray::new(Point::ORIGIN, Vector::new(0.0, 0.0, -1.0));
    let n = Vector::new(0.3, 0.1, 1.0).normalize();

    let rays = r.beam(&n, 0.5, 5.0, 16, &mut rng);
    assert!(!rays.is_empty() && rays.len() <= 16);
    assert_eq!(rays[0], r);

    let nv = n.dot(&r.direction);
    for ray in &rays {
        assert_eq!(ray.origin, r.origin);
        assert!(nv * n.dot(&ray.direction) > 0.0);
    }
}
