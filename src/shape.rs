use crate::align_zero;
use crate::color::Color;
use crate::error::BuildError;
use crate::is_zero;
use crate::material::Material;
use crate::ray::Ray;
use crate::tuple::{Point, Vector};

/// A hit record: the shape that was hit and the surface point.
#[derive(Copy, Clone, Debug)]
pub struct Hit<'a> {
    pub shape: &'a Shape,
    pub point: Point,
}

/// Two hits are equal when they reference the *same* shape and their
/// points agree within tolerance.
impl<'a> PartialEq for Hit<'a> {
    fn eq(&self, other: &Hit<'a>) -> bool {
        std::ptr::eq(self.shape, other.shape) && self.point == other.point
    }
}

/// The closed set of geometry primitives.
///
/// Shared behavior lives in `Shape`; per-kind intersection and normal
/// math is dispatched with a `match` below.
#[derive(Clone, Debug, PartialEq)]
pub enum ShapeKind {
    /// An infinite plane through `q` with unit normal `normal`.
    Plane { q: Point, normal: Vector },
    Sphere { center: Point, radius: f64 },
    /// A triangle carrying the unit normal of its supporting plane.
    Triangle { p1: Point, p2: Point, p3: Point, normal: Vector },
    /// An infinite cylinder around `axis`. Not intersectable; only its
    /// surface normal is defined.
    Tube { axis: Ray, radius: f64 },
    /// A finite tube: `axis.origin` is the near-cap center, the far cap
    /// sits `height` along the axis.
    Cylinder { axis: Ray, radius: f64, height: f64 },
}

/// A geometry primitive with its emission color and material.
#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    pub kind: ShapeKind,
    pub emission: Color,
    pub material: Material,
}

impl Shape {
    fn from_kind(kind: ShapeKind) -> Shape {
        Shape {
            kind,
            emission: Color::black(),
            material: Default::default(),
        }
    }

    pub fn plane(q: Point, normal: Vector) -> Shape {
        Shape::from_kind(ShapeKind::Plane { q, normal: normal.normalize() })
    }

    /// A plane through three points; the first becomes the reference
    /// point. Fails when the points are collinear.
    pub fn plane_from_points(p1: Point, p2: Point, p3: Point) -> Result<Shape, BuildError> {
        let normal = spanning_normal(p1, p2, p3)?;
        Ok(Shape::plane(p1, normal))
    }

    pub fn sphere(center: Point, radius: f64) -> Result<Shape, BuildError> {
        if radius <= 0.0 {
            return Err(BuildError::NonPositive { what: "sphere radius", value: radius });
        }
        Ok(Shape::from_kind(ShapeKind::Sphere { center, radius }))
    }

    pub fn triangle(p1: Point, p2: Point, p3: Point) -> Result<Shape, BuildError> {
        let normal = spanning_normal(p1, p2, p3)?;
        Ok(Shape::from_kind(ShapeKind::Triangle { p1, p2, p3, normal }))
    }

    pub fn tube(axis: Ray, radius: f64) -> Result<Shape, BuildError> {
        if radius <= 0.0 {
            return Err(BuildError::NonPositive { what: "tube radius", value: radius });
        }
        Ok(Shape::from_kind(ShapeKind::Tube { axis, radius }))
    }

    pub fn cylinder(axis: Ray, radius: f64, height: f64) -> Result<Shape, BuildError> {
        if radius <= 0.0 {
            return Err(BuildError::NonPositive { what: "cylinder radius", value: radius });
        }
        if height <= 0.0 {
            return Err(BuildError::NonPositive { what: "cylinder height", value: height });
        }
        Ok(Shape::from_kind(ShapeKind::Cylinder { axis, radius, height }))
    }

    pub fn with_emission(mut self, emission: Color) -> Shape {
        self.emission = emission;
        self
    }

    pub fn with_material(mut self, material: Material) -> Shape {
        self.material = material;
        self
    }

    /// The unit surface normal at a point assumed to lie on the shape.
    pub fn normal_at(&self, p: Point) -> Vector {
        match &self.kind {
            ShapeKind::Plane { normal, .. } => *normal,

            ShapeKind::Sphere { center, .. } => (p - *center).normalize(),

            ShapeKind::Triangle { normal, .. } => *normal,

            ShapeKind::Tube { axis, .. } => tube_normal(axis, p),

            ShapeKind::Cylinder { axis, height, .. } => {
                if p.coincides(&axis.origin) {
                    return -axis.direction;
                }
                let t = axis.direction.dot(&(p - axis.origin));
                if is_zero(t) {
                    -axis.direction
                } else if is_zero(t - height) {
                    axis.direction
                } else {
                    tube_normal(axis, p)
                }
            }
        }
    }

    /// All intersections of a ray with this shape, ordered by distance
    /// along the ray. An empty vector means no hit.
    pub fn intersect(&self, ray: &Ray) -> Vec<Hit<'_>> {
        match &self.kind {
            ShapeKind::Plane { q, normal } => plane_hit(*q, normal, ray)
                .map(|point| vec![Hit { shape: self, point }])
                .unwrap_or_default(),

            ShapeKind::Sphere { center, radius } => self.intersect_sphere(center, *radius, ray),

            ShapeKind::Triangle { p1, p2, p3, normal } => {
                self.intersect_triangle(*p1, *p2, *p3, normal, ray)
            }

            // The unbounded tube (and the finite cylinder built on it)
            // is not intersectable.
            ShapeKind::Tube { .. } | ShapeKind::Cylinder { .. } => Vec::new(),
        }
    }

    fn intersect_sphere(&self, center: &Point, radius: f64, ray: &Ray) -> Vec<Hit<'_>> {
        let p0 = ray.origin;
        let v = ray.direction;

        // A ray from the center exits radially.
        if p0.coincides(center) {
            return vec![Hit { shape: self, point: *center + v * radius }];
        }

        let u = *center - p0;
        let tm = align_zero(v.dot(&u));
        let d = align_zero((u.length_squared() - tm * tm).max(0.0).sqrt());

        // The ray's line passes outside (or tangent to) the sphere.
        if d >= radius {
            return Vec::new();
        }

        let th = align_zero((radius * radius - d * d).sqrt());
        let t1 = align_zero(tm - th);
        let t2 = align_zero(tm + th);

        let mut hits = Vec::new();
        if t1 > 0.0 {
            hits.push(Hit { shape: self, point: ray.position(t1) });
        }
        if t2 > 0.0 {
            hits.push(Hit { shape: self, point: ray.position(t2) });
        }
        hits
    }

    fn intersect_triangle(
        &self,
        p1: Point,
        p2: Point,
        p3: Point,
        normal: &Vector,
        ray: &Ray,
    ) -> Vec<Hit<'_>> {
        // The supporting plane goes through p1.
        let point = match plane_hit(p1, normal, ray) {
            Some(point) => point,
            None => return Vec::new(),
        };

        let p0 = ray.origin;
        let v = ray.direction;

        let v1 = p1 - p0;
        let v2 = p2 - p0;
        let v3 = p3 - p0;

        let s1 = align_zero(v1.cross(&v2).dot(&v));
        let s2 = align_zero(v2.cross(&v3).dot(&v));
        let s3 = align_zero(v3.cross(&v1).dot(&v));

        // Strictly inside requires all three signed terms to agree; a
        // zero term means the ray grazes an edge or vertex, which counts
        // as a miss.
        if (s1 > 0.0 && s2 > 0.0 && s3 > 0.0) || (s1 < 0.0 && s2 < 0.0 && s3 < 0.0) {
            vec![Hit { shape: self, point }]
        } else {
            Vec::new()
        }
    }
}

/// Intersects a ray with the plane through `q` with unit normal `normal`.
fn plane_hit(q: Point, normal: &Vector, ray: &Ray) -> Option<Point> {
    let p0 = ray.origin;
    let v = ray.direction;

    // A ray starting at the reference point has no well-defined hit.
    if p0.coincides(&q) {
        return None;
    }

    let nv = align_zero(normal.dot(&v));
    if nv == 0.0 {
        return None; // parallel to the plane
    }

    let t = align_zero(normal.dot(&(q - p0)) / nv);
    if t <= 0.0 {
        return None;
    }

    Some(ray.position(t))
}

/// Side-surface normal of the (possibly infinite) tube around `axis`.
fn tube_normal(axis: &Ray, p: Point) -> Vector {
    let head_p = p - axis.origin;
    let w = axis.direction.dot(&head_p);

    if is_zero(w) {
        // The foot of the perpendicular is the axis head itself.
        return head_p.normalize();
    }

    let foot = axis.origin + axis.direction * w;
    (p - foot).normalize()
}

/// Unit normal of the plane spanned by three points, or an error when
/// they are collinear (or not distinct).
fn spanning_normal(p1: Point, p2: Point, p3: Point) -> Result<Vector, BuildError> {
    let (ux, uy, uz) = (p2.x - p1.x, p2.y - p1.y, p2.z - p1.z);
    let (vx, vy, vz) = (p3.x - p1.x, p3.y - p1.y, p3.z - p1.z);

    let cx = uy * vz - uz * vy;
    let cy = uz * vx - ux * vz;
    let cz = ux * vy - uy * vx;

    if is_zero(cx * cx + cy * cy + cz * cz) {
        return Err(BuildError::DegenerateTriangle);
    }

    Ok(Vector::new(cx, cy, cz).normalize())
}

/// One entry of a [`Geometries`] aggregate.
#[derive(Clone, Debug)]
enum Node {
    Shape(Shape),
    Group(Geometries),
}

/// An ordered collection of shapes and nested collections.
///
/// Intersection queries fan out over every child (recursively for nested
/// groups) and concatenate the results in traversal order.
#[derive(Clone, Debug, Default)]
pub struct Geometries {
    children: Vec<Node>,
}

impl Geometries {
    pub fn new() -> Geometries {
        Default::default()
    }

    pub fn push(&mut self, shape: Shape) {
        self.children.push(Node::Shape(shape));
    }

    pub fn push_group(&mut self, group: Geometries) {
        self.children.push(Node::Group(group));
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of direct children (nested groups count as one).
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn intersect(&self, ray: &Ray) -> Vec<Hit<'_>> {
        let mut hits = Vec::new();
        for child in &self.children {
            match child {
                Node::Shape(shape) => hits.extend(shape.intersect(ray)),
                Node::Group(group) => hits.extend(group.intersect(ray)),
            }
        }
        hits
    }
}

impl FromIterator<Shape> for Geometries {
    fn from_iter<I: IntoIterator<Item = Shape>>(iter: I) -> Geometries {
        Geometries { children: iter.into_iter().map(Node::Shape).collect() }
    }
}

/* Tests */

#[cfg(test)]
fn unit_sphere_at(x: f64, y: f64, z: f64) -> Shape {
    Shape::sphere(Point::new(x, y, z), 1.0).unwrap()
}

#[test]
fn sphere_normal_is_radial_unit() {
    use crate::feq;

    let s = Shape::sphere(Point::new(1.0, 2.0, 3.0), 1.0).unwrap();
    let n = s.normal_at(Point::new(2.0, 2.0, 3.0));

    assert_eq!(n, Vector::new(1.0, 0.0, 0.0));
    assert!(feq(n.length(), 1.0));
}

#[test]
fn plane_normal_is_constant_and_orthogonal() {
    let p1 = Point::new(0.0, 0.0, 0.0);
    let p2 = Point::new(1.0, 0.0, 0.0);
    let p3 = Point::new(0.0, 1.0, 0.0);
    let plane = Shape::plane_from_points(p1, p2, p3).unwrap();

    let n = plane.normal_at(Point::new(5.0, -3.0, 0.0));
    assert_eq!(n, plane.normal_at(Point::new(-2.0, 7.0, 0.0)));

    assert!(is_zero(n.dot(&(p2 - p1))));
    assert!(is_zero(n.dot(&(p3 - p1))));
}

#[test]
fn degenerate_construction_fails() {
    let a = Point::new(0.0, 0.0, 0.0);
    let b = Point::new(1.0, 1.0, 1.0);
    let c = Point::new(2.0, 2.0, 2.0);

    assert!(matches!(
        Shape::triangle(a, b, c),
        Err(BuildError::DegenerateTriangle)
    ));
    assert!(Shape::plane_from_points(a, b, b).is_err());
    assert!(Shape::sphere(a, 0.0).is_err());
    assert!(Shape::sphere(a, -1.0).is_err());

    let axis = Ray::new(a, Vector::new(0.0, 1.0, 0.0));
    assert!(Shape::tube(axis, -0.5).is_err());
    assert!(Shape::cylinder(axis, 1.0, 0.0).is_err());
}

#[test]
fn sphere_intersections_two_points_ordered() {
    let s = unit_sphere_at(1.0, 0.0, 0.0);
    let r = Ray::new(Point::new(-1.0, 0.0, 0.0), Vector::new(3.0, 1.0, 0.0));

    let hits = s.intersect(&r);
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].point, Point::new(0.0652, 0.3551, 0.0));
    assert_eq!(hits[1].point, Point::new(1.5348, 0.8449, 0.0));
}

#[test]
fn sphere_line_outside_misses() {
    let s = unit_sphere_at(1.0, 0.0, 0.0);
    let r = Ray::new(Point::new(-1.0, 0.0, 0.0), Vector::new(0.0, 0.0, 1.0));

    assert!(s.intersect(&r).is_empty());
}

#[test]
fn sphere_tangent_counts_as_miss() {
    let s = unit_sphere_at(1.0, 0.0, 0.0);
    let r = Ray::new(Point::new(-1.0, 1.0, 0.0), Vector::new(1.0, 0.0, 0.0));

    assert!(s.intersect(&r).is_empty());
}

#[test]
fn sphere_ray_from_inside_hits_once() {
    let s = unit_sphere_at(1.0, 0.0, 0.0);
    let r = Ray::new(Point::new(1.0, 0.5, 0.0), Vector::new(1.0, 0.0, 0.0));

    let hits = s.intersect(&r);
    assert_eq!(hits.len(), 1);
    assert!(hits[0].point.x > 1.0);
}

#[test]
fn sphere_behind_ray_misses() {
    let s = unit_sphere_at(1.0, 0.0, 0.0);
    let r = Ray::new(Point::new(3.0, 0.0, 0.0), Vector::new(1.0, 0.0, 0.0));

    assert!(s.intersect(&r).is_empty());
}

#[test]
fn sphere_ray_from_center_exits_radially() {
    let s = unit_sphere_at(1.0, 0.0, 0.0);
    let r = Ray::new(Point::new(1.0, 0.0, 0.0), Vector::new(0.0, 1.0, 0.0));

    let hits = s.intersect(&r);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].point, Point::new(1.0, 1.0, 0.0));
}

#[cfg(test)]
fn test_triangle() -> Shape {
    Shape::triangle(
        Point::new(0.0, 0.0, 0.0),
        Point::new(2.0, 0.0, 0.0),
        Point::new(0.0, 2.0, 0.0),
    )
    .unwrap()
}

#[test]
fn triangle_interior_hit() {
    let t = test_triangle();
    let r = Ray::new(Point::new(0.5, 0.5, -1.0), Vector::new(0.0, 0.0, 1.0));

    let hits = t.intersect(&r);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].point, Point::new(0.5, 0.5, 0.0));
}

#[test]
fn triangle_edge_and_vertex_are_misses() {
    let t = test_triangle();

    // Straight at the middle of an edge.
    let edge = Ray::new(Point::new(1.0, 0.0, -1.0), Vector::new(0.0, 0.0, 1.0));
    assert!(t.intersect(&edge).is_empty());

    // Straight at a vertex.
    let vertex = Ray::new(Point::new(0.0, 2.0, -1.0), Vector::new(0.0, 0.0, 1.0));
    assert!(t.intersect(&vertex).is_empty());
}

#[test]
fn triangle_outside_plane_hit_is_miss() {
    let t = test_triangle();
    let r = Ray::new(Point::new(3.0, 3.0, -1.0), Vector::new(0.0, 0.0, 1.0));

    assert!(t.intersect(&r).is_empty());
}

#[test]
fn plane_parallel_and_origin_cases() {
    let plane = Shape::plane(Point::ORIGIN, Vector::new(0.0, 0.0, 1.0));

    // Parallel ray.
    let parallel = Ray::new(Point::new(0.0, 0.0, -1.0), Vector::new(1.0, 0.0, 0.0));
    assert!(plane.intersect(&parallel).is_empty());

    // Ray starting at the reference point.
    let at_q = Ray::new(Point::ORIGIN, Vector::new(0.0, 0.0, 1.0));
    assert!(plane.intersect(&at_q).is_empty());

    // Plane behind the ray.
    let behind = Ray::new(Point::new(0.0, 0.0, 1.0), Vector::new(0.0, 0.0, 1.0));
    assert!(plane.intersect(&behind).is_empty());

    // Plain hit.
    let towards = Ray::new(Point::new(1.0, 2.0, -3.0), Vector::new(0.0, 0.0, 1.0));
    let hits = plane.intersect(&towards);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].point, Point::new(1.0, 2.0, 0.0));
}

#[test]
fn tube_side_normal() {
    let axis = Ray::new(Point::ORIGIN, Vector::new(0.0, 0.0, 1.0));
    let tube = Shape::tube(axis, 1.0).unwrap();

    assert_eq!(tube.normal_at(Point::new(0.0, 1.0, 5.0)), Vector::new(0.0, 1.0, 0.0));

    // Point perpendicular to the axis head: the foot is the head itself.
    assert_eq!(tube.normal_at(Point::new(1.0, 0.0, 0.0)), Vector::new(1.0, 0.0, 0.0));

    // Tube rays are not intersectable.
    let r = Ray::new(Point::new(-5.0, 0.0, 0.0), Vector::new(1.0, 0.0, 0.0));
    assert!(tube.intersect(&r).is_empty());
}

#[test]
fn cylinder_normals_by_region() {
    let axis = Ray::new(Point::ORIGIN, Vector::new(0.0, 1.0, 0.0));
    let cyl = Shape::cylinder(axis, 1.0, 2.0).unwrap();

    // Side.
    assert_eq!(cyl.normal_at(Point::new(1.0, 1.0, 0.0)), Vector::new(1.0, 0.0, 0.0));
    // Near cap (and the axis head itself).
    assert_eq!(cyl.normal_at(Point::new(0.5, 0.0, 0.0)), Vector::new(0.0, -1.0, 0.0));
    assert_eq!(cyl.normal_at(Point::ORIGIN), Vector::new(0.0, -1.0, 0.0));
    // Far cap.
    assert_eq!(cyl.normal_at(Point::new(0.5, 2.0, 0.0)), Vector::new(0.0, 1.0, 0.0));
}

#[test]
fn empty_aggregate_has_no_hits() {
    let g = Geometries::new();
    let r = Ray::new(Point::ORIGIN, Vector::new(1.0, 0.0, 0.0));

    assert!(g.is_empty());
    assert!(g.intersect(&r).is_empty());
}

#[test]
fn aggregate_hits_are_the_sum_of_children() {
    let sphere = unit_sphere_at(3.0, 0.0, 0.0);
    let plane = Shape::plane(Point::new(10.0, 0.0, 0.0), Vector::new(1.0, 0.0, 0.0));
    let triangle = test_triangle();

    let r = Ray::new(Point::new(-1.0, 0.1, 0.0), Vector::new(1.0, 0.0, 0.0));

    let expected = sphere.intersect(&r).len()
        + plane.intersect(&r).len()
        + triangle.intersect(&r).len();
    assert_eq!(expected, 3); // two on the sphere, one on the plane

    let g: Geometries = [sphere, plane, triangle].into_iter().collect();
    assert_eq!(g.intersect(&r).len(), expected);
}

#[test]
fn nested_groups_are_traversed() {
    let mut inner = Geometries::new();
    inner.push(unit_sphere_at(3.0, 0.0, 0.0));

    let mut outer = Geometries::new();
    outer.push(Shape::plane(Point::new(10.0, 0.0, 0.0), Vector::new(1.0, 0.0, 0.0)));
    outer.push_group(inner);

    let r = Ray::new(Point::new(-1.0, 0.0, 0.0), Vector::new(1.0, 0.0, 0.0));
    assert_eq!(outer.intersect(&r).len(), 3);
    assert_eq!(outer.len(), 2);
}
