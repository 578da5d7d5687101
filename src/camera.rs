use rand::Rng;

use crate::canvas::Canvas;
use crate::color::Color;
use crate::error::BuildError;
use crate::is_zero;
use crate::ray::Ray;
use crate::tracer::RayTracer;
use crate::tuple::{Point, Vector};

/// Per-pixel anti-aliasing strategy.
#[derive(Copy, Clone, Debug)]
pub enum Sampling {
    /// One ray through the pixel center.
    Single,
    /// A fixed number of uniformly jittered rays per pixel.
    Jittered { samples: usize },
    /// Recursive quadrant subdivision driven by corner-color agreement.
    Adaptive { depth: usize },
}

/// Raw camera description, as read from a scene file or built by hand.
/// Validated and frozen into a [`Camera`] by [`Camera::new`].
pub struct CameraSettings {
    pub position: Point,
    pub to: Vector,
    pub up: Vector,
    pub width: f64,
    pub height: f64,
    pub distance: f64,
    pub image_width: usize,
    pub image_height: usize,
    pub sampling: Sampling,
}

/// A validated pinhole camera with an explicit orthonormal basis.
pub struct Camera {
    position: Point,
    to: Vector,
    up: Vector,
    right: Vector,
    width: f64,
    height: f64,
    distance: f64,
    image_width: usize,
    image_height: usize,
    sampling: Sampling,
}

impl Camera {
    pub fn new(settings: CameraSettings) -> Result<Camera, BuildError> {
        if !is_zero(settings.to.dot(&settings.up)) {
            return Err(BuildError::NonOrthogonalBasis);
        }
        positive(settings.width, "view plane width")?;
        positive(settings.height, "view plane height")?;
        positive(settings.distance, "view plane distance")?;
        positive(settings.image_width as f64, "image width")?;
        positive(settings.image_height as f64, "image height")?;
        match settings.sampling {
            Sampling::Jittered { samples } => positive(samples as f64, "sample count")?,
            Sampling::Adaptive { depth } => positive(depth as f64, "subdivision depth")?,
            Sampling::Single => {}
        }

        let to = settings.to.normalize();
        let up = settings.up.normalize();
        let right = to.cross(&up).normalize();

        Ok(Camera {
            position: settings.position,
            to,
            up,
            right,
            width: settings.width,
            height: settings.height,
            distance: settings.distance,
            image_width: settings.image_width,
            image_height: settings.image_height,
            sampling: settings.sampling,
        })
    }

    pub fn image_width(&self) -> usize {
        self.image_width
    }

    pub fn image_height(&self) -> usize {
        self.image_height
    }

    /// The ray through the center of pixel (col, row) on an nx-by-ny
    /// view plane. Rows count downward from the top of the image.
    pub fn construct_ray(&self, nx: usize, ny: usize, col: usize, row: usize) -> Ray {
        let (xj, yi) = self.pixel_center(nx, ny, col, row);
        self.ray_through(xj, yi)
    }

    fn pixel_center(&self, nx: usize, ny: usize, col: usize, row: usize) -> (f64, f64) {
        let rx = self.width / nx as f64;
        let ry = self.height / ny as f64;
        let xj = (col as f64 - (nx as f64 - 1.0) / 2.0) * rx;
        let yi = -(row as f64 - (ny as f64 - 1.0) / 2.0) * ry;
        (xj, yi)
    }

    /// The ray through view-plane coordinates (xj, yi), measured from
    /// the plane center along `right` and `up`.
    fn ray_through(&self, xj: f64, yi: f64) -> Ray {
        let mut pij = self.position + self.to * self.distance;
        if !is_zero(xj) {
            pij = pij + self.right * xj;
        }
        if !is_zero(yi) {
            pij = pij + self.up * yi;
        }
        Ray::new(self.position, pij - self.position)
    }

    fn sample<R: Rng>(&self, tracer: &RayTracer, xj: f64, yi: f64, rng: &mut R) -> Color {
        tracer.trace_ray(&self.ray_through(xj, yi), rng)
    }

    /// Resolves one pixel with the configured sampling strategy.
    pub fn render_pixel<R: Rng>(
        &self,
        tracer: &RayTracer,
        col: usize,
        row: usize,
        rng: &mut R,
    ) -> Color {
        let (xj, yi) = self.pixel_center(self.image_width, self.image_height, col, row);
        let rx = self.width / self.image_width as f64;
        let ry = self.height / self.image_height as f64;

        match self.sampling {
            Sampling::Single => self.sample(tracer, xj, yi, rng),
            Sampling::Jittered { samples } => {
                let mut color = Color::black();
                for _ in 0..samples {
                    let dx = rng.gen_range(-rx / 2.0..rx / 2.0);
                    let dy = rng.gen_range(-ry / 2.0..ry / 2.0);
                    color = color + self.sample(tracer, xj + dx, yi + dy, rng);
                }
                color.reduce(samples)
            }
            Sampling::Adaptive { depth } => {
                let (x_min, x_max) = (xj - rx / 2.0, xj + rx / 2.0);
                let (y_min, y_max) = (yi - ry / 2.0, yi + ry / 2.0);
                let bl = self.sample(tracer, x_min, y_min, rng);
                let br = self.sample(tracer, x_max, y_min, rng);
                let tl = self.sample(tracer, x_min, y_max, rng);
                let tr = self.sample(tracer, x_max, y_max, rng);
                self.adaptive_quadrant(
                    tracer, x_min, x_max, y_min, y_max, bl, br, tl, tr, depth, rng,
                )
            }
        }
    }

    /// One level of adaptive subdivision. Corner colors are compared
    /// bitwise: only exact agreement stops the recursion early. Shared
    /// edge and center samples are reused by all four child quadrants.
    #[allow(clippy::too_many_arguments)]
    fn adaptive_quadrant<R: Rng>(
        &self,
        tracer: &RayTracer,
        x_min: f64,
        x_max: f64,
        y_min: f64,
        y_max: f64,
        bl: Color,
        br: Color,
        tl: Color,
        tr: Color,
        depth: usize,
        rng: &mut R,
    ) -> Color {
        if depth == 0 || (bl.identical(&br) && bl.identical(&tl) && bl.identical(&tr)) {
            return (bl + br + tl + tr).reduce(4);
        }

        let xm = (x_min + x_max) / 2.0;
        let ym = (y_min + y_max) / 2.0;
        let bottom = self.sample(tracer, xm, y_min, rng);
        let top = self.sample(tracer, xm, y_max, rng);
        let left = self.sample(tracer, x_min, ym, rng);
        let right = self.sample(tracer, x_max, ym, rng);
        let center = self.sample(tracer, xm, ym, rng);

        let q1 = self.adaptive_quadrant(
            tracer, x_min, xm, y_min, ym, bl, bottom, left, center, depth - 1, rng,
        );
        let q2 = self.adaptive_quadrant(
            tracer, xm, x_max, y_min, ym, bottom, br, center, right, depth - 1, rng,
        );
        let q3 = self.adaptive_quadrant(
            tracer, x_min, xm, ym, y_max, left, center, tl, top, depth - 1, rng,
        );
        let q4 = self.adaptive_quadrant(
            tracer, xm, x_max, ym, y_max, center, right, top, tr, depth - 1, rng,
        );

        (q1 + q2 + q3 + q4).reduce(4)
    }

    /// Renders one full image row. The parallel renderer hands rows out
    /// to worker threads one at a time.
    pub fn render_row<R: Rng>(&self, tracer: &RayTracer, row: usize, rng: &mut R) -> Vec<Color> {
        (0..self.image_width)
            .map(|col| self.render_pixel(tracer, col, row, rng))
            .collect()
    }

    pub fn render<R: Rng>(&self, tracer: &RayTracer, rng: &mut R) -> Canvas {
        let mut canvas = Canvas::new(self.image_width, self.image_height);
        for row in 0..self.image_height {
            for (col, color) in self.render_row(tracer, row, rng).into_iter().enumerate() {
                canvas.write_pixel(col, row, color);
            }
        }
        canvas
    }
}

fn positive(value: f64, what: &'static str) -> Result<(), BuildError> {
    if value <= 0.0 {
        Err(BuildError::NonPositive { what, value })
    } else {
        Ok(())
    }
}

/* Tests */

#[cfg(test)]
use crate::scene::Scene;
#[cfg(test)]
use rand::rngs::SmallRng;
#[cfg(test)]
use rand::SeedableRng;

#[cfg(test)]
fn test_camera(to: Vector, up: Vector, sampling: Sampling) -> Camera {
    Camera::new(CameraSettings {
        position: Point::ORIGIN,
        to,
        up,
        width: 8.0,
        height: 8.0,
        distance: 10.0,
        image_width: 4,
        image_height: 4,
        sampling,
    })
    .unwrap()
}

#[cfg(test)]
fn rng() -> SmallRng {
    SmallRng::seed_from_u64(29)
}

#[test]
fn ray_through_an_off_center_pixel() {
    let camera = test_camera(
        Vector::new(0.0, 0.0, -1.0),
        Vector::new(0.0, -1.0, 0.0),
        Sampling::Single,
    );

    let ray = camera.construct_ray(4, 4, 1, 1);
    assert_eq!(ray.origin, Point::ORIGIN);
    assert_eq!(ray.direction, Vector::new(1.0, -1.0, -10.0).normalize());
}

#[test]
fn ray_through_a_corner_pixel() {
    let camera = test_camera(
        Vector::new(0.0, 0.0, -1.0),
        Vector::new(0.0, -1.0, 0.0),
        Sampling::Single,
    );

    let ray = camera.construct_ray(4, 4, 0, 0);
    assert_eq!(ray.direction, Vector::new(3.0, -3.0, -10.0).normalize());
}

#[test]
fn center_pixel_looks_straight_ahead() {
    // Odd-by-odd grid: the middle pixel's ray is exactly `to`.
    let camera = test_camera(
        Vector::new(0.0, 0.0, -1.0),
        Vector::new(0.0, 1.0, 0.0),
        Sampling::Single,
    );

    let ray = camera.construct_ray(3, 3, 1, 1);
    assert_eq!(ray.direction, Vector::new(0.0, 0.0, -1.0));
}

#[test]
fn basis_is_orthonormal() {
    let camera = test_camera(
        Vector::new(0.0, 0.0, -1.0),
        Vector::new(0.0, 1.0, 0.0),
        Sampling::Single,
    );

    assert_eq!(camera.right, Vector::new(1.0, 0.0, 0.0));
    assert!(crate::is_zero(camera.right.dot(&camera.to)));
    assert!(crate::is_zero(camera.right.dot(&camera.up)));
}

#[test]
fn rejects_a_skewed_basis() {
    let result = Camera::new(CameraSettings {
        position: Point::ORIGIN,
        to: Vector::new(0.0, 0.0, -1.0),
        up: Vector::new(0.0, 1.0, -1.0),
        width: 2.0,
        height: 2.0,
        distance: 1.0,
        image_width: 10,
        image_height: 10,
        sampling: Sampling::Single,
    });
    assert!(matches!(result, Err(BuildError::NonOrthogonalBasis)));
}

#[test]
fn rejects_a_degenerate_view_plane() {
    let result = Camera::new(CameraSettings {
        position: Point::ORIGIN,
        to: Vector::new(0.0, 0.0, -1.0),
        up: Vector::new(0.0, 1.0, 0.0),
        width: 0.0,
        height: 2.0,
        distance: 1.0,
        image_width: 10,
        image_height: 10,
        sampling: Sampling::Single,
    });
    assert!(matches!(
        result,
        Err(BuildError::NonPositive { what: "view plane width", .. })
    ));
}

#[cfg(test)]
fn half_covered_pixel(sampling: Sampling) -> Color {
    // One pixel spanning view-plane x in [-1, 1]; a huge emissive
    // triangle at z = -2 covers everything right of x = 0.4 there, so the
    // edge crosses the pixel at view-plane x = 0.2. 40% of the pixel is
    // red, but the center sample is black.
    let scene = Scene::new().with_shape(
        crate::shape::Shape::triangle(
            Point::new(0.4, -1000.0, -2.0),
            Point::new(1000.0, -1000.0, -2.0),
            Point::new(0.4, 1000.0, -2.0),
        )
        .unwrap()
        .with_emission(Color::rgb(1.0, 0.0, 0.0)),
    );
    let tracer = RayTracer::new(&scene);

    let camera = Camera::new(CameraSettings {
        position: Point::ORIGIN,
        to: Vector::new(0.0, 0.0, -1.0),
        up: Vector::new(0.0, 1.0, 0.0),
        width: 2.0,
        height: 2.0,
        distance: 1.0,
        image_width: 1,
        image_height: 1,
        sampling,
    })
    .unwrap();

    camera.render(&tracer, &mut rng()).read_pixel(0, 0).unwrap()
}

#[test]
fn adaptive_sampling_refines_across_an_edge() {
    // The center ray misses the triangle entirely.
    assert_eq!(half_covered_pixel(Sampling::Single), Color::black());

    // Depth 1: the corners disagree, each quadrant averages its own four
    // corners, and the two right quadrants come out half red.
    assert_eq!(
        half_covered_pixel(Sampling::Adaptive { depth: 1 }),
        Color::rgb(0.25, 0.0, 0.0)
    );

    // Depth 2: only the quadrants straddling the edge subdivide again
    // (the all-black and all-red ones accept on exact corner equality),
    // moving the estimate toward the true 40% coverage.
    assert_eq!(
        half_covered_pixel(Sampling::Adaptive { depth: 2 }),
        Color::rgb(0.375, 0.0, 0.0)
    );
}

#[test]
fn every_sampling_mode_agrees_on_a_uniform_background() {
    let scene = Scene::new().with_background(Color::rgb(0.2, 0.4, 0.6));
    let tracer = RayTracer::new(&scene);

    for sampling in [
        Sampling::Single,
        Sampling::Jittered { samples: 8 },
        Sampling::Adaptive { depth: 3 },
    ] {
        let camera = test_camera(
            Vector::new(0.0, 0.0, -1.0),
            Vector::new(0.0, 1.0, 0.0),
            sampling,
        );
        let canvas = camera.render(&tracer, &mut rng());
        for row in 0..camera.image_height() {
            for col in 0..camera.image_width() {
                assert_eq!(canvas.read_pixel(col, row), Some(Color::rgb(0.2, 0.4, 0.6)));
            }
        }
    }
}
