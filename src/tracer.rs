use rand::Rng;

use crate::align_zero;
use crate::color::{Color, Triple};
use crate::consts::{MAX_CALC_COLOR_LEVEL, MIN_CALC_COLOR_K};
use crate::material::Material;
use crate::ray::Ray;
use crate::scene::Scene;
use crate::shape::Hit;
use crate::tuple::Vector;

/// The recursive shading engine.
///
/// Resolves a color per ray by combining local Phong illumination with
/// recursively traced reflection and refraction rays. Recursion stops at
/// `max_level` bounces, or earlier on any branch whose accumulated weight
/// falls below `min_k`.
pub struct RayTracer<'a> {
    scene: &'a Scene,
    pub max_level: usize,
    pub min_k: f64,
}

impl<'a> RayTracer<'a> {
    pub fn new(scene: &'a Scene) -> RayTracer<'a> {
        RayTracer {
            scene,
            max_level: MAX_CALC_COLOR_LEVEL,
            min_k: MIN_CALC_COLOR_K,
        }
    }

    /// Resolves the color seen along a ray.
    ///
    /// Rays that miss all geometry see the scene background; everything
    /// else gets the ambient light plus the full recursive shading
    /// result.
    pub fn trace_ray<R: Rng>(&self, ray: &Ray, rng: &mut R) -> Color {
        match self.find_closest(ray) {
            None => self.scene.background,
            Some(hit) => {
                self.scene.ambient + self.calc_color(hit, ray, self.max_level, Triple::ONE, rng)
            }
        }
    }

    fn find_closest(&self, ray: &Ray) -> Option<Hit<'a>> {
        ray.closest(self.scene.geometries.intersect(ray))
    }

    fn calc_color<R: Rng>(
        &self,
        hit: Hit<'a>,
        ray: &Ray,
        level: usize,
        k: Triple,
        rng: &mut R,
    ) -> Color {
        let v = ray.direction;
        let n = hit.shape.normal_at(hit.point);

        // Grazing incidence: no well-defined shading.
        if align_zero(v.dot(&n)) == 0.0 {
            return Color::black();
        }

        // A budget of 1 (or 0) is exhausted: local contribution only.
        let color = self.local_effects(hit, ray, k) + hit.shape.emission;
        if level <= 1 {
            color
        } else {
            color + self.global_effects(hit, &v, &n, level, k, rng)
        }
    }

    /// Phong diffuse and specular contributions of every light source,
    /// attenuated by shadow transparency.
    fn local_effects(&self, hit: Hit<'a>, ray: &Ray, k: Triple) -> Color {
        let material = &hit.shape.material;
        let n = hit.shape.normal_at(hit.point);
        let nv = align_zero(n.dot(&ray.direction));

        let mut color = Color::black();
        for light in &self.scene.lights {
            let l = light.direction_to(&hit.point);
            let nl = align_zero(n.dot(&l));

            // Light and viewer must be on the same side of the surface.
            if nl * nv <= 0.0 {
                continue;
            }

            let ktr = self.transparency(hit, light, &l, &n);
            if ktr.product(k).lower_than(self.min_k) {
                continue;
            }

            let intensity = light.intensity_at(&hit.point).scaled(ktr);
            color = color
                + diffuse(material.kd, nl, intensity)
                + specular(material, &l, &n, nl, &ray.direction, intensity);
        }
        color
    }

    /// Accumulated transparency along the shadow ray from a hit point
    /// toward a light: the product of every blocker's kT, zero once the
    /// product drops below `min_k`.
    fn transparency(
        &self,
        hit: Hit<'a>,
        light: &crate::light::Light,
        l: &Vector,
        n: &Vector,
    ) -> Triple {
        let shadow_ray = Ray::offset(hit.point, -*l, n);
        let light_distance = light.distance_to(&hit.point);

        let mut ktr = Triple::ONE;
        for blocker in self.scene.geometries.intersect(&shadow_ray) {
            // Only blockers between the point and the light count.
            if align_zero(blocker.point.distance(&hit.point) - light_distance) <= 0.0 {
                ktr = ktr.product(blocker.shape.material.kt);
                if ktr.lower_than(self.min_k) {
                    return Triple::ZERO;
                }
            }
        }
        ktr
    }

    /// Reflected and refracted contributions, each weighted by its
    /// material coefficient and pruned when the accumulated weight falls
    /// below `min_k`.
    fn global_effects<R: Rng>(
        &self,
        hit: Hit<'a>,
        v: &Vector,
        n: &Vector,
        level: usize,
        k: Triple,
        rng: &mut R,
    ) -> Color {
        let material = &hit.shape.material;
        let vn = v.dot(n);

        let reflected = Ray::offset(hit.point, *v - *n * (2.0 * vn), n);
        // Refraction is a straight-through approximation: same direction,
        // origin nudged to the other side of the surface.
        let refracted = Ray::offset(hit.point, *v, n);

        let mut color = Color::black();

        let kkr = k.product(material.kr);
        if !kkr.lower_than(self.min_k) {
            color = color + self.global_effect(material, &reflected, level - 1, material.kr, kkr, rng);
        }

        let kkt = k.product(material.kt);
        if !kkt.lower_than(self.min_k) {
            color = color + self.global_effect(material, &refracted, level - 1, material.kt, kkt, rng);
        }

        color
    }

    /// Traces one global (reflected or refracted) ray, expanding it into
    /// a glossy beam when the material asks for one.
    fn global_effect<R: Rng>(
        &self,
        material: &Material,
        ray: &Ray,
        level: usize,
        coefficient: Triple,
        kk: Triple,
        rng: &mut R,
    ) -> Color {
        let hit = match self.find_closest(ray) {
            None => return self.scene.background.scaled(kk),
            Some(hit) => hit,
        };

        let n = hit.shape.normal_at(hit.point);
        let rays = ray.beam(
            &n,
            material.blur_radius,
            material.blur_distance,
            material.num_rays,
            rng,
        );

        self.average_color(&rays, level, kk, rng).scaled(coefficient)
    }

    /// Arithmetic average over a ray bundle, every ray with equal weight.
    fn average_color<R: Rng>(
        &self,
        rays: &[Ray],
        level: usize,
        kk: Triple,
        rng: &mut R,
    ) -> Color {
        let mut color = Color::black();
        for ray in rays {
            color = color
                + match self.find_closest(ray) {
                    None => self.scene.background,
                    Some(hit) => self.calc_color(hit, ray, level, kk, rng),
                };
        }
        color.reduce(rays.len())
    }
}

fn diffuse(kd: Triple, nl: f64, intensity: Color) -> Color {
    intensity.scaled(kd.scale(nl.abs()))
}

fn specular(
    material: &Material,
    l: &Vector,
    n: &Vector,
    nl: f64,
    v: &Vector,
    intensity: Color,
) -> Color {
    // r = l - 2(n.l)n; nl is non-zero here by the facing test.
    let r = *l - *n * (2.0 * nl);
    let minus_vr = -align_zero(r.dot(v));

    if minus_vr <= 0.0 {
        return Color::black(); // viewer on the far side of the mirror lobe
    }

    intensity.scaled(material.ks.scale(minus_vr.powi(material.shininess)))
}

/* Tests */

#[cfg(test)]
use crate::light::Light;
#[cfg(test)]
use crate::shape::Shape;
#[cfg(test)]
use crate::tuple::Point;
#[cfg(test)]
use rand::rngs::SmallRng;
#[cfg(test)]
use rand::SeedableRng;

#[cfg(test)]
fn rng() -> SmallRng {
    SmallRng::seed_from_u64(17)
}

#[test]
fn miss_returns_background() {
    let scene = Scene::new()
        .with_background(Color::rgb(0.1, 0.2, 0.3))
        .with_shape(Shape::sphere(Point::new(0.0, 10.0, 0.0), 1.0).unwrap());
    let tracer = RayTracer::new(&scene);

    let ray = Ray::new(Point::ORIGIN, Vector::new(0.0, 0.0, 1.0));
    assert_eq!(tracer.trace_ray(&ray, &mut rng()), Color::rgb(0.1, 0.2, 0.3));
}

#[test]
fn unlit_hit_is_ambient_plus_emission() {
    let scene = Scene::new()
        .with_ambient(Color::rgb(0.1, 0.1, 0.1))
        .with_shape(
            Shape::sphere(Point::new(0.0, 0.0, 3.0), 1.0)
                .unwrap()
                .with_emission(Color::rgb(0.0, 0.5, 0.0)),
        );
    let tracer = RayTracer::new(&scene);

    let ray = Ray::new(Point::ORIGIN, Vector::new(0.0, 0.0, 1.0));
    assert_eq!(tracer.trace_ray(&ray, &mut rng()), Color::rgb(0.1, 0.6, 0.1));
}

#[test]
fn phong_local_shading() {
    // Floor shaded straight-on by a directional light pointing down:
    // diffuse = kd, specular = ks (shininess base is exactly 1).
    let scene = Scene::new()
        .with_shape(
            Shape::plane(Point::ORIGIN, Vector::new(0.0, 1.0, 0.0)).with_material(
                Material::new().with_kd(0.5).with_ks(0.25).with_shininess(10),
            ),
        )
        .with_light(Light::directional(Color::white(), Vector::new(0.0, -1.0, 0.0)));
    let tracer = RayTracer::new(&scene);

    let ray = Ray::new(Point::new(0.0, 5.0, 0.0), Vector::new(0.0, -1.0, 0.0));
    assert_eq!(tracer.trace_ray(&ray, &mut rng()), Color::rgb(0.75, 0.75, 0.75));
}

#[cfg(test)]
fn mirror_scene() -> Scene {
    // A mirror sphere at the origin; a green emissive sphere behind the
    // viewer that only reflection can reach.
    Scene::new()
        .with_shape(
            Shape::sphere(Point::ORIGIN, 1.0)
                .unwrap()
                .with_material(Material::new().with_kr(1.0)),
        )
        .with_shape(
            Shape::sphere(Point::new(0.0, 0.0, -7.0), 0.5)
                .unwrap()
                .with_emission(Color::rgb(0.0, 1.0, 0.0)),
        )
}

#[test]
fn reflection_sees_the_object_behind() {
    let scene = mirror_scene();
    let tracer = RayTracer::new(&scene);

    let ray = Ray::new(Point::new(0.0, 0.0, -5.0), Vector::new(0.0, 0.0, 1.0));
    assert_eq!(tracer.trace_ray(&ray, &mut rng()), Color::rgb(0.0, 1.0, 0.0));
}

#[test]
fn level_one_never_recurses() {
    let scene = mirror_scene();
    let mut tracer = RayTracer::new(&scene);
    tracer.max_level = 1;

    // Same ray as above, but the recursion budget is exhausted: the
    // mirror contributes nothing.
    let ray = Ray::new(Point::new(0.0, 0.0, -5.0), Vector::new(0.0, 0.0, 1.0));
    assert_eq!(tracer.trace_ray(&ray, &mut rng()), Color::black());
}

#[test]
fn zero_level_budget_never_recurses() {
    let scene = mirror_scene();
    let mut tracer = RayTracer::new(&scene);
    tracer.max_level = 0;

    // An exhausted budget must behave like level 1, not underflow into
    // an unbounded recursion.
    let ray = Ray::new(Point::new(0.0, 0.0, -5.0), Vector::new(0.0, 0.0, 1.0));
    assert_eq!(tracer.trace_ray(&ray, &mut rng()), Color::black());
}

#[test]
fn glossy_beam_averages_hits_and_misses() {
    // A blurred mirror floor reflects toward a small emissive sphere
    // 5 units up. The primary reflected ray hits it dead center; every
    // perturbed ray aims at least 2/7 off-axis (the shrinking disc never
    // collapses below radius/(count-1)), far outside the sphere's 0.05
    // angular footprint, so exactly one of the 8 bundle rays hits no
    // matter what the jitter draws.
    let scene = Scene::new()
        .with_background(Color::rgb(0.0, 0.0, 0.2))
        .with_shape(
            Shape::plane(Point::ORIGIN, Vector::new(0.0, 1.0, 0.0)).with_material(
                Material::new()
                    .with_kr(1.0)
                    .with_blur(2.0, 5.0, 8)
                    .unwrap(),
            ),
        )
        .with_shape(
            Shape::sphere(Point::new(0.0, 5.0, 0.0), 0.05)
                .unwrap()
                .with_emission(Color::rgb(0.0, 1.0, 0.0)),
        );
    let tracer = RayTracer::new(&scene);

    // (emission + 7 * background) / 8, scaled by kr.
    let ray = Ray::new(Point::new(0.0, 3.0, 0.0), Vector::new(0.0, -1.0, 0.0));
    assert_eq!(
        tracer.trace_ray(&ray, &mut rng()),
        Color::rgb(0.0, 0.125, 0.175)
    );
}

#[test]
fn weight_below_threshold_prunes_global_effects() {
    let scene = mirror_scene();
    let tracer = RayTracer::new(&scene);

    let ray = Ray::new(Point::new(0.0, 0.0, -5.0), Vector::new(0.0, 0.0, 1.0));
    let hit = tracer.find_closest(&ray).unwrap();
    let n = hit.shape.normal_at(hit.point);

    let tiny = Triple::from(0.0005);
    let color = tracer.global_effects(hit, &ray.direction, &n, 5, tiny, &mut rng());
    assert!(color.identical(&Color::black()));
}

#[cfg(test)]
fn shadow_scene(blocker_kt: f64) -> Scene {
    Scene::new()
        .with_shape(Shape::plane(Point::ORIGIN, Vector::new(0.0, 1.0, 0.0)))
        .with_shape(
            Shape::sphere(Point::new(0.0, 5.0, 0.0), 1.0)
                .unwrap()
                .with_material(Material::new().with_kt(blocker_kt)),
        )
        .with_light(Light::point(Color::white(), Point::new(0.0, 10.0, 0.0)))
}

#[test]
fn opaque_blocker_gives_full_shadow() {
    let scene = shadow_scene(0.0);
    let tracer = RayTracer::new(&scene);

    let ray = Ray::new(Point::new(0.0, 3.0, 0.0), Vector::new(0.0, -1.0, 0.0));
    let hit = tracer.find_closest(&ray).unwrap();
    let n = hit.shape.normal_at(hit.point);
    let light = &scene.lights[0];
    let l = light.direction_to(&hit.point);

    assert_eq!(tracer.transparency(hit, light, &l, &n), Triple::ZERO);
}

#[test]
fn transparent_blocker_attenuates_shadow() {
    let scene = shadow_scene(0.5);
    let tracer = RayTracer::new(&scene);

    let ray = Ray::new(Point::new(0.0, 3.0, 0.0), Vector::new(0.0, -1.0, 0.0));
    let hit = tracer.find_closest(&ray).unwrap();
    let n = hit.shape.normal_at(hit.point);
    let light = &scene.lights[0];
    let l = light.direction_to(&hit.point);

    // The shadow ray crosses the blocker twice: kT * kT.
    assert_eq!(tracer.transparency(hit, light, &l, &n), Triple::from(0.25));
}

#[test]
fn unobstructed_light_is_fully_visible() {
    let scene = shadow_scene(0.0);
    let tracer = RayTracer::new(&scene);

    let ray = Ray::new(Point::new(3.0, 3.0, 0.0), Vector::new(0.0, -1.0, 0.0));
    let hit = tracer.find_closest(&ray).unwrap();
    let n = hit.shape.normal_at(hit.point);
    let light = &scene.lights[0];
    let l = light.direction_to(&hit.point);

    assert_eq!(tracer.transparency(hit, light, &l, &n), Triple::ONE);
}

#[test]
fn refraction_goes_straight_through() {
    // A transparent sphere between the viewer and an emissive wall: the
    // straight-through refracted ray reaches the wall undeflected.
    let scene = Scene::new()
        .with_shape(
            Shape::sphere(Point::new(0.0, 0.0, 2.0), 1.0)
                .unwrap()
                .with_material(Material::new().with_kt(1.0)),
        )
        .with_shape(
            Shape::plane(Point::new(0.0, 0.0, 10.0), Vector::new(0.0, 0.0, -1.0))
                .with_emission(Color::rgb(1.0, 0.0, 0.0)),
        );
    let tracer = RayTracer::new(&scene);

    let ray = Ray::new(Point::ORIGIN, Vector::new(0.0, 0.0, 1.0));
    assert_eq!(tracer.trace_ray(&ray, &mut rng()), Color::rgb(1.0, 0.0, 0.0));
}
