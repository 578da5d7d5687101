use crate::color::Color;
use crate::tuple::{Point, Vector};

/// A light source.
///
/// Point and spot lights attenuate with distance through the usual
/// `1 / (kc + kl*d + kq*d^2)` factors; directional lights are infinitely
/// far away and never attenuate.
#[derive(Clone, Debug, PartialEq)]
pub enum Light {
    Directional {
        intensity: Color,
        direction: Vector,
    },
    Point {
        intensity: Color,
        position: Point,
        kc: f64,
        kl: f64,
        kq: f64,
    },
    Spot {
        intensity: Color,
        position: Point,
        direction: Vector,
        kc: f64,
        kl: f64,
        kq: f64,
        narrow_beam: f64,
    },
}

impl Light {
    pub fn directional(intensity: Color, direction: Vector) -> Light {
        Light::Directional { intensity, direction: direction.normalize() }
    }

    pub fn point(intensity: Color, position: Point) -> Light {
        Light::Point { intensity, position, kc: 1.0, kl: 0.0, kq: 0.0 }
    }

    pub fn spot(intensity: Color, position: Point, direction: Vector) -> Light {
        Light::Spot {
            intensity,
            position,
            direction: direction.normalize(),
            kc: 1.0,
            kl: 0.0,
            kq: 0.0,
            narrow_beam: 1.0,
        }
    }

    /// Sets the distance-attenuation factors. No effect on directional
    /// lights.
    pub fn with_attenuation(mut self, new_kc: f64, new_kl: f64, new_kq: f64) -> Light {
        match &mut self {
            Light::Point { kc, kl, kq, .. } | Light::Spot { kc, kl, kq, .. } => {
                *kc = new_kc;
                *kl = new_kl;
                *kq = new_kq;
            }
            Light::Directional { .. } => {}
        }
        self
    }

    /// Narrows a spot light's cone; higher exponents concentrate the
    /// beam. No effect on other lights.
    pub fn with_narrow_beam(mut self, exponent: f64) -> Light {
        if let Light::Spot { narrow_beam, .. } = &mut self {
            *narrow_beam = exponent;
        }
        self
    }

    /// The light's intensity as seen from a point.
    pub fn intensity_at(&self, p: &Point) -> Color {
        match self {
            Light::Directional { intensity, .. } => *intensity,

            Light::Point { intensity, position, kc, kl, kq } => {
                *intensity * (1.0 / attenuation(position, p, *kc, *kl, *kq))
            }

            Light::Spot { intensity, position, direction, kc, kl, kq, narrow_beam } => {
                let cos = direction.dot(&self.direction_to(p)).max(0.0);
                let base = *intensity * (1.0 / attenuation(position, p, *kc, *kl, *kq));
                base * cos.powf(*narrow_beam)
            }
        }
    }

    /// The unit direction `l` from the light toward a point.
    pub fn direction_to(&self, p: &Point) -> Vector {
        match self {
            Light::Directional { direction, .. } => *direction,
            Light::Point { position, .. } | Light::Spot { position, .. } => {
                (*p - *position).normalize()
            }
        }
    }

    /// Distance from the light to a point; infinite for directional
    /// lights. Shadow rays only count blockers nearer than this.
    pub fn distance_to(&self, p: &Point) -> f64 {
        match self {
            Light::Directional { .. } => f64::INFINITY,
            Light::Point { position, .. } | Light::Spot { position, .. } => position.distance(p),
        }
    }
}

fn attenuation(position: &Point, p: &Point, kc: f64, kl: f64, kq: f64) -> f64 {
    let d = position.distance(p);
    kc + kl * d + kq * d * d
}

/* Tests */

#[test]
fn directional_light_is_uniform() {
    let light = Light::directional(Color::white(), Vector::new(0.0, -2.0, 0.0));
    let p = Point::new(10.0, -30.0, 5.0);

    assert_eq!(light.intensity_at(&p), Color::white());
    assert_eq!(light.direction_to(&p), Vector::new(0.0, -1.0, 0.0));
    assert_eq!(light.distance_to(&p), f64::INFINITY);
}

#[test]
fn point_light_attenuates_with_distance() {
    let light = Light::point(Color::white(), Point::ORIGIN)
        .with_attenuation(1.0, 0.0, 1.0);

    // d = 2, so attenuation = 1 + 4 = 5.
    let p = Point::new(0.0, 0.0, 2.0);
    assert_eq!(light.intensity_at(&p), Color::rgb(0.2, 0.2, 0.2));
    assert_eq!(light.distance_to(&p), 2.0);
    assert_eq!(light.direction_to(&p), Vector::new(0.0, 0.0, 1.0));
}

#[test]
fn default_point_attenuation_is_none() {
    let light = Light::point(Color::white(), Point::ORIGIN);

    assert_eq!(light.intensity_at(&Point::new(0.0, 0.0, 100.0)), Color::white());
}

#[test]
fn spot_light_scales_by_cone_angle() {
    let light = Light::spot(Color::white(), Point::ORIGIN, Vector::new(0.0, 0.0, 1.0));

    // Straight ahead: full intensity.
    assert_eq!(light.intensity_at(&Point::new(0.0, 0.0, 5.0)), Color::white());

    // Behind the cone: black.
    assert_eq!(light.intensity_at(&Point::new(0.0, 0.0, -5.0)), Color::black());

    // 45 degrees off-axis: cos scaling.
    let off = Point::new(1.0, 0.0, 1.0);
    let half = f64::sqrt(2.0) / 2.0;
    assert_eq!(light.intensity_at(&off), Color::rgb(half, half, half));
}

#[test]
fn narrow_beam_sharpens_spot_falloff() {
    let wide = Light::spot(Color::white(), Point::ORIGIN, Vector::new(0.0, 0.0, 1.0));
    let narrow = wide.clone().with_narrow_beam(8.0);

    let off = Point::new(1.0, 0.0, 1.0);
    assert!(narrow.intensity_at(&off).r < wide.intensity_at(&off).r);
}

#[test]
fn attenuation_setter_ignores_directional() {
    let light = Light::directional(Color::white(), Vector::new(0.0, 0.0, 1.0))
        .with_attenuation(0.0, 0.0, 9.0);

    assert_eq!(light.intensity_at(&Point::new(0.0, 0.0, 3.0)), Color::white());
}
