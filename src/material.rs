use crate::color::Triple;
use crate::error::BuildError;

/// Phong material coefficients, plus the glossy-beam parameters.
///
/// Every coefficient is a per-channel [`Triple`] in `[0, 1]`. The default
/// material absorbs everything: all coefficients zero, no gloss.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Material {
    /// Diffuse reflection coefficient.
    pub kd: Triple,
    /// Specular reflection coefficient.
    pub ks: Triple,
    /// Transparency (refraction) coefficient.
    pub kt: Triple,
    /// Reflectivity coefficient.
    pub kr: Triple,
    /// Specular shininess exponent.
    pub shininess: i32,

    /// Radius of the glossy sampling disc. Zero disables the beam.
    pub blur_radius: f64,
    /// Distance from the hit point to the sampling disc.
    pub blur_distance: f64,
    /// Rays per glossy beam, primary ray included. Always at least 1.
    pub num_rays: usize,
}

impl Default for Material {
    fn default() -> Material {
        Material {
            kd: Triple::ZERO,
            ks: Triple::ZERO,
            kt: Triple::ZERO,
            kr: Triple::ZERO,
            shininess: 0,

            blur_radius: 0.0,
            blur_distance: 0.0,
            num_rays: 1,
        }
    }
}

impl Material {
    pub fn new() -> Material {
        Default::default()
    }

    pub fn with_kd(mut self, kd: impl Into<Triple>) -> Material {
        self.kd = kd.into();
        self
    }

    pub fn with_ks(mut self, ks: impl Into<Triple>) -> Material {
        self.ks = ks.into();
        self
    }

    pub fn with_kt(mut self, kt: impl Into<Triple>) -> Material {
        self.kt = kt.into();
        self
    }

    pub fn with_kr(mut self, kr: impl Into<Triple>) -> Material {
        self.kr = kr.into();
        self
    }

    pub fn with_shininess(mut self, shininess: i32) -> Material {
        self.shininess = shininess;
        self
    }

    /// Enables glossy beam sampling for reflected/refracted rays.
    pub fn with_blur(
        mut self,
        radius: f64,
        distance: f64,
        num_rays: usize,
    ) -> Result<Material, BuildError> {
        if num_rays == 0 {
            return Err(BuildError::ZeroRayCount);
        }
        if radius < 0.0 {
            return Err(BuildError::NonPositive { what: "blur radius", value: radius });
        }

        self.blur_radius = radius;
        self.blur_distance = distance;
        self.num_rays = num_rays;
        Ok(self)
    }
}

/* Tests */

#[test]
fn default_material_is_inert() {
    let m = Material::new();

    assert_eq!(m.kd, Triple::ZERO);
    assert_eq!(m.ks, Triple::ZERO);
    assert_eq!(m.kt, Triple::ZERO);
    assert_eq!(m.kr, Triple::ZERO);
    assert_eq!(m.num_rays, 1);
}

#[test]
fn fluent_setters() {
    let m = Material::new()
        .with_kd(0.5)
        .with_ks(Triple(0.1, 0.2, 0.3))
        .with_kt(0.8)
        .with_kr(0.2)
        .with_shininess(30);

    assert_eq!(m.kd, Triple(0.5, 0.5, 0.5));
    assert_eq!(m.ks, Triple(0.1, 0.2, 0.3));
    assert_eq!(m.kt, Triple(0.8, 0.8, 0.8));
    assert_eq!(m.kr, Triple(0.2, 0.2, 0.2));
    assert_eq!(m.shininess, 30);
}

#[test]
fn blur_validates_ray_count() {
    assert!(Material::new().with_blur(0.5, 10.0, 0).is_err());
    assert!(Material::new().with_blur(-1.0, 10.0, 4).is_err());

    let m = Material::new().with_blur(0.5, 10.0, 4).unwrap();
    assert_eq!(m.num_rays, 4);
    assert_eq!(m.blur_radius, 0.5);
    assert_eq!(m.blur_distance, 10.0);
}
