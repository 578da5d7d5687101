use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use crate::camera::{CameraSettings, Sampling};
use crate::color::Color;
use crate::consts::{DEFAULT_AA_DEPTH, DEFAULT_AA_SAMPLES};
use crate::error::BuildError;
use crate::light::Light;
use crate::material::Material;
use crate::shape::{Geometries, Shape};
use crate::tuple::{Point, Vector};

/// Everything a tracer needs: background, ambient light, light sources
/// and the geometry aggregate.
pub struct Scene {
    pub background: Color,
    pub ambient: Color,
    pub lights: Vec<Light>,
    pub geometries: Geometries,
}

impl Scene {
    pub fn new() -> Scene {
        Scene {
            background: Color::black(),
            ambient: Color::black(),
            lights: Vec::new(),
            geometries: Geometries::new(),
        }
    }

    pub fn with_background(mut self, background: Color) -> Scene {
        self.background = background;
        self
    }

    pub fn with_ambient(mut self, ambient: Color) -> Scene {
        self.ambient = ambient;
        self
    }

    pub fn with_shape(mut self, shape: Shape) -> Scene {
        self.geometries.push(shape);
        self
    }

    pub fn with_light(mut self, light: Light) -> Scene {
        self.lights.push(light);
        self
    }
}

impl Default for Scene {
    fn default() -> Scene {
        Scene::new()
    }
}

/// Loads a scene file and the camera settings it describes.
pub fn load<P: AsRef<Path>>(path: P) -> Result<(Scene, CameraSettings), BuildError> {
    let reader = BufReader::new(File::open(path)?);
    let json: SceneJson = serde_json::from_reader(reader)?;
    json.build()
}

/* JSON schema */

#[derive(Deserialize)]
struct SceneJson {
    #[serde(default)]
    background: [f64; 3],
    #[serde(default)]
    ambient: [f64; 3],
    #[serde(default)]
    lights: Vec<LightJson>,
    shapes: Vec<ShapeJson>,
    camera: CameraJson,
}

#[derive(Deserialize)]
struct LightJson {
    #[serde(rename = "type")]
    ty: String,
    intensity: [f64; 3],
    position: Option<[f64; 3]>,
    direction: Option<[f64; 3]>,
    kc: Option<f64>,
    kl: Option<f64>,
    kq: Option<f64>,
    narrow_beam: Option<f64>,
}

#[derive(Deserialize)]
struct ShapeJson {
    #[serde(rename = "type")]
    ty: String,
    center: Option<[f64; 3]>,
    radius: Option<f64>,
    q: Option<[f64; 3]>,
    normal: Option<[f64; 3]>,
    vertices: Option<[[f64; 3]; 3]>,
    axis_origin: Option<[f64; 3]>,
    axis_direction: Option<[f64; 3]>,
    height: Option<f64>,
    emission: Option<[f64; 3]>,
    material: Option<MaterialJson>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct MaterialJson {
    kd: f64,
    ks: f64,
    shininess: i32,
    kt: f64,
    kr: f64,
    blur_radius: f64,
    blur_distance: f64,
    num_rays: Option<usize>,
}

#[derive(Deserialize)]
struct CameraJson {
    position: [f64; 3],
    to: [f64; 3],
    up: [f64; 3],
    width: f64,
    height: f64,
    distance: f64,
    image_width: usize,
    image_height: usize,
    sampling: Option<SamplingJson>,
}

#[derive(Deserialize)]
struct SamplingJson {
    mode: String,
    samples: Option<usize>,
    depth: Option<usize>,
}

impl SceneJson {
    fn build(self) -> Result<(Scene, CameraSettings), BuildError> {
        let mut scene = Scene::new()
            .with_background(color(self.background))
            .with_ambient(color(self.ambient));

        for light in self.lights {
            scene = scene.with_light(light.build()?);
        }
        for shape in self.shapes {
            scene = scene.with_shape(shape.build()?);
        }

        Ok((scene, self.camera.build()?))
    }
}

impl LightJson {
    fn build(self) -> Result<Light, BuildError> {
        let intensity = color(self.intensity);

        let light = match self.ty.as_str() {
            "directional" => {
                Light::directional(intensity, self.direction()?)
            }
            "point" => {
                let light = Light::point(intensity, self.position()?);
                self.attenuated(light)
            }
            "spot" => {
                let light = Light::spot(intensity, self.position()?, self.direction()?);
                match self.narrow_beam {
                    Some(beam) => self.attenuated(light).with_narrow_beam(beam),
                    None => self.attenuated(light),
                }
            }
            _ => {
                return Err(BuildError::UnknownType {
                    what: "light",
                    ty: self.ty,
                })
            }
        };
        Ok(light)
    }

    fn position(&self) -> Result<Point, BuildError> {
        self.position.map(point).ok_or(BuildError::SceneField {
            ty: self.ty.clone(),
            field: "position",
        })
    }

    fn direction(&self) -> Result<Vector, BuildError> {
        let raw = self.direction.ok_or(BuildError::SceneField {
            ty: self.ty.clone(),
            field: "direction",
        })?;
        vector(raw, "light")
    }

    fn attenuated(&self, light: Light) -> Light {
        light.with_attenuation(
            self.kc.unwrap_or(1.0),
            self.kl.unwrap_or(0.0),
            self.kq.unwrap_or(0.0),
        )
    }
}

impl ShapeJson {
    fn build(self) -> Result<Shape, BuildError> {
        let mut shape = match self.ty.as_str() {
            "sphere" => Shape::sphere(
                point(self.field(self.center, "center")?),
                self.field(self.radius, "radius")?,
            )?,
            "plane" => Shape::plane(
                point(self.field(self.q, "q")?),
                vector(self.field(self.normal, "normal")?, "plane normal")?,
            ),
            "triangle" => {
                let [p1, p2, p3] = self.field(self.vertices, "vertices")?;
                Shape::triangle(point(p1), point(p2), point(p3))?
            }
            "tube" => Shape::tube(self.axis()?, self.field(self.radius, "radius")?)?,
            "cylinder" => Shape::cylinder(
                self.axis()?,
                self.field(self.radius, "radius")?,
                self.field(self.height, "height")?,
            )?,
            _ => {
                return Err(BuildError::UnknownType {
                    what: "shape",
                    ty: self.ty,
                })
            }
        };

        if let Some(emission) = self.emission {
            shape = shape.with_emission(color(emission));
        }
        if let Some(material) = self.material {
            shape = shape.with_material(material.build()?);
        }
        Ok(shape)
    }

    fn axis(&self) -> Result<crate::ray::Ray, BuildError> {
        let origin = point(self.field(self.axis_origin, "axis_origin")?);
        let direction = vector(self.field(self.axis_direction, "axis_direction")?, "axis")?;
        Ok(crate::ray::Ray::new(origin, direction))
    }

    fn field<T>(&self, value: Option<T>, field: &'static str) -> Result<T, BuildError> {
        value.ok_or(BuildError::SceneField {
            ty: self.ty.clone(),
            field,
        })
    }
}

impl MaterialJson {
    fn build(self) -> Result<Material, BuildError> {
        let mut material = Material::new()
            .with_kd(self.kd)
            .with_ks(self.ks)
            .with_shininess(self.shininess)
            .with_kt(self.kt)
            .with_kr(self.kr);

        if let Some(num_rays) = self.num_rays {
            material = material.with_blur(self.blur_radius, self.blur_distance, num_rays)?;
        }
        Ok(material)
    }
}

impl CameraJson {
    fn build(self) -> Result<CameraSettings, BuildError> {
        Ok(CameraSettings {
            position: point(self.position),
            to: vector(self.to, "camera to")?,
            up: vector(self.up, "camera up")?,
            width: self.width,
            height: self.height,
            distance: self.distance,
            image_width: self.image_width,
            image_height: self.image_height,
            sampling: match self.sampling {
                None => Sampling::Single,
                Some(sampling) => sampling.build()?,
            },
        })
    }
}

impl SamplingJson {
    fn build(self) -> Result<Sampling, BuildError> {
        match self.mode.as_str() {
            "single" => Ok(Sampling::Single),
            "jitter" => Ok(Sampling::Jittered {
                samples: self.samples.unwrap_or(DEFAULT_AA_SAMPLES),
            }),
            "adaptive" => Ok(Sampling::Adaptive {
                depth: self.depth.unwrap_or(DEFAULT_AA_DEPTH),
            }),
            _ => Err(BuildError::UnknownType {
                what: "sampling mode",
                ty: self.mode,
            }),
        }
    }
}

fn color([r, g, b]: [f64; 3]) -> Color {
    Color::rgb(r, g, b)
}

fn point([x, y, z]: [f64; 3]) -> Point {
    Point::new(x, y, z)
}

fn vector([x, y, z]: [f64; 3], what: &'static str) -> Result<Vector, BuildError> {
    if x == 0.0 && y == 0.0 && z == 0.0 {
        return Err(BuildError::ZeroVector { what });
    }
    Ok(Vector::new(x, y, z))
}

/* Tests */

#[cfg(test)]
fn parse(text: &str) -> Result<(Scene, CameraSettings), BuildError> {
    let json: SceneJson = serde_json::from_str(text).unwrap();
    json.build()
}

#[cfg(test)]
const CAMERA_JSON: &str = r#""camera": {
    "position": [0.0, 0.0, 0.0],
    "to": [0.0, 0.0, -1.0],
    "up": [0.0, 1.0, 0.0],
    "width": 2.0, "height": 2.0, "distance": 1.0,
    "image_width": 100, "image_height": 100
}"#;

#[test]
fn parses_a_minimal_scene() {
    let text = format!(
        r#"{{
            "background": [0.1, 0.2, 0.3],
            "lights": [
                {{"type": "directional", "intensity": [1.0, 1.0, 1.0],
                  "direction": [0.0, -1.0, 0.0]}}
            ],
            "shapes": [
                {{"type": "sphere", "center": [0.0, 0.0, -5.0], "radius": 1.0,
                  "material": {{"kd": 0.5, "ks": 0.5, "shininess": 30}}}}
            ],
            {}
        }}"#,
        CAMERA_JSON
    );

    let (scene, settings) = parse(&text).unwrap();
    assert_eq!(scene.background, Color::rgb(0.1, 0.2, 0.3));
    assert_eq!(scene.ambient, Color::black());
    assert_eq!(scene.lights.len(), 1);
    assert_eq!(scene.geometries.len(), 1);
    assert_eq!(settings.image_width, 100);
    assert!(matches!(settings.sampling, Sampling::Single));
}

#[test]
fn parses_sampling_modes() {
    let text = format!(
        r#"{{"shapes": [], {}}}"#,
        CAMERA_JSON.replace(
            r#""image_height": 100"#,
            r#""image_height": 100, "sampling": {"mode": "jitter", "samples": 16}"#
        )
    );

    let (_, settings) = parse(&text).unwrap();
    assert!(matches!(settings.sampling, Sampling::Jittered { samples: 16 }));
}

#[test]
fn rejects_an_unknown_shape_type() {
    let text = format!(
        r#"{{"shapes": [{{"type": "torus", "radius": 1.0}}], {}}}"#,
        CAMERA_JSON
    );

    match parse(&text) {
        Err(BuildError::UnknownType { what: "shape", ty }) => assert_eq!(ty, "torus"),
        other => panic!("expected an unknown-type error, got {:?}", other.err()),
    }
}

#[test]
fn rejects_a_sphere_without_a_radius() {
    let text = format!(
        r#"{{"shapes": [{{"type": "sphere", "center": [0.0, 0.0, 0.0]}}], {}}}"#,
        CAMERA_JSON
    );

    match parse(&text) {
        Err(BuildError::SceneField { ty, field }) => {
            assert_eq!(ty, "sphere");
            assert_eq!(field, "radius");
        }
        other => panic!("expected a missing-field error, got {:?}", other.err()),
    }
}

#[test]
fn rejects_a_zero_light_direction() {
    let text = format!(
        r#"{{
            "lights": [
                {{"type": "directional", "intensity": [1.0, 1.0, 1.0],
                  "direction": [0.0, 0.0, 0.0]}}
            ],
            "shapes": [],
            {}
        }}"#,
        CAMERA_JSON
    );

    assert!(matches!(
        parse(&text),
        Err(BuildError::ZeroVector { what: "light" })
    ));
}
