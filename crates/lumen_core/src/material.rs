//! External material description.
//!
//! Mirrors the fields of a Wavefront MTL material. The renderer classifies a
//! description into one of its reflection models; nothing here decides how
//! light interacts with the surface.

use serde::{Deserialize, Serialize};

use crate::Color;

/// An MTL-style material as it appears in a scene description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialDesc {
    /// Material name (`newmtl`)
    pub name: String,

    /// Diffuse reflectance (`Kd`)
    pub diffuse: Color,

    /// Specular reflectance (`Ks`)
    pub specular: Color,

    /// Phong specular exponent (`Ns`)
    pub specular_exponent: f32,

    /// Index of refraction (`Ni`)
    pub ior: f32,

    /// Path to the diffuse texture (`map_Kd`), relative to the MTL file
    pub diffuse_map: Option<String>,

    /// Emitted radiance. MTL has no reliable emission field, so scenes assign
    /// this by material name.
    pub emission: Color,
}

impl Default for MaterialDesc {
    fn default() -> Self {
        Self {
            name: String::new(),
            diffuse: Color::splat(0.5),
            specular: Color::ZERO,
            specular_exponent: 1.0,
            ior: 1.0,
            diffuse_map: None,
            emission: Color::ZERO,
        }
    }
}

impl MaterialDesc {
    /// A named material with just a diffuse color.
    pub fn new(name: impl Into<String>, diffuse: Color) -> Self {
        Self {
            name: name.into(),
            diffuse,
            ..Default::default()
        }
    }

    pub fn with_emission(mut self, emission: Color) -> Self {
        self.emission = emission;
        self
    }

    pub fn is_emissive(&self) -> bool {
        self.emission.length_squared() > 0.0
    }
}

impl From<&tobj::Material> for MaterialDesc {
    fn from(mat: &tobj::Material) -> Self {
        let defaults = MaterialDesc::default();
        let color = |c: Option<[f32; 3]>, fallback: Color| c.map(Color::from).unwrap_or(fallback);

        Self {
            name: mat.name.clone(),
            diffuse: color(mat.diffuse, defaults.diffuse),
            specular: color(mat.specular, defaults.specular),
            specular_exponent: mat.shininess.unwrap_or(defaults.specular_exponent),
            ior: mat.optical_density.unwrap_or(defaults.ior),
            diffuse_map: mat.diffuse_texture.clone().filter(|path| !path.is_empty()),
            emission: Color::ZERO,
        }
    }
}
