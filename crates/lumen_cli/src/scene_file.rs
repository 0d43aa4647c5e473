//! JSON scene description.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use lumen_core::{load_obj, Color, TextureCache};
use lumen_math::Vec3;
use lumen_renderer::{Camera, Material, MaterialHeuristics, RenderConfig, Scene, TriangleMesh};
use serde::{Deserialize, Serialize};

/// Where the camera sits and what it looks at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraPose {
    pub look_from: Vec3,
    pub look_at: Vec3,
    pub up: Vec3,
}

impl Default for CameraPose {
    /// Looking into the built-in Cornell box.
    fn default() -> Self {
        Self {
            look_from: Vec3::new(278.0, 273.0, -800.0),
            look_at: Vec3::new(278.0, 273.0, 0.0),
            up: Vec3::Y,
        }
    }
}

/// Everything needed to produce one image.
///
/// ```json
/// {
///   "width": 640, "height": 480, "fov": 40,
///   "obj": "cornell-box/cornell-box.obj",
///   "emission": { "Light": [34, 24, 8] },
///   "render": { "samples_per_pixel": 64, "seed": 1 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneFile {
    pub width: u32,
    pub height: u32,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub camera: CameraPose,
    /// OBJ to render; the built-in Cornell box when unset
    pub obj: Option<PathBuf>,
    /// Emitted radiance by MTL material name
    pub emission: HashMap<String, Color>,
    pub materials: MaterialHeuristics,
    pub render: RenderConfig,
}

impl Default for SceneFile {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            fov: 40.0,
            camera: CameraPose::default(),
            obj: None,
            emission: HashMap::new(),
            materials: MaterialHeuristics::default(),
            render: RenderConfig::default(),
        }
    }
}

impl SceneFile {
    /// Read a scene file. A relative `obj` path is resolved against the
    /// file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scene file {}", path.display()))?;
        let mut file: SceneFile = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse scene file {}", path.display()))?;

        if let (Some(obj), Some(dir)) = (&file.obj, path.parent()) {
            if obj.is_relative() {
                file.obj = Some(dir.join(obj));
            }
        }
        Ok(file)
    }

    pub fn camera(&self, scene: &Scene) -> Camera {
        Camera::for_scene(scene).with_position(
            self.camera.look_from,
            self.camera.look_at,
            self.camera.up,
        )
    }

    /// Build the scene: the OBJ when one is set, otherwise the Cornell box.
    pub fn build_scene(&self) -> Result<Scene> {
        let mut scene = match &self.obj {
            Some(path) => self.load_obj_scene(path)?,
            None => crate::cornell::cornell_box(self.width, self.height, self.fov),
        };
        scene.build_with_leaf_size(self.render.leaf_size);
        Ok(scene)
    }

    fn load_obj_scene(&self, path: &Path) -> Result<Scene> {
        let obj = load_obj(path).with_context(|| format!("failed to import {}", path.display()))?;

        let mut textures = TextureCache::with_base_dir(&obj.base_dir);
        let materials: Vec<Arc<Material>> = obj
            .materials
            .iter()
            .map(|desc| {
                let mut desc = desc.clone();
                if let Some(&emission) = self.emission.get(&desc.name) {
                    desc = desc.with_emission(emission);
                }
                Arc::new(Material::from_desc(&desc, &self.materials, &mut textures))
            })
            .collect();

        for name in self.emission.keys() {
            if !obj.materials.iter().any(|m| &m.name == name) {
                log::warn!("Emission set for unknown material '{}'", name);
            }
        }

        let fallback = Arc::new(Material::diffuse(Color::splat(0.5)).with_name("default"));
        let mut scene = Scene::new(self.width, self.height, self.fov);
        for mesh in &obj.meshes {
            let material = mesh
                .material_id
                .and_then(|id| materials.get(id))
                .unwrap_or(&fallback);
            scene.add(TriangleMesh::from_mesh(mesh, material.clone()));
        }

        log::debug!("{} textures loaded", textures.len());
        Ok(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_render_cornell_box() {
        let file: SceneFile = serde_json::from_str("{}").unwrap();
        assert_eq!(file, SceneFile::default());
        assert!(file.obj.is_none());
        assert_eq!(file.camera.look_from, Vec3::new(278.0, 273.0, -800.0));
    }

    #[test]
    fn test_partial_file() {
        let file: SceneFile = serde_json::from_str(
            r#"{
                "width": 64,
                "obj": "box.obj",
                "emission": { "Light": [34.0, 24.0, 8.0] },
                "camera": { "look_from": [0.0, 1.0, 5.0] },
                "render": { "samples_per_pixel": 4 }
            }"#,
        )
        .unwrap();

        assert_eq!(file.width, 64);
        assert_eq!(file.height, 512);
        assert_eq!(file.obj, Some(PathBuf::from("box.obj")));
        assert_eq!(file.emission["Light"], Color::new(34.0, 24.0, 8.0));
        assert_eq!(file.camera.look_from, Vec3::new(0.0, 1.0, 5.0));
        assert_eq!(file.camera.up, Vec3::Y);
        assert_eq!(file.render.samples_per_pixel, 4);
        assert_eq!(file.render.russian_roulette, 0.8);
    }

    #[test]
    fn test_unknown_obj_is_an_error() {
        let file = SceneFile {
            obj: Some(PathBuf::from("/nonexistent/scene.obj")),
            ..Default::default()
        };
        assert!(file.build_scene().is_err());
    }

    #[test]
    fn test_builtin_scene_has_light() {
        let scene = SceneFile::default().build_scene().unwrap();
        assert!(scene.emissive_area() > 0.0);
        assert_eq!(scene.width(), 512);
    }
}
