//! Wavefront OBJ/MTL import.
//!
//! Produces one [`Mesh`] per OBJ model and one [`MaterialDesc`] per MTL
//! material. Emission is not part of MTL; callers assign it by material name.

use std::path::{Path, PathBuf};

use lumen_math::{Vec2, Vec3};
use thiserror::Error;

use crate::{MaterialDesc, Mesh};

#[derive(Error, Debug)]
pub enum ObjError {
    #[error("failed to load OBJ {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("OBJ {} contains no models", .path.display())]
    NoModels { path: PathBuf },
}

pub type ObjResult<T> = Result<T, ObjError>;

/// Geometry and materials read from one OBJ file.
#[derive(Clone, Debug, Default)]
pub struct ObjScene {
    pub meshes: Vec<Mesh>,
    pub materials: Vec<MaterialDesc>,
    /// Directory of the OBJ file; texture paths in `materials` are relative to it.
    pub base_dir: PathBuf,
}

impl ObjScene {
    /// Material description for a mesh, if it references one.
    pub fn material_for(&self, mesh: &Mesh) -> Option<&MaterialDesc> {
        mesh.material_id.and_then(|id| self.materials.get(id))
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(Mesh::triangle_count).sum()
    }
}

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        single_index: true,
        triangulate: true,
        ..Default::default()
    }
}

/// Load an OBJ file and the MTL library it references.
pub fn load_obj(path: impl AsRef<Path>) -> ObjResult<ObjScene> {
    let path = path.as_ref();
    let (models, materials) =
        tobj::load_obj(path, &load_options()).map_err(|source| ObjError::Load {
            path: path.to_path_buf(),
            source,
        })?;

    let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    build_scene(path, models, materials, base_dir)
}

/// Parse OBJ text with an optional in-memory MTL library.
pub fn parse_obj(obj_source: &str, mtl_source: Option<&str>) -> ObjResult<ObjScene> {
    let path = Path::new("<memory>");
    let mut reader = obj_source.as_bytes();
    let (models, materials) = tobj::load_obj_buf(&mut reader, &load_options(), |_: &Path| {
        match mtl_source {
            Some(mtl) => tobj::load_mtl_buf(&mut mtl.as_bytes()),
            None => Err(tobj::LoadError::OpenFileFailed),
        }
    })
    .map_err(|source| ObjError::Load {
        path: path.to_path_buf(),
        source,
    })?;

    build_scene(path, models, materials, PathBuf::new())
}

fn build_scene(
    path: &Path,
    models: Vec<tobj::Model>,
    materials: Result<Vec<tobj::Material>, tobj::LoadError>,
    base_dir: PathBuf,
) -> ObjResult<ObjScene> {
    if models.is_empty() {
        return Err(ObjError::NoModels {
            path: path.to_path_buf(),
        });
    }

    let materials = match materials {
        Ok(materials) => materials.iter().map(MaterialDesc::from).collect(),
        Err(e) => {
            log::warn!(
                "No usable MTL library for {} ({}), using default materials",
                path.display(),
                e
            );
            Vec::new()
        }
    };

    let meshes: Vec<Mesh> = models.into_iter().map(mesh_from_model).collect();

    let scene = ObjScene {
        meshes,
        materials,
        base_dir,
    };

    log::info!(
        "Loaded {}: {} meshes, {} triangles, {} materials",
        path.display(),
        scene.meshes.len(),
        scene.triangle_count(),
        scene.materials.len()
    );

    Ok(scene)
}

fn mesh_from_model(model: tobj::Model) -> Mesh {
    let tobj::Model { mesh, name, .. } = model;

    let positions = mesh
        .positions
        .chunks_exact(3)
        .map(Vec3::from_slice)
        .collect();

    let mut result = Mesh::new(name, positions, mesh.indices).with_material_id(mesh.material_id);

    if !mesh.texcoords.is_empty() {
        let uvs = mesh.texcoords.chunks_exact(2).map(Vec2::from_slice).collect();
        result = result.with_uvs(uvs);
    }

    result
}
