//! Indexed triangle geometry.
//!
//! A `Mesh` is plain data: positions, optional per-vertex texture
//! coordinates and a triangle index list. The renderer turns it into an
//! intersectable object with its own acceleration structure.

use lumen_math::{Aabb, Vec2, Vec3};

/// One triangle pulled out of a [`Mesh`], ready to be intersected.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshTriangle {
    pub positions: [Vec3; 3],
    pub uvs: [Vec2; 3],
}

/// A mesh consisting of vertex positions, optional UVs and triangle indices.
#[derive(Clone, Debug)]
pub struct Mesh {
    /// Object/group name from the source file
    pub name: String,

    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// UV coordinates (optional - one per vertex)
    pub uvs: Option<Vec<Vec2>>,

    /// Triangle indices (every 3 indices form a triangle)
    pub indices: Vec<u32>,

    /// Index into the material list of the file this mesh came from
    pub material_id: Option<usize>,

    /// Axis-aligned bounding box
    pub bounds: Aabb,
}

impl Mesh {
    pub fn new(name: impl Into<String>, positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        let bounds = Aabb::from_point_cloud(positions.iter().copied());
        Self {
            name: name.into(),
            positions,
            uvs: None,
            indices,
            material_id: None,
            bounds,
        }
    }

    /// Attach per-vertex UVs. Ignored (with a warning) if the count does not
    /// match the vertex count.
    pub fn with_uvs(mut self, uvs: Vec<Vec2>) -> Self {
        if uvs.len() == self.positions.len() {
            self.uvs = Some(uvs);
        } else {
            log::warn!(
                "Mesh {}: {} UVs for {} vertices, ignoring UVs",
                self.name,
                uvs.len(),
                self.positions.len()
            );
        }
        self
    }

    pub fn with_material_id(mut self, material_id: Option<usize>) -> Self {
        self.material_id = material_id;
        self
    }

    /// Get the number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// All triangles with valid indices. Triangles referencing missing
    /// vertices are skipped with a warning. Without UVs every corner gets
    /// the barycentric corner coordinates (0,0), (1,0), (0,1).
    pub fn triangles(&self) -> Vec<MeshTriangle> {
        let mut triangles = Vec::with_capacity(self.triangle_count());

        for chunk in self.indices.chunks_exact(3) {
            let idx = [chunk[0] as usize, chunk[1] as usize, chunk[2] as usize];

            if idx.iter().any(|&i| i >= self.positions.len()) {
                log::warn!(
                    "Mesh {}: invalid triangle indices {:?}, vertex count: {}",
                    self.name,
                    idx,
                    self.positions.len()
                );
                continue;
            }

            let uvs = match &self.uvs {
                Some(uvs) => idx.map(|i| uvs[i]),
                None => [Vec2::ZERO, Vec2::X, Vec2::Y],
            };

            triangles.push(MeshTriangle {
                positions: idx.map(|i| self.positions[i]),
                uvs,
            });
        }

        triangles
    }

    /// Total surface area of all valid triangles.
    pub fn surface_area(&self) -> f32 {
        self.triangles()
            .iter()
            .map(|t| {
                let [a, b, c] = t.positions;
                0.5 * (b - a).cross(c - a).length()
            })
            .sum()
    }
}
