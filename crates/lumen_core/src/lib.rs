//! Lumen Core - scene description for the path tracer.
//!
//! This crate provides the inputs the renderer consumes but does not own:
//!
//! - **Textures**: constant colors and decoded images behind one lookup API
//! - **Material descriptions**: the raw MTL-style fields a material is
//!   classified from
//! - **Meshes**: indexed triangle geometry, loadable from OBJ files
//!
//! # Example
//!
//! ```ignore
//! use lumen_core::obj::load_obj;
//!
//! let scene = load_obj("cornell.obj")?;
//! println!("Loaded {} meshes, {} materials",
//!     scene.meshes.len(),
//!     scene.materials.len());
//! ```

pub mod material;
pub mod mesh;
pub mod obj;
pub mod texture;

use lumen_math::Vec3;

/// Linear RGB radiance or reflectance.
pub type Color = Vec3;

// Re-export commonly used types
pub use material::MaterialDesc;
pub use mesh::Mesh;
pub use obj::{load_obj, ObjError, ObjScene};
pub use texture::{ImageTexture, Texture, TextureCache, TextureError};
