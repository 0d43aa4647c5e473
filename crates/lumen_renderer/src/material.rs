//! Surface reflection models.
//!
//! Directions passed to [`Material`] all point away from the surface:
//! `wi` towards the viewer (the reverse of the incoming ray), `wo` towards
//! the next vertex or the light. `n` is the shading normal on the viewer's
//! side of the surface.

use std::f32::consts::PI;
use std::sync::Arc;

use crate::{gen_f32, Color, EPSILON};
use lumen_core::{MaterialDesc, Texture, TextureCache};
use lumen_math::{Vec2, Vec3};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Below this outgoing cosine the mirror lobe contributes nothing.
const MIN_MIRROR_COSINE: f32 = 0.001;

/// The reflection model of a material.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Bsdf {
    /// Lambertian reflection of the diffuse texture.
    Diffuse,
    /// Diffuse lobe mixed with a GGX specular lobe.
    Microfacet {
        roughness: f32,
        p_diffuse: f32,
        p_specular: f32,
    },
    /// Perfect mirror weighted by the dielectric Fresnel reflectance.
    Dielectric { ior: f32 },
}

/// A surface material: reflection model, emission and textures.
#[derive(Clone, Debug)]
pub struct Material {
    pub name: String,
    pub bsdf: Bsdf,
    pub emission: Color,
    /// Albedo of the diffuse lobe
    pub diffuse: Arc<Texture>,
    /// Normal-incidence reflectance (F0) of the specular lobe
    pub specular: Arc<Texture>,
}

/// Thresholds used to classify an MTL-style description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialHeuristics {
    /// `|ior - 1|` below this counts as "no refraction given"
    pub ior_tolerance: f32,
    /// Specular exponents above this become a dielectric mirror
    pub dielectric_min_exponent: f32,
    /// Index of refraction assigned to classified mirrors
    pub dielectric_ior: f32,
    pub dielectric_diffuse: Color,
    pub dielectric_specular: Color,
    /// Roughness is `roughness_scale / ns`
    pub roughness_scale: f32,
    pub min_roughness: f32,
    /// Lobe norms summing to less than this give a pure diffuse mix
    pub min_lobe_weight: f32,
}

impl Default for MaterialHeuristics {
    fn default() -> Self {
        Self {
            ior_tolerance: 1e-3,
            dielectric_min_exponent: 200.0,
            dielectric_ior: 12.85,
            dielectric_diffuse: Color::splat(0.45),
            dielectric_specular: Color::new(0.3, 0.3, 0.25),
            roughness_scale: 4.0,
            min_roughness: 1e-3,
            min_lobe_weight: 1e-6,
        }
    }
}

impl Material {
    /// Lambertian material with a constant albedo.
    pub fn diffuse(albedo: Color) -> Self {
        Self {
            name: String::new(),
            bsdf: Bsdf::Diffuse,
            emission: Color::ZERO,
            diffuse: Arc::new(Texture::constant(albedo)),
            specular: Arc::new(Texture::constant(Color::ZERO)),
        }
    }

    /// Diffuse + GGX mixture. Lobe probabilities follow the albedo norms.
    pub fn microfacet(albedo: Color, specular: Color, roughness: f32) -> Self {
        let (p_diffuse, p_specular) = lobe_weights(albedo, specular, 1e-6);
        Self {
            name: String::new(),
            bsdf: Bsdf::Microfacet {
                roughness: roughness.clamp(1e-3, 1.0),
                p_diffuse,
                p_specular,
            },
            emission: Color::ZERO,
            diffuse: Arc::new(Texture::constant(albedo)),
            specular: Arc::new(Texture::constant(specular)),
        }
    }

    /// Fresnel-weighted mirror.
    pub fn dielectric(ior: f32) -> Self {
        let shiny = MaterialHeuristics::default();
        Self {
            name: String::new(),
            bsdf: Bsdf::Dielectric { ior },
            emission: Color::ZERO,
            diffuse: Arc::new(Texture::constant(shiny.dielectric_diffuse)),
            specular: Arc::new(Texture::constant(shiny.dielectric_specular)),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_emission(mut self, emission: Color) -> Self {
        self.emission = emission;
        self
    }

    pub fn with_diffuse_texture(mut self, texture: Arc<Texture>) -> Self {
        self.diffuse = texture;
        self
    }

    /// Classify an MTL-style description into a reflection model.
    ///
    /// A diffuse map that fails to load is logged and replaced by the
    /// constant `Kd` color.
    pub fn from_desc(
        desc: &MaterialDesc,
        heuristics: &MaterialHeuristics,
        textures: &mut TextureCache,
    ) -> Self {
        let ns = desc.specular_exponent;
        let unit_ior = (desc.ior - 1.0).abs() < heuristics.ior_tolerance;

        let (bsdf, diffuse, specular) = if unit_ior && ns > heuristics.dielectric_min_exponent {
            (
                Bsdf::Dielectric {
                    ior: heuristics.dielectric_ior,
                },
                Arc::new(Texture::constant(heuristics.dielectric_diffuse)),
                Arc::new(Texture::constant(heuristics.dielectric_specular)),
            )
        } else {
            let bsdf = if unit_ior && ns != 1.0 {
                let (p_diffuse, p_specular) =
                    lobe_weights(desc.diffuse, desc.specular, heuristics.min_lobe_weight);
                let roughness = (heuristics.roughness_scale / ns.max(f32::MIN_POSITIVE))
                    .clamp(heuristics.min_roughness, 1.0);
                Bsdf::Microfacet {
                    roughness,
                    p_diffuse,
                    p_specular,
                }
            } else {
                Bsdf::Diffuse
            };

            (
                bsdf,
                diffuse_texture(desc, textures),
                Arc::new(Texture::constant(desc.specular)),
            )
        };

        log::debug!("Material '{}' classified as {:?}", desc.name, bsdf);

        Self {
            name: desc.name.clone(),
            bsdf,
            emission: desc.emission,
            diffuse,
            specular,
        }
    }

    pub fn has_emission(&self) -> bool {
        self.emission.max_element() > 0.0
    }

    /// True for the mirror lobe, which next-event estimation cannot sample.
    pub fn is_specular(&self) -> bool {
        matches!(self.bsdf, Bsdf::Dielectric { .. })
    }

    /// Diffuse albedo at texture coordinates `uv`.
    pub fn albedo(&self, uv: Vec2) -> Color {
        self.diffuse.evaluate(uv.x, uv.y)
    }

    /// Draw an outgoing direction.
    pub fn sample(&self, wi: Vec3, n: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        match self.bsdf {
            Bsdf::Diffuse => sample_cosine_hemisphere(n, rng),
            Bsdf::Microfacet {
                roughness,
                p_diffuse,
                ..
            } => {
                if gen_f32(rng) < p_diffuse {
                    sample_cosine_hemisphere(n, rng)
                } else {
                    let h = sample_ggx_half_vector(n, roughness, rng);
                    reflect(wi, h)
                }
            }
            Bsdf::Dielectric { .. } => reflect(wi, n),
        }
    }

    /// Solid-angle density of [`Material::sample`] producing `wo`.
    pub fn pdf(&self, wi: Vec3, wo: Vec3, n: Vec3) -> f32 {
        let cos_o = wo.dot(n);
        match self.bsdf {
            Bsdf::Diffuse => cos_o.max(0.0) / PI,
            Bsdf::Microfacet {
                roughness,
                p_diffuse,
                p_specular,
            } => {
                if cos_o <= 0.0 {
                    return 0.0;
                }
                let Some(h) = half_vector(wi, wo) else {
                    return 0.0;
                };
                let cos_h = h.dot(n).max(0.0);
                let wo_dot_h = wo.dot(h).abs();
                let specular = if wo_dot_h > 0.0 {
                    ggx_distribution(cos_h, roughness) * cos_h / (4.0 * wo_dot_h)
                } else {
                    0.0
                };
                p_diffuse * cos_o / PI + p_specular * specular
            }
            Bsdf::Dielectric { .. } => {
                if cos_o > EPSILON {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Reflected radiance per unit incident radiance for the pair (wi, wo).
    pub fn eval(&self, wi: Vec3, wo: Vec3, n: Vec3, uv: Vec2) -> Color {
        let cos_o = wo.dot(n);
        match self.bsdf {
            Bsdf::Diffuse => {
                if cos_o <= 0.0 {
                    return Color::ZERO;
                }
                self.albedo(uv) / PI
            }
            Bsdf::Microfacet {
                roughness,
                p_diffuse,
                p_specular,
            } => {
                let cos_i = wi.dot(n);
                if cos_i <= 0.0 || cos_o <= 0.0 {
                    return Color::ZERO;
                }
                let Some(h) = half_vector(wi, wo) else {
                    return Color::ZERO;
                };

                let diffuse = self.albedo(uv) * cos_o / PI;

                let f0 = self.specular.evaluate(uv.x, uv.y);
                let f = fresnel_schlick(f0, wo.dot(h).max(0.0));
                let d = ggx_distribution(h.dot(n), roughness);
                let g = smith_g1(wi, h, n, roughness) * smith_g1(wo, h, n, roughness);
                let specular = f * (g * d / (4.0 * cos_i * cos_o));

                p_diffuse * diffuse + p_specular * specular
            }
            Bsdf::Dielectric { ior } => {
                if cos_o < MIN_MIRROR_COSINE {
                    return Color::ZERO;
                }
                Color::splat(fresnel_dielectric(wi.dot(n), 1.0, ior) / cos_o)
            }
        }
    }
}

fn diffuse_texture(desc: &MaterialDesc, textures: &mut TextureCache) -> Arc<Texture> {
    let constant = || Arc::new(Texture::constant(desc.diffuse));

    match &desc.diffuse_map {
        Some(path) => match textures.load(path) {
            Ok(texture) => texture,
            Err(e) => {
                log::warn!(
                    "Material '{}': {}, falling back to constant Kd",
                    desc.name,
                    e
                );
                constant()
            }
        },
        None => constant(),
    }
}

/// Lobe selection probabilities from the albedo magnitudes.
fn lobe_weights(diffuse: Color, specular: Color, min_total: f32) -> (f32, f32) {
    let kd = diffuse.length();
    let ks = specular.length();
    let total = kd + ks;
    if total <= min_total {
        (1.0, 0.0)
    } else {
        (kd / total, ks / total)
    }
}

/// Map a direction in the local frame (z = up) to the frame around `n`.
#[inline]
fn to_world(local: Vec3, n: Vec3) -> Vec3 {
    let (t, b) = n.any_orthonormal_pair();
    t * local.x + b * local.y + n * local.z
}

fn sample_cosine_hemisphere(n: Vec3, rng: &mut dyn RngCore) -> Vec3 {
    let u1 = gen_f32(rng);
    let u2 = gen_f32(rng);
    let r = u1.sqrt();
    let phi = 2.0 * PI * u2;
    let local = Vec3::new(r * phi.cos(), r * phi.sin(), (1.0 - u1).max(0.0).sqrt());
    to_world(local, n)
}

fn sample_ggx_half_vector(n: Vec3, alpha: f32, rng: &mut dyn RngCore) -> Vec3 {
    let u1 = gen_f32(rng);
    let u2 = gen_f32(rng);
    let a2 = alpha * alpha;
    let cos2 = (1.0 - u1) / (1.0 + (a2 - 1.0) * u1);
    let cos_theta = cos2.max(0.0).sqrt();
    let sin_theta = (1.0 - cos2).max(0.0).sqrt();
    let phi = 2.0 * PI * u2;
    to_world(
        Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta),
        n,
    )
}

/// Mirror `v` (pointing away from the surface) about `n`.
#[inline]
fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    2.0 * v.dot(n) * n - v
}

#[inline]
fn half_vector(wi: Vec3, wo: Vec3) -> Option<Vec3> {
    let h = wi + wo;
    (h.length_squared() > 0.0).then(|| h.normalize())
}

/// GGX normal distribution for a half vector at `cos_h` from the normal.
fn ggx_distribution(cos_h: f32, alpha: f32) -> f32 {
    if cos_h <= 0.0 {
        return 0.0;
    }
    let a2 = alpha * alpha;
    let denom = (a2 - 1.0) * cos_h * cos_h + 1.0;
    a2 / (PI * denom * denom)
}

/// Smith GGX shadowing term for one direction.
fn smith_g1(v: Vec3, h: Vec3, n: Vec3, alpha: f32) -> f32 {
    let cos_v = v.dot(n);
    if cos_v <= 0.0 || v.dot(h) / cos_v <= 0.0 {
        return 0.0;
    }
    let cos2 = cos_v * cos_v;
    let tan2 = (1.0 - cos2).max(0.0) / cos2;
    2.0 / (1.0 + (1.0 + alpha * alpha * tan2).sqrt())
}

fn fresnel_schlick(f0: Color, cos_theta: f32) -> Color {
    f0 + (Color::ONE - f0) * (1.0 - cos_theta).clamp(0.0, 1.0).powi(5)
}

/// Unpolarized Fresnel reflectance for light arriving at `cos_i` from a
/// medium of index `eta_i` onto one of index `eta_t`.
fn fresnel_dielectric(cos_i: f32, eta_i: f32, eta_t: f32) -> f32 {
    let mut cos_i = cos_i.clamp(-1.0, 1.0);
    let (eta_i, eta_t) = if cos_i < 0.0 {
        cos_i = -cos_i;
        (eta_t, eta_i)
    } else {
        (eta_i, eta_t)
    };

    let sin_t = eta_i / eta_t * (1.0 - cos_i * cos_i).max(0.0).sqrt();
    if sin_t >= 1.0 {
        return 1.0;
    }
    let cos_t = (1.0 - sin_t * sin_t).max(0.0).sqrt();

    let rs = (eta_t * cos_i - eta_i * cos_t) / (eta_t * cos_i + eta_i * cos_t);
    let rp = (eta_i * cos_i - eta_t * cos_t) / (eta_i * cos_i + eta_t * cos_t);
    (rs * rs + rp * rp) / 2.0
}
