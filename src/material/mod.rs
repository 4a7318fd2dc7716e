//! Shader names to renderable materials and back.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::converter::ExportOptions;
use crate::diagnostics::{DiagnosticCode, DiagnosticContext, Diagnostics};
use crate::pdx::PdxNode;

/// Texture names that stand for "no texture".
pub const NO_DIFFUSE: &str = "nodiff.dds";
pub const NO_NORMAL: &str = "nonormal.dds";
pub const NO_SPECULAR: &str = "nospec.dds";

const COLLIDER_COLOR: [f32; 3] = [0.0, 1.0, 0.0];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Shader {
    Collision,
    PdxMeshTextureAtlas,
    PdxMeshAlphaBlendNoZWrite,
    PdxMeshColor,
    PdxMeshStandard,
    PdxMeshSnow,
    PdxMeshAlphaBlend,
    PdxMeshStandardNoFowNoTi,
    JdxMeshShield,
    JdxMeshShieldTextureAtlas,
    /// Anything else; kept verbatim so export can write it back.
    Other(String),
}

impl Shader {
    pub fn parse(name: &str) -> Self {
        match name {
            "Collision" => Shader::Collision,
            "PdxMeshTextureAtlas" => Shader::PdxMeshTextureAtlas,
            "PdxMeshAlphaBlendNoZWrite" => Shader::PdxMeshAlphaBlendNoZWrite,
            "PdxMeshColor" => Shader::PdxMeshColor,
            "PdxMeshStandard" => Shader::PdxMeshStandard,
            "PdxMeshSnow" => Shader::PdxMeshSnow,
            "PdxMeshAlphaBlend" => Shader::PdxMeshAlphaBlend,
            "PdxMeshStandard_NoFoW_NoTI" => Shader::PdxMeshStandardNoFowNoTi,
            "JdxMeshShield" => Shader::JdxMeshShield,
            "JdxMeshShieldTextureAtlas" => Shader::JdxMeshShieldTextureAtlas,
            other => Shader::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Shader::Collision => "Collision",
            Shader::PdxMeshTextureAtlas => "PdxMeshTextureAtlas",
            Shader::PdxMeshAlphaBlendNoZWrite => "PdxMeshAlphaBlendNoZWrite",
            Shader::PdxMeshColor => "PdxMeshColor",
            Shader::PdxMeshStandard => "PdxMeshStandard",
            Shader::PdxMeshSnow => "PdxMeshSnow",
            Shader::PdxMeshAlphaBlend => "PdxMeshAlphaBlend",
            Shader::PdxMeshStandardNoFowNoTi => "PdxMeshStandard_NoFoW_NoTI",
            Shader::JdxMeshShield => "JdxMeshShield",
            Shader::JdxMeshShieldTextureAtlas => "JdxMeshShieldTextureAtlas",
            Shader::Other(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Shader::Other(_))
    }

    pub fn is_transparent(&self) -> bool {
        matches!(self, Shader::PdxMeshAlphaBlend | Shader::PdxMeshAlphaBlendNoZWrite)
    }
}

impl fmt::Display for Shader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextureRef {
    pub file_name: String,
    /// Where the texture loader should look for it.
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MaterialKind {
    /// Flat unlit wireframe, used for collision meshes.
    Wireframe { color: [f32; 3] },
    Lit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub kind: MaterialKind,
    pub shader: Shader,
    pub diffuse: Option<TextureRef>,
    pub normal: Option<TextureRef>,
    pub specular: Option<TextureRef>,
    pub transparent: bool,
    pub skinning: bool,
}

impl Material {
    pub fn lit(shader: Shader) -> Self {
        Self {
            kind: MaterialKind::Lit,
            transparent: shader.is_transparent(),
            shader,
            diffuse: None,
            normal: None,
            specular: None,
            skinning: false,
        }
    }

    pub fn collider() -> Self {
        Self {
            kind: MaterialKind::Wireframe {
                color: COLLIDER_COLOR,
            },
            shader: Shader::Collision,
            diffuse: None,
            normal: None,
            specular: None,
            transparent: false,
            skinning: false,
        }
    }

    pub fn is_collider(&self) -> bool {
        matches!(self.kind, MaterialKind::Wireframe { .. })
    }
}

fn texture(material: &PdxNode, property: &str, placeholder: &str, pdx_path: &Path) -> Option<TextureRef> {
    let file_name = material.str_of(property)?;
    if file_name == placeholder {
        return None;
    }
    Some(TextureRef {
        file_name: file_name.to_string(),
        path: pdx_path.join(file_name),
    })
}

/// Maps the `material` node of a mesh. `Collision` always yields the collider wireframe,
/// whatever textures are listed.
pub fn material_from_pdx(
    mesh_name: &str,
    material: Option<&PdxNode>,
    pdx_path: &Path,
    skinned: bool,
    diagnostics: &mut Diagnostics,
) -> Material {
    let Some(material) = material else {
        diagnostics.warn(
            DiagnosticCode::UnknownShader,
            DiagnosticContext::node(mesh_name),
            format!("mesh '{}' has no material, using {}", mesh_name, Shader::PdxMeshStandard),
        );
        let mut out = Material::lit(Shader::PdxMeshStandard);
        out.skinning = skinned;
        return out;
    };

    let shader = Shader::parse(material.str_of("shader").unwrap_or_default());
    if shader == Shader::Collision {
        return Material::collider();
    }
    if !shader.is_known() {
        diagnostics.warn(
            DiagnosticCode::UnknownShader,
            DiagnosticContext::node(mesh_name),
            format!("Unknown shader: {}", shader),
        );
    }

    let mut out = Material::lit(shader);
    out.diffuse = texture(material, "diff", NO_DIFFUSE, pdx_path);
    out.normal = texture(material, "n", NO_NORMAL, pdx_path);
    out.specular = texture(material, "spec", NO_SPECULAR, pdx_path);
    out.skinning = skinned;
    out
}

/// Shader written on export: the configured one, else one derived from the material.
pub fn export_shader(material: &Material, options: &ExportOptions) -> String {
    if let Some(shader) = &options.shader {
        return shader.clone();
    }
    if material.is_collider() {
        Shader::Collision.to_string()
    } else if material.transparent {
        Shader::PdxMeshAlphaBlend.to_string()
    } else if material.shader.is_known() {
        material.shader.to_string()
    } else {
        Shader::PdxMeshStandard.to_string()
    }
}

/// The `material` node of an exported mesh.
pub fn material_to_pdx(material: &Material, options: &ExportOptions) -> PdxNode {
    let base = &options.texture_base_name;
    PdxNode::object(
        "material",
        vec![
            PdxNode::string("shader", export_shader(material, options)),
            PdxNode::string("diff", format!("{}_diffuse.dds", base)),
            PdxNode::string("n", format!("{}_normal.dds", base)),
            PdxNode::string("spec", format!("{}_spec.dds", base)),
        ],
    )
}
