use serde::{Deserialize, Serialize};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    /// A bone's declared `ix` differs from its position in the skeleton.
    BoneIndexMismatch,
    /// All twelve transform values of a bone are zero.
    ZeroBoneTransform,
    SingularBoneTransform,
    UnknownShader,
    AnimationBoneNotFound,
    /// A vertex carried more than four influences and was cut down.
    InfluencesTruncated,
    InfluenceCountClamped,
    /// A skin weight was NaN or infinite and its influence was dropped.
    InvalidSkinWeight,
    /// A skinned mesh was exported without a skeleton to bind to.
    SkinDropped,
    DuplicateBoneName,
    RootBoneAdded,
    MissingNormals,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::BoneIndexMismatch => "BONE_INDEX_MISMATCH",
            DiagnosticCode::ZeroBoneTransform => "ZERO_BONE_TRANSFORM",
            DiagnosticCode::SingularBoneTransform => "SINGULAR_BONE_TRANSFORM",
            DiagnosticCode::UnknownShader => "UNKNOWN_SHADER",
            DiagnosticCode::AnimationBoneNotFound => "ANIMATION_BONE_NOT_FOUND",
            DiagnosticCode::InfluencesTruncated => "INFLUENCES_TRUNCATED",
            DiagnosticCode::InfluenceCountClamped => "INFLUENCE_COUNT_CLAMPED",
            DiagnosticCode::InvalidSkinWeight => "INVALID_SKIN_WEIGHT",
            DiagnosticCode::SkinDropped => "SKIN_DROPPED",
            DiagnosticCode::DuplicateBoneName => "DUPLICATE_BONE_NAME",
            DiagnosticCode::RootBoneAdded => "ROOT_BONE_ADDED",
            DiagnosticCode::MissingNormals => "MISSING_NORMALS",
        }
    }
}

/// Where in the asset a diagnostic points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticContext {
    pub node: Option<String>,
    pub bone: Option<String>,
    pub vertex: Option<usize>,
}

impl DiagnosticContext {
    pub fn node(name: impl Into<String>) -> Self {
        Self {
            node: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn bone(name: impl Into<String>) -> Self {
        Self {
            bone: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_vertex(mut self, vertex: usize) -> Self {
        self.vertex = Some(vertex);
        self
    }
}

/// A single conversion finding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    /// Human-readable description.
    pub message: String,
    pub severity: Severity,
    pub context: DiagnosticContext,
}

/// Findings collected during one conversion call, returned next to its result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    pub items: Vec<Diagnostic>,
    pub error_count: u32,
    pub warning_count: u32,
    pub info_count: u32,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic, update counts and forward it to the log.
    pub fn add(&mut self, item: Diagnostic) {
        match item.severity {
            Severity::Error => {
                log::error!("[{}] {}", item.code.as_str(), item.message);
                self.error_count += 1;
            }
            Severity::Warning => {
                log::warn!("[{}] {}", item.code.as_str(), item.message);
                self.warning_count += 1;
            }
            Severity::Info => {
                log::info!("[{}] {}", item.code.as_str(), item.message);
                self.info_count += 1;
            }
        }
        self.items.push(item);
    }

    pub fn warn(&mut self, code: DiagnosticCode, context: DiagnosticContext, message: impl Into<String>) {
        self.add(Diagnostic {
            code,
            message: message.into(),
            severity: Severity::Warning,
            context,
        });
    }

    pub fn info(&mut self, code: DiagnosticCode, context: DiagnosticContext, message: impl Into<String>) {
        self.add(Diagnostic {
            code,
            message: message.into(),
            severity: Severity::Info,
            context,
        });
    }

    /// Merge another set of findings into this one.
    pub fn merge(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
        self.error_count += other.error_count;
        self.warning_count += other.warning_count;
        self.info_count += other.info_count;
    }

    pub fn has(&self, code: DiagnosticCode) -> bool {
        self.items.iter().any(|item| item.code == code)
    }

    pub fn with_code(&self, code: DiagnosticCode) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(move |item| item.code == code)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
