use crate::converter::{ConvertError, Result};
use crate::diagnostics::{DiagnosticCode, DiagnosticContext, Diagnostics};
use crate::scene::SkinData;
use crate::skeleton::Skeleton;

/// Influence slots per vertex in the PDX format.
pub const MAX_INFLUENCES: usize = 4;

/// Skin data ready for the `skin` node: skeleton indices, four slots per vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedSkin {
    /// Number of leading slots that carry influences on at least one vertex.
    pub bones_used: usize,
    pub indices: Vec<[i32; 4]>,
    pub weights: Vec<[f32; 4]>,
}

/// Cuts a vertex down to the four heaviest influences and renormalises them.
///
/// Zero-weight and non-finite entries are dropped first. Returns `true` when influences had to
/// be discarded; a vertex within the limit keeps its weights as given.
pub fn limit_influences(influences: &[(i32, f32)]) -> ([i32; 4], [f32; 4], bool) {
    let mut pairs: Vec<(i32, f32)> = influences
        .iter()
        .copied()
        .filter(|(_, w)| w.is_finite() && *w > 0.0)
        .collect();

    let truncated = pairs.len() > MAX_INFLUENCES;
    if truncated {
        pairs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        pairs.truncate(MAX_INFLUENCES);
    }

    let mut indices = [-1i32; 4];
    let mut weights = [0.0f32; 4];
    for (k, (index, weight)) in pairs.iter().enumerate() {
        indices[k] = *index;
        weights[k] = *weight;
    }

    if truncated {
        let sum: f32 = weights.iter().sum();
        if sum > 0.0 {
            for w in weights.iter_mut() {
                *w /= sum;
            }
        }
    }

    (indices, weights, truncated)
}

/// Maps mesh-local bone references to skeleton indices and packs them into four slots.
///
/// Influences are compacted to the front so `bones_used` covers every one of them. Slots past
/// a vertex's influences repeat its first bone index with weight 0. Weights that are NaN or
/// infinite carry no usable influence; they are dropped and reported.
pub fn pack_skin(
    mesh: &str,
    skin: &SkinData,
    skeleton: &Skeleton,
    vertex_count: usize,
    diagnostics: &mut Diagnostics,
) -> Result<PackedSkin> {
    let mut resolved: Vec<Vec<(i32, f32)>> = Vec::with_capacity(vertex_count);
    let mut bones_used = 0usize;

    for v in 0..vertex_count {
        let mut influences = Vec::with_capacity(MAX_INFLUENCES);
        if let (Some(indices), Some(weights)) = (skin.indices.get(v), skin.weights.get(v)) {
            for k in 0..MAX_INFLUENCES {
                let (local, weight) = (indices[k], weights[k]);
                if local < 0 {
                    continue;
                }
                if !weight.is_finite() {
                    diagnostics.warn(
                        DiagnosticCode::InvalidSkinWeight,
                        DiagnosticContext::node(mesh).with_vertex(v),
                        format!(
                            "vertex {} of '{}' has weight {} in slot {}, influence dropped",
                            v, mesh, weight, k
                        ),
                    );
                    continue;
                }
                if weight <= 0.0 {
                    continue;
                }
                let name = skin
                    .bone_names
                    .get(local as usize)
                    .ok_or_else(|| ConvertError::UnknownSkinBone {
                        mesh: mesh.to_string(),
                        bone: format!("#{}", local),
                    })?;
                let index = skeleton
                    .index_of(name)
                    .ok_or_else(|| ConvertError::UnknownSkinBone {
                        mesh: mesh.to_string(),
                        bone: name.clone(),
                    })?;
                influences.push((index as i32, weight));
            }
        }

        let count: usize = influences.iter().map(|(_, w)| w.ceil() as usize).sum();
        bones_used = bones_used.max(count.max(influences.len()).min(MAX_INFLUENCES));
        resolved.push(influences);
    }

    let mut indices = Vec::with_capacity(vertex_count);
    let mut weights = Vec::with_capacity(vertex_count);
    for influences in &resolved {
        let base = influences.first().map(|(index, _)| *index).unwrap_or(0);
        let mut ix = [base; 4];
        let mut w = [0.0f32; 4];
        for (k, (index, weight)) in influences.iter().enumerate().take(bones_used) {
            ix[k] = *index;
            w[k] = *weight;
        }
        indices.push(ix);
        weights.push(w);
    }

    Ok(PackedSkin {
        bones_used,
        indices,
        weights,
    })
}
