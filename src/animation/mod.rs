//! Rebuilds per-bone keyframe tracks from a PDX animation tree.
//!
//! The `info` node lists the animated bones with their base pose and a sampling mask (`sa`,
//! any of `t`, `q`, `s`). The `samples` node holds one packed buffer per channel; every frame
//! takes the next slice from each buffer for each bone whose mask enables that channel.

use cgmath::{Matrix4, Quaternion, Vector3};

use crate::converter::props::require_object;
use crate::converter::{ConvertError, Result};
use crate::diagnostics::{DiagnosticCode, DiagnosticContext, Diagnostics};
use crate::math::{PdxQuaternion, PdxVector3};
use crate::pdx::PdxNode;
use crate::skeleton::Skeleton;

/// Animation bone names that address a differently named model bone.
pub const BONE_ALIASES: [(&str, &str); 2] = [
    ("attack_L_hand", "Left_hand_node"),
    ("attack_R_hand", "Right_hand_node"),
];

/// Model bone an animation bone drives: same name first, then the alias table.
pub fn resolve_bone(skeleton: &Skeleton, name: &str) -> Option<usize> {
    skeleton.index_of(name).or_else(|| {
        BONE_ALIASES
            .iter()
            .find(|(from, _)| *from == name)
            .and_then(|(_, to)| skeleton.index_of(to))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SampleMask {
    pub translation: bool,
    pub rotation: bool,
    pub scale: bool,
}

impl SampleMask {
    pub fn parse(mask: &str) -> Self {
        Self {
            translation: mask.contains('t'),
            rotation: mask.contains('q'),
            scale: mask.contains('s'),
        }
    }

    pub fn any(&self) -> bool {
        self.translation || self.rotation || self.scale
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Keyframe {
    pub time: f32,
    pub position: Option<Vector3<f32>>,
    pub rotation: Option<Quaternion<f32>>,
    pub scale: Option<Vector3<f32>>,
}

impl Keyframe {
    /// Translation, then rotation, then scale; missing channels are left out.
    pub fn to_matrix(&self) -> Matrix4<f32> {
        let mut m = Matrix4::from_translation(self.position.unwrap_or(Vector3::new(0.0, 0.0, 0.0)));
        if let Some(rotation) = self.rotation {
            m = m * Matrix4::from(rotation);
        }
        if let Some(s) = self.scale {
            m = m * Matrix4::from_nonuniform_scale(s.x, s.y, s.z);
        }
        m
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoneTrack {
    pub name: String,
    /// Skeleton bone this track drives, `None` when it is skipped.
    pub bone: Option<usize>,
    /// Skeleton index of the driven bone's parent, `-1` for roots and skipped tracks.
    pub parent: i32,
    pub mask: SampleMask,
    /// The bone is not in the skeleton: its samples are consumed but not kept.
    pub skip_data: bool,
    /// Key 0 is the base pose at time 0; sampled keys follow in frame order.
    pub keys: Vec<Keyframe>,
}

fn lerp(a: Option<Vector3<f32>>, b: Option<Vector3<f32>>, t: f32) -> Option<Vector3<f32>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(PdxVector3(a).lerp(&PdxVector3(b), t).0),
        (a, b) => a.or(b),
    }
}

fn slerp(a: Option<Quaternion<f32>>, b: Option<Quaternion<f32>>, t: f32) -> Option<Quaternion<f32>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(PdxQuaternion(a).slerp(&PdxQuaternion(b), t).0),
        (a, b) => a.or(b),
    }
}

impl BoneTrack {
    pub fn base(&self) -> Option<&Keyframe> {
        self.keys.first()
    }

    /// Evaluates the track at `time`. Channels the samples do not carry fall back to the
    /// base pose. Times outside the sampled range clamp to the nearest key.
    pub fn sample(&self, time: f32) -> Option<Keyframe> {
        let base = self.keys.first()?;
        let keys = if self.keys.len() > 1 { &self.keys[1..] } else { &self.keys[..] };

        let (a, b, t) = match keys.iter().position(|key| key.time > time) {
            Some(0) => (&keys[0], &keys[0], 0.0),
            None => {
                let last = &keys[keys.len() - 1];
                (last, last, 0.0)
            }
            Some(i) => {
                let (a, b) = (&keys[i - 1], &keys[i]);
                let span = b.time - a.time;
                let t = if span > 0.0 { (time - a.time) / span } else { 0.0 };
                (a, b, t)
            }
        };

        Some(Keyframe {
            time,
            position: lerp(a.position, b.position, t).or(base.position),
            rotation: slerp(a.rotation, b.rotation, t).or(base.rotation),
            scale: lerp(a.scale, b.scale, t).or(base.scale),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    pub fps: f32,
    pub sample_count: usize,
    /// Seconds.
    pub length: f32,
    pub tracks: Vec<BoneTrack>,
}

impl AnimationClip {
    /// Local transforms of every driven bone at `time`.
    pub fn pose(&self, time: f32) -> Vec<(usize, Matrix4<f32>)> {
        self.tracks
            .iter()
            .filter_map(|track| {
                let bone = track.bone?;
                let key = track.sample(time)?;
                Some((bone, key.to_matrix()))
            })
            .collect()
    }
}

struct Channel {
    name: char,
    data: Vec<f32>,
    offset: usize,
}

impl Channel {
    fn new(samples: Option<&PdxNode>, name: char) -> Self {
        let data = samples
            .and_then(|samples| samples.floats_of(&name.to_string()))
            .unwrap_or_default();
        Self {
            name,
            data,
            offset: 0,
        }
    }

    fn take(&mut self, count: usize, bone: &str, sample: usize) -> Result<&[f32]> {
        let start = self.offset;
        let slice = self
            .data
            .get(start..start + count)
            .ok_or_else(|| ConvertError::SampleBufferExhausted {
                channel: self.name,
                bone: bone.to_string(),
                sample,
            })?;
        self.offset += count;
        Ok(slice)
    }
}

fn base_key(bone: &PdxNode) -> Keyframe {
    let position = bone
        .floats_of("t")
        .filter(|t| t.len() >= 3)
        .map(|t| PdxVector3::from_slice(&t).0);
    let rotation = bone
        .floats_of("q")
        .filter(|q| q.len() >= 4)
        .map(|q| PdxQuaternion::from_slice(&q).0);
    let scale = bone.float_of("s").map(|s| Vector3::new(s, s, s));
    Keyframe {
        time: 0.0,
        position,
        rotation,
        scale,
    }
}

/// Builds a clip from an animation tree for `skeleton`.
///
/// Fails with `NoSkeleton` when the skeleton is empty. Bones the skeleton does not have are
/// reported and still consume their samples, so the remaining tracks stay aligned.
pub fn sample_animation(animation: &PdxNode, skeleton: &Skeleton, diagnostics: &mut Diagnostics) -> Result<AnimationClip> {
    if skeleton.is_empty() {
        return Err(ConvertError::NoSkeleton);
    }

    let info = require_object(animation, "info")?;
    let fps = info.float_of("fps").ok_or_else(|| ConvertError::MissingProperty {
        node: info.name.clone(),
        property: "fps".to_string(),
    })?;
    if fps <= 0.0 {
        return Err(ConvertError::WrongKind {
            node: info.name.clone(),
            property: "fps".to_string(),
            expected: "a positive frame rate",
        });
    }
    let sample_count = info.int_of("sa").unwrap_or(0).max(0) as usize;

    let mut tracks = Vec::new();
    for bone in info.objects() {
        let mask = SampleMask::parse(bone.str_of("sa").unwrap_or_default());
        let index = resolve_bone(skeleton, &bone.name);
        if index.is_none() {
            diagnostics.warn(
                DiagnosticCode::AnimationBoneNotFound,
                DiagnosticContext::bone(bone.name.clone()),
                format!("Animation bone {} not found in model.", bone.name),
            );
        }
        let parent = index
            .and_then(|i| skeleton.get(i))
            .and_then(|b| b.parent)
            .map(|p| p as i32)
            .unwrap_or(-1);

        tracks.push(BoneTrack {
            name: bone.name.clone(),
            bone: index,
            parent,
            mask,
            skip_data: index.is_none(),
            keys: vec![base_key(bone)],
        });
    }

    let samples = animation.object_of("samples");
    let mut t = Channel::new(samples, 't');
    let mut q = Channel::new(samples, 'q');
    let mut s = Channel::new(samples, 's');

    for sample in 0..sample_count {
        let time = sample as f32 / fps;
        for track in tracks.iter_mut() {
            if !track.mask.any() {
                continue;
            }
            let mut key = Keyframe {
                time,
                position: None,
                rotation: None,
                scale: None,
            };
            if track.mask.translation {
                key.position = Some(PdxVector3::from_slice(t.take(3, &track.name, sample)?).0);
            }
            if track.mask.rotation {
                key.rotation = Some(PdxQuaternion::from_slice(q.take(4, &track.name, sample)?).0);
            }
            if track.mask.scale {
                let v = s.take(1, &track.name, sample)?[0];
                key.scale = Some(Vector3::new(v, v, v));
            }
            if !track.skip_data {
                track.keys.push(key);
            }
        }
    }

    log::debug!(
        "sampled {} frames at {} fps for {} tracks",
        sample_count,
        fps,
        tracks.len()
    );

    Ok(AnimationClip {
        name: animation.name.clone(),
        fps,
        sample_count,
        length: sample_count as f32 / fps,
        tracks,
    })
}
