use cgmath::{InnerSpace, Matrix, Matrix3, Matrix4, Quaternion, SquareMatrix, Vector2, Vector3, Vector4};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdxVector3(pub Vector3<f32>);

impl PdxVector3 {
    pub fn from_slice(s: &[f32]) -> Self {
        PdxVector3(Vector3::new(s[0], s[1], s[2]))
    }

    pub fn to_slice(&self) -> [f32; 3] {
        let v = &self.0;
        [v.x, v.y, v.z]
    }

    /// Linear interpolation between two vectors
    pub fn lerp(&self, other: &PdxVector3, t: f32) -> PdxVector3 {
        PdxVector3(Vector3::new(
            self.0.x + (other.0.x - self.0.x) * t,
            self.0.y + (other.0.y - self.0.y) * t,
            self.0.z + (other.0.z - self.0.z) * t,
        ))
    }
}

/// Quaternion as stored in PDX animation data: `[x, y, z, w]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdxQuaternion(pub Quaternion<f32>);

impl PdxQuaternion {
    pub fn from_slice(s: &[f32]) -> Self {
        PdxQuaternion(Quaternion::new(s[3], s[0], s[1], s[2]))
    }

    pub fn to_slice(&self) -> [f32; 4] {
        let q = &self.0;
        [q.v.x, q.v.y, q.v.z, q.s]
    }

    /// Spherical linear interpolation between two quaternions
    pub fn slerp(&self, other: &PdxQuaternion, t: f32) -> PdxQuaternion {
        // negate one side when the dot product is negative so we take the shorter arc
        let mut q1 = other.0;
        let dot = self.0.s * other.0.s
            + self.0.v.x * other.0.v.x
            + self.0.v.y * other.0.v.y
            + self.0.v.z * other.0.v.z;
        if dot < 0.0 {
            q1 = Quaternion::new(-q1.s, -q1.v.x, -q1.v.y, -q1.v.z);
        }

        let result = self.0.slerp(q1, t);
        PdxQuaternion(result.normalize())
    }
}

/// The 12-value bone block (`tx`) of a PDX skeleton.
///
/// The values fill the upper 3x4 part of a homogeneous matrix: element `(row, col)` is
/// `tx[3 * col + row]`, the bottom row is fixed to `[0, 0, 0, 1]`. Import reads the block with
/// `from_tx` and export writes it back with `to_tx`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdxMatrix43(pub Matrix4<f32>);

impl PdxMatrix43 {
    pub fn from_tx(raw: &[f32; 12]) -> Self {
        PdxMatrix43(Matrix4::new(
            raw[0], raw[1], raw[2], 0.0,
            raw[3], raw[4], raw[5], 0.0,
            raw[6], raw[7], raw[8], 0.0,
            raw[9], raw[10], raw[11], 1.0,
        ))
    }

    // rows 0-2 of each of the four columns
    pub fn to_tx(&self) -> [f32; 12] {
        let m = &self.0;
        [
            m.x.x, m.x.y, m.x.z,
            m.y.x, m.y.y, m.y.z,
            m.z.x, m.z.y, m.z.z,
            m.w.x, m.w.y, m.w.z,
        ]
    }

    pub fn is_zero_block(raw: &[f32; 12]) -> bool {
        raw.iter().all(|v| *v == 0.0)
    }
}

pub fn invert(m: &Matrix4<f32>) -> Option<Matrix4<f32>> {
    m.invert()
}

pub fn transform_point(m: &Matrix4<f32>, p: Vector3<f32>) -> Vector3<f32> {
    (m * p.extend(1.0)).truncate()
}

/// Inverse-transpose of the upper 3x3, used to carry normals through a transform.
pub fn normal_matrix(m: &Matrix4<f32>) -> Matrix3<f32> {
    let upper = Matrix3::from_cols(m.x.truncate(), m.y.truncate(), m.z.truncate());
    upper
        .invert()
        .map(|inv| inv.transpose())
        .unwrap_or(upper)
}

pub fn transform_normal(normal_mat: &Matrix3<f32>, n: Vector3<f32>) -> Vector3<f32> {
    let out = normal_mat * n;
    if out.magnitude2() > 0.0 {
        out.normalize()
    } else {
        out
    }
}

/// Rotates the xyz part of a tangent and keeps the handedness in `w`.
pub fn transform_tangent(m: &Matrix4<f32>, t: Vector4<f32>) -> Vector4<f32> {
    let upper = Matrix3::from_cols(m.x.truncate(), m.y.truncate(), m.z.truncate());
    let xyz = upper * t.truncate();
    let xyz = if xyz.magnitude2() > 0.0 { xyz.normalize() } else { xyz };
    xyz.extend(t.w)
}

pub fn uv_from_slice(s: &[f32]) -> Vector2<f32> {
    Vector2::new(s[0], s[1])
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Aabb {
    pub fn empty() -> Self {
        Self {
            min: [f32::INFINITY; 3],
            max: [f32::NEG_INFINITY; 3],
        }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vector3<f32>>) -> Self {
        let mut aabb = Self::empty();
        for p in points {
            aabb.extend(p);
        }
        aabb
    }

    pub fn extend(&mut self, p: &Vector3<f32>) {
        let p = [p.x, p.y, p.z];
        for axis in 0..3 {
            if p[axis] < self.min[axis] {
                self.min[axis] = p[axis];
            }
            if p[axis] > self.max[axis] {
                self.max[axis] = p[axis];
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        (0..3).any(|axis| self.min[axis] > self.max[axis])
    }
}
