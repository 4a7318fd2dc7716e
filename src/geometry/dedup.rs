use cgmath::{Vector2, Vector3};

/// What makes two face corners the same output vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct CornerKey {
    pub vertex: u32,
    pub normal: Vector3<f32>,
    /// One entry per UV channel; `None` when the face has no data for that channel.
    pub uvs: Vec<Option<Vector2<f32>>>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dedup {
    /// Output vertex of every corner, three per face.
    pub corner_vertices: Vec<u32>,
    /// Original vertex each output vertex is copied from. The first `vertex_count` entries
    /// are the originals themselves.
    pub sources: Vec<u32>,
}

impl Dedup {
    pub fn vertex_count(&self) -> usize {
        self.sources.len()
    }
}

fn same(a: f32, b: f32) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

impl CornerKey {
    /// Attribute equality with NaN equal to NaN.
    fn matches(&self, other: &CornerKey) -> bool {
        same(self.normal.x, other.normal.x)
            && same(self.normal.y, other.normal.y)
            && same(self.normal.z, other.normal.z)
            && self.uvs.len() == other.uvs.len()
            && self.uvs.iter().zip(&other.uvs).all(|pair| match pair {
                (Some(a), Some(b)) => same(a.x, b.x) && same(a.y, b.y),
                (None, None) => true,
                _ => false,
            })
    }
}

/// Gives every distinct (vertex, normal, UVs) combination its own output vertex.
///
/// The first combination seen for a vertex keeps the original index; each further distinct
/// combination is appended after all originals in order of first appearance. Matching is
/// exact, no epsilon, except that NaN equals NaN. Corners must reference vertices below
/// `vertex_count`.
pub fn deduplicate_vertices(vertex_count: usize, corners: &[CornerKey]) -> Dedup {
    let mut sources: Vec<u32> = (0..vertex_count as u32).collect();
    // per original vertex: (first corner with that combination, output vertex)
    let mut seen: Vec<Vec<(usize, u32)>> = vec![Vec::new(); vertex_count];
    let mut corner_vertices = Vec::with_capacity(corners.len());

    for (i, key) in corners.iter().enumerate() {
        let entries = &mut seen[key.vertex as usize];
        let existing = entries
            .iter()
            .find(|(first, _)| corners[*first].matches(key))
            .map(|(_, out)| *out);

        let out = match existing {
            Some(out) => out,
            None => {
                let out = if entries.is_empty() {
                    key.vertex
                } else {
                    let out = sources.len() as u32;
                    sources.push(key.vertex);
                    out
                };
                entries.push((i, out));
                out
            }
        };
        corner_vertices.push(out);
    }

    Dedup {
        corner_vertices,
        sources,
    }
}
