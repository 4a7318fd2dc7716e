//! The PDX property tree.
//!
//! A PDX asset is a tree of named nodes. A node is either a container of child nodes or a
//! typed data leaf (ints, floats or strings), never both. Child lookups by name return the
//! first match; sibling names are unique in practice but the format does not enforce it.

pub mod io;
mod tree;

pub use tree::print_tree;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PdxKind {
    Object,
    Int,
    Float,
    String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum PdxValue {
    Object(Vec<PdxNode>),
    Int(Vec<i32>),
    Float(Vec<f32>),
    String(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdxNode {
    pub name: String,
    pub value: PdxValue,
}

impl PdxNode {
    pub fn object(name: impl Into<String>, children: Vec<PdxNode>) -> Self {
        Self {
            name: name.into(),
            value: PdxValue::Object(children),
        }
    }

    pub fn ints(name: impl Into<String>, data: Vec<i32>) -> Self {
        Self {
            name: name.into(),
            value: PdxValue::Int(data),
        }
    }

    pub fn floats(name: impl Into<String>, data: Vec<f32>) -> Self {
        Self {
            name: name.into(),
            value: PdxValue::Float(data),
        }
    }

    pub fn strings(name: impl Into<String>, data: Vec<String>) -> Self {
        Self {
            name: name.into(),
            value: PdxValue::String(data),
        }
    }

    pub fn string(name: impl Into<String>, data: impl Into<String>) -> Self {
        Self::strings(name, vec![data.into()])
    }

    pub fn kind(&self) -> PdxKind {
        match self.value {
            PdxValue::Object(_) => PdxKind::Object,
            PdxValue::Int(_) => PdxKind::Int,
            PdxValue::Float(_) => PdxKind::Float,
            PdxValue::String(_) => PdxKind::String,
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self.value, PdxValue::Object(_))
    }

    /// Child nodes of a container; empty for data leaves.
    pub fn children(&self) -> &[PdxNode] {
        match &self.value {
            PdxValue::Object(children) => children.as_slice(),
            _ => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<PdxNode>> {
        match &mut self.value {
            PdxValue::Object(children) => Some(children),
            _ => None,
        }
    }

    /// Number of data elements of a leaf, or of children of a container.
    pub fn len(&self) -> usize {
        match &self.value {
            PdxValue::Object(children) => children.len(),
            PdxValue::Int(data) => data.len(),
            PdxValue::Float(data) => data.len(),
            PdxValue::String(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First child called `name`.
    pub fn get(&self, name: &str) -> Option<&PdxNode> {
        self.children().iter().find(|child| child.name == name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Child containers, skipping data leaves.
    pub fn objects(&self) -> impl Iterator<Item = &PdxNode> {
        self.children().iter().filter(|child| child.is_object())
    }

    pub fn as_ints(&self) -> Option<&[i32]> {
        match &self.value {
            PdxValue::Int(data) => Some(data.as_slice()),
            _ => None,
        }
    }

    pub fn as_floats(&self) -> Option<&[f32]> {
        match &self.value {
            PdxValue::Float(data) => Some(data.as_slice()),
            _ => None,
        }
    }

    pub fn as_strings(&self) -> Option<&[String]> {
        match &self.value {
            PdxValue::String(data) => Some(data.as_slice()),
            _ => None,
        }
    }

    /// Float data of the child `name`. Int leaves are widened, since writers are not always
    /// consistent about integral float arrays.
    pub fn floats_of(&self, name: &str) -> Option<Vec<f32>> {
        let child = self.get(name)?;
        match &child.value {
            PdxValue::Float(data) => Some(data.clone()),
            PdxValue::Int(data) => Some(data.iter().map(|v| *v as f32).collect()),
            _ => None,
        }
    }

    pub fn ints_of(&self, name: &str) -> Option<&[i32]> {
        self.get(name).and_then(PdxNode::as_ints)
    }

    pub fn int_of(&self, name: &str) -> Option<i32> {
        self.ints_of(name).and_then(|data| data.first().copied())
    }

    pub fn float_of(&self, name: &str) -> Option<f32> {
        self.floats_of(name).and_then(|data| data.first().copied())
    }

    pub fn str_of(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(PdxNode::as_strings)
            .and_then(|data| data.first())
            .map(String::as_str)
    }

    pub fn object_of(&self, name: &str) -> Option<&PdxNode> {
        self.get(name).filter(|child| child.is_object())
    }
}
