//! Typed property reads that fail with `ConvertError` instead of panicking on bad input.

use super::error::{ConvertError, Result};
use crate::pdx::{PdxKind, PdxNode};

fn missing(node: &PdxNode, property: &str) -> ConvertError {
    ConvertError::MissingProperty {
        node: node.name.clone(),
        property: property.to_string(),
    }
}

fn wrong_kind(node: &PdxNode, property: &str, expected: &'static str) -> ConvertError {
    ConvertError::WrongKind {
        node: node.name.clone(),
        property: property.to_string(),
        expected,
    }
}

fn check_stride(node: &PdxNode, property: &str, data: &[f32], stride: usize) -> Result<()> {
    if data.len() % stride != 0 {
        return Err(ConvertError::BadStride {
            node: node.name.clone(),
            property: property.to_string(),
            stride,
            len: data.len(),
        });
    }
    Ok(())
}

/// Float leaf whose length is a multiple of `stride`, or `None` when absent.
pub(crate) fn optional_floats(node: &PdxNode, property: &str, stride: usize) -> Result<Option<Vec<f32>>> {
    let Some(child) = node.get(property) else {
        return Ok(None);
    };
    if child.is_object() || child.kind() == PdxKind::String {
        return Err(wrong_kind(node, property, "numeric data"));
    }
    let data = node
        .floats_of(property)
        .ok_or_else(|| wrong_kind(node, property, "numeric data"))?;
    check_stride(node, property, &data, stride)?;
    Ok(Some(data))
}

pub(crate) fn require_floats(node: &PdxNode, property: &str, stride: usize) -> Result<Vec<f32>> {
    optional_floats(node, property, stride)?.ok_or_else(|| missing(node, property))
}

pub(crate) fn require_ints<'a>(node: &'a PdxNode, property: &str) -> Result<&'a [i32]> {
    let child = node.get(property).ok_or_else(|| missing(node, property))?;
    child
        .as_ints()
        .ok_or_else(|| wrong_kind(node, property, "int data"))
}

pub(crate) fn optional_int(node: &PdxNode, property: &str) -> Result<Option<i32>> {
    match node.get(property) {
        None => Ok(None),
        Some(child) => match child.as_ints() {
            Some(data) => Ok(data.first().copied()),
            None => Err(wrong_kind(node, property, "int data")),
        },
    }
}

pub(crate) fn require_object<'a>(node: &'a PdxNode, property: &str) -> Result<&'a PdxNode> {
    let child = node.get(property).ok_or_else(|| missing(node, property))?;
    if !child.is_object() {
        return Err(wrong_kind(node, property, "an object"));
    }
    Ok(child)
}
