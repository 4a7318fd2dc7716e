use ptree::{item::StringItem, TreeBuilder};

use super::{PdxNode, PdxValue};

// how many leading values of a data leaf are shown before eliding
const PREVIEW_VALUES: usize = 4;

fn label(node: &PdxNode) -> String {
    match &node.value {
        PdxValue::Object(children) => format!("{} ({} children)", node.name, children.len()),
        PdxValue::Int(data) => format!("{}: int[{}] {}", node.name, data.len(), preview(data)),
        PdxValue::Float(data) => format!("{}: float[{}] {}", node.name, data.len(), preview(data)),
        PdxValue::String(data) => format!("{}: string[{}] {}", node.name, data.len(), preview(data)),
    }
}

fn preview<T: std::fmt::Debug>(data: &[T]) -> String {
    let shown: Vec<String> = data
        .iter()
        .take(PREVIEW_VALUES)
        .map(|v| format!("{:?}", v))
        .collect();
    if data.len() > PREVIEW_VALUES {
        format!("[{}, ...]", shown.join(", "))
    } else {
        format!("[{}]", shown.join(", "))
    }
}

fn add_node_to_tree(node: &PdxNode, tree: &mut TreeBuilder) {
    if node.is_object() && !node.children().is_empty() {
        tree.begin_child(label(node));
        for child in node.children() {
            add_node_to_tree(child, tree);
        }
        tree.end_child();
    } else {
        tree.add_empty_child(label(node));
    }
}

pub fn build_tree(root: &PdxNode) -> StringItem {
    let mut tree = TreeBuilder::new(label(root));
    for child in root.children() {
        add_node_to_tree(child, &mut tree);
    }
    tree.build()
}

/// Renders the tree the way `print_tree` shows it, for logs and tests.
pub fn render_tree(root: &PdxNode) -> std::io::Result<String> {
    let mut out = Vec::new();
    ptree::write_tree(&build_tree(root), &mut out)?;
    Ok(String::from_utf8_lossy(&out).to_string())
}

pub fn print_tree(root: &PdxNode) -> std::io::Result<()> {
    ptree::print_tree(&build_tree(root))
}
