//! Markup serialization of captured trees.

use crate::node::{Arena, Node, NodeId};

/// Serialize the children of `id` back to markup.
///
/// Text is written verbatim and attribute values are not escaped: captured
/// content was raw markup to begin with. Every element gets a closing tag,
/// void elements included.
#[must_use]
pub fn serialize(arena: &Arena, id: NodeId) -> String {
    let mut html = String::new();
    write_children(arena, id, &mut html);
    html
}

fn write_children(arena: &Arena, id: NodeId, html: &mut String) {
    for &child in arena.get(id).children() {
        match arena.get(child) {
            Node::Text { content } => html.push_str(content),
            Node::Element {
                tag, attributes, ..
            } => {
                html.push('<');
                html.push_str(tag);
                for (name, value) in attributes.iter() {
                    html.push(' ');
                    html.push_str(name);
                    html.push_str("=\"");
                    html.push_str(value);
                    html.push('"');
                }
                html.push('>');
                write_children(arena, child, html);
                html.push_str("</");
                html.push_str(tag);
                html.push('>');
            }
            Node::Root { .. } => write_children(arena, child, html),
        }
    }
}
