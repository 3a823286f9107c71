use crate::xml::namespaces::W;
use crate::xml::{XmlDocument, XmlNodeData};
use indextree::NodeId;
use log::warn;

/// Rewrite the text of a run (`w:r`) or text node (`w:t`) with a possibly
/// multi-line replacement. `None` means "nothing to substitute" and leaves
/// the original text untouched; `Some("")` clears it.
///
/// The first line overwrites the resolved text node. Every further line
/// becomes a new `w:t` whose first child is a `w:br`, chained as right
/// siblings so line order is preserved — embedded newlines never survive as
/// literal characters in a single text node.
pub fn replace_inner_text(doc: &mut XmlDocument, node: NodeId, replacement: Option<&str>) {
    let Some(replacement) = replacement else {
        return;
    };

    let is_run_or_text = doc.is_element_named(node, &W::r()) || doc.is_element_named(node, &W::t());
    if !is_run_or_text {
        let shape = doc
            .name(node)
            .map(|n| n.to_string())
            .unwrap_or_else(|| "non-element".to_string());
        warn!("replace_inner_text called with a node of type {shape}");
    }

    // A run resolves to its nested w:t; fall back to the node itself.
    let text_node = doc.find_child(node, &W::t()).unwrap_or(node);

    let lines = split_lines(replacement);
    let Some((first, rest)) = lines.split_first() else {
        return;
    };

    doc.set_inner_text(text_node, first);

    let mut last_written = text_node;
    for line in rest {
        let line_node = doc.add_after(last_written, XmlNodeData::element(W::t()));
        doc.add_child(line_node, XmlNodeData::element(W::br()));
        doc.add_child(line_node, XmlNodeData::text(line));
        last_written = line_node;
    }
}

/// Split on `\n`, `\r\n` and `\n\r` — source values can carry either order.
/// A lone `\r` is not a boundary.
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let bytes = text.as_bytes();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&text[start..i]);
                i += 1;
                if bytes.get(i) == Some(&b'\r') {
                    i += 1;
                }
                start = i;
            }
            b'\r' if bytes.get(i + 1) == Some(&b'\n') => {
                lines.push(&text[start..i]);
                i += 2;
                start = i;
            }
            _ => i += 1,
        }
    }
    lines.push(&text[start..]);
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::builder::serialize;
    use crate::xml::parser::parse;

    const RUN: &str = r#"<w:r xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:t>placeholder</w:t></w:r>"#;

    #[test]
    fn split_handles_all_newline_orders() {
        assert_eq!(split_lines("a\nb"), vec!["a", "b"]);
        assert_eq!(split_lines("a\r\nb"), vec!["a", "b"]);
        assert_eq!(split_lines("a\n\rb"), vec!["a", "b"]);
        assert_eq!(split_lines("no newline"), vec!["no newline"]);
        assert_eq!(split_lines("trailing\n"), vec!["trailing", ""]);
    }

    #[test]
    fn single_line_overwrites_text_in_place() {
        let mut doc = parse(RUN).unwrap();
        let run = doc.root().unwrap();

        replace_inner_text(&mut doc, run, Some("Ada"));

        let out = serialize(&doc).unwrap();
        assert!(out.contains("<w:t>Ada</w:t>"));
        assert!(!out.contains("placeholder"));
    }

    #[test]
    fn none_leaves_original_text_untouched() {
        let mut doc = parse(RUN).unwrap();
        let run = doc.root().unwrap();

        replace_inner_text(&mut doc, run, None);

        assert!(serialize(&doc).unwrap().contains("placeholder"));
    }

    #[test]
    fn empty_string_clears_the_text() {
        let mut doc = parse(RUN).unwrap();
        let run = doc.root().unwrap();

        replace_inner_text(&mut doc, run, Some(""));

        assert!(!serialize(&doc).unwrap().contains("placeholder"));
    }

    #[test]
    fn each_extra_line_gets_a_leading_break() {
        let mut doc = parse(RUN).unwrap();
        let run = doc.root().unwrap();

        replace_inner_text(&mut doc, run, Some("line one\nline two\nline three"));

        let text_nodes = doc.find_descendants(run, &W::t());
        assert_eq!(text_nodes.len(), 3);
        assert_eq!(doc.inner_text(text_nodes[0]), "line one");

        for (node, expected) in text_nodes[1..].iter().zip(["line two", "line three"]) {
            let children: Vec<_> = doc.children(*node).collect();
            assert!(doc.is_element_named(children[0], &W::br()));
            assert_eq!(doc.inner_text(*node), expected);
        }
    }

    #[test]
    fn text_node_passed_directly_is_accepted() {
        let mut doc = parse(RUN).unwrap();
        let run = doc.root().unwrap();
        let text_node = doc.find_child(run, &W::t()).unwrap();

        replace_inner_text(&mut doc, text_node, Some("direct"));

        assert_eq!(doc.inner_text(run), "direct");
    }
}
