use super::arena::XmlDocument;
use super::node::XmlNodeData;
use super::xname::{XAttribute, XName};
use crate::error::{MergeError, Result};
use std::collections::HashMap;

pub fn parse(xml: &str) -> Result<XmlDocument> {
    parse_bytes(xml.as_bytes())
}

pub fn parse_bytes(bytes: &[u8]) -> Result<XmlDocument> {
    let doc = roxmltree::Document::parse_with_options(
        std::str::from_utf8(bytes).map_err(|e| MergeError::XmlParse {
            message: e.to_string(),
            location: "input".to_string(),
        })?,
        roxmltree::ParsingOptions {
            allow_dtd: true,
            ..Default::default()
        },
    )
    .map_err(|e| MergeError::XmlParse {
        message: e.to_string(),
        location: format!("line {}", e.pos().row),
    })?;

    let mut xml_doc = XmlDocument::new();

    if doc.root_element().parent().is_some() {
        build_tree(doc.root_element(), &mut xml_doc, None, &HashMap::new());
    }

    Ok(xml_doc)
}

fn build_tree(
    node: roxmltree::Node,
    doc: &mut XmlDocument,
    parent: Option<indextree::NodeId>,
    in_scope: &HashMap<String, String>,
) {
    let node_data = match node.node_type() {
        roxmltree::NodeType::Element => {
            let name = XName::new(
                node.tag_name().namespace().unwrap_or(""),
                node.tag_name().name(),
            );

            let mut attributes: Vec<XAttribute> = node
                .attributes()
                .map(|attr| {
                    XAttribute::new(
                        XName::new(attr.namespace().unwrap_or(""), attr.name()),
                        attr.value(),
                    )
                })
                .collect();

            // roxmltree splits namespace declarations out of the attribute
            // list and reports every namespace in scope; fold back only the
            // declarations this element introduces so serialization can
            // re-emit them without repeating ancestors' declarations.
            let mut scope = in_scope.clone();
            for ns in node.namespaces() {
                if ns.uri() == super::namespaces::XML::NS {
                    continue;
                }
                let prefix = ns.name().unwrap_or("");
                if in_scope.get(prefix).map(String::as_str) == Some(ns.uri()) {
                    continue;
                }
                scope.insert(prefix.to_string(), ns.uri().to_string());
                if prefix.is_empty() {
                    attributes.push(XAttribute::new(XName::local("xmlns"), ns.uri()));
                } else {
                    attributes.push(XAttribute::new(
                        XName::new(super::namespaces::XMLNS::NS, prefix),
                        ns.uri(),
                    ));
                }
            }

            let new_id = match parent {
                Some(parent_id) => doc.add_child(parent_id, XmlNodeData::Element { name, attributes }),
                None => doc.add_root(XmlNodeData::Element { name, attributes }),
            };

            for child in node.children() {
                build_tree(child, doc, Some(new_id), &scope);
            }
            return;
        }
        roxmltree::NodeType::Text => match node.text() {
            Some(text) => XmlNodeData::Text(text.to_string()),
            None => return,
        },
        roxmltree::NodeType::Comment => match node.text() {
            Some(text) => XmlNodeData::Comment(text.to_string()),
            None => return,
        },
        roxmltree::NodeType::PI => XmlNodeData::ProcessingInstruction {
            target: node
                .pi()
                .map(|pi| pi.target.to_string())
                .unwrap_or_default(),
            data: node
                .pi()
                .and_then(|pi| pi.value.map(|s| s.to_string()))
                .unwrap_or_default(),
        },
        _ => return,
    };

    if let Some(parent_id) = parent {
        doc.add_child(parent_id, node_data);
    } else {
        doc.add_root(node_data);
    }
}
