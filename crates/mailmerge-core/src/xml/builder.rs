use super::arena::XmlDocument;
use super::namespaces::{XML, XMLNS};
use super::node::XmlNodeData;
use super::xname::{XAttribute, XName};
use crate::error::{MergeError, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::collections::HashMap;
use std::io::Cursor;

pub fn serialize(doc: &XmlDocument) -> Result<String> {
    let bytes = serialize_bytes(doc)?;
    String::from_utf8(bytes).map_err(|e| MergeError::XmlWrite(e.to_string()))
}

pub fn serialize_bytes(doc: &XmlDocument) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .map_err(|e| MergeError::XmlWrite(e.to_string()))?;

    if let Some(root_id) = doc.root() {
        let mut namespace_map = NamespaceMap::new();
        if let Some(root_data) = doc.get(root_id) {
            if let Some(attrs) = root_data.attributes() {
                extend_namespace_map(&mut namespace_map, attrs);
            }
        }
        write_node(doc, root_id, &mut writer, &namespace_map)?;
    }

    Ok(writer.into_inner().into_inner())
}

/// Maps namespace URI to the prefix declared for it in the current scope.
type NamespaceMap = HashMap<String, String>;

fn extend_namespace_map(namespace_map: &mut NamespaceMap, attributes: &[XAttribute]) {
    for attr in attributes {
        let Some(ns) = &attr.name.namespace else {
            if attr.name.local_name == "xmlns" {
                // Default namespace declaration.
                namespace_map
                    .entry(attr.value.clone())
                    .or_insert_with(String::new);
            }
            continue;
        };

        if ns == XMLNS::NS {
            // xmlns:prefix="uri"
            namespace_map
                .entry(attr.value.clone())
                .or_insert_with(|| attr.name.local_name.clone());
        }
    }
}

fn prefix_for_namespace<'a>(namespace: &str, namespace_map: &'a NamespaceMap) -> &'a str {
    if let Some(prefix) = namespace_map.get(namespace) {
        return prefix.as_str();
    }
    fallback_prefix(namespace)
}

fn prefix_for_attribute<'a>(namespace: &str, namespace_map: &'a NamespaceMap) -> &'a str {
    if namespace == XMLNS::NS {
        return "xmlns";
    }
    if let Some(prefix) = namespace_map.get(namespace) {
        if !prefix.is_empty() {
            return prefix.as_str();
        }
    }
    fallback_prefix(namespace)
}

fn write_node<W: std::io::Write>(
    doc: &XmlDocument,
    node_id: indextree::NodeId,
    writer: &mut Writer<W>,
    namespace_map: &NamespaceMap,
) -> Result<()> {
    let Some(node_data) = doc.get(node_id) else {
        return Ok(());
    };

    match node_data {
        XmlNodeData::Element { name, attributes } => {
            write_element(doc, node_id, name, attributes, writer, namespace_map)?;
        }
        XmlNodeData::Text(text) => {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(|e| MergeError::XmlWrite(e.to_string()))?;
        }
        XmlNodeData::CData(text) => {
            writer
                .write_event(Event::CData(quick_xml::events::BytesCData::new(text)))
                .map_err(|e| MergeError::XmlWrite(e.to_string()))?;
        }
        XmlNodeData::Comment(text) => {
            writer
                .write_event(Event::Comment(BytesText::new(text)))
                .map_err(|e| MergeError::XmlWrite(e.to_string()))?;
        }
        XmlNodeData::ProcessingInstruction { target, data } => {
            let pi_content = if data.is_empty() {
                target.clone()
            } else {
                format!("{} {}", target, data)
            };
            writer
                .write_event(Event::PI(quick_xml::events::BytesPI::new(&pi_content)))
                .map_err(|e| MergeError::XmlWrite(e.to_string()))?;
        }
    }

    Ok(())
}

fn write_element<W: std::io::Write>(
    doc: &XmlDocument,
    node_id: indextree::NodeId,
    name: &XName,
    attributes: &[XAttribute],
    writer: &mut Writer<W>,
    namespace_map: &NamespaceMap,
) -> Result<()> {
    let mut scoped_map = namespace_map.clone();
    extend_namespace_map(&mut scoped_map, attributes);

    let tag_name = qualified_name(name, &scoped_map, false);
    let mut elem = BytesStart::new(&tag_name);

    for attr in attributes {
        let attr_name = qualified_name(&attr.name, &scoped_map, true);
        elem.push_attribute((attr_name.as_str(), attr.value.as_str()));
    }

    let children: Vec<_> = doc.children(node_id).collect();

    if children.is_empty() {
        writer
            .write_event(Event::Empty(elem))
            .map_err(|e| MergeError::XmlWrite(e.to_string()))?;
    } else {
        writer
            .write_event(Event::Start(elem))
            .map_err(|e| MergeError::XmlWrite(e.to_string()))?;

        for child_id in children {
            write_node(doc, child_id, writer, &scoped_map)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new(&tag_name)))
            .map_err(|e| MergeError::XmlWrite(e.to_string()))?;
    }

    Ok(())
}

fn qualified_name(name: &XName, scoped_map: &NamespaceMap, is_attribute: bool) -> String {
    match &name.namespace {
        Some(ns) => {
            let prefix = if is_attribute {
                prefix_for_attribute(ns, scoped_map)
            } else {
                prefix_for_namespace(ns, scoped_map)
            };
            if prefix.is_empty() {
                name.local_name.clone()
            } else {
                format!("{}:{}", prefix, name.local_name)
            }
        }
        None => name.local_name.clone(),
    }
}

fn fallback_prefix(namespace: &str) -> &'static str {
    match namespace {
        super::namespaces::W::NS => "w",
        XMLNS::NS => "xmlns",
        XML::NS => "xml",
        _ => "ns",
    }
}
