use super::field_map::FieldMap;
use super::text::replace_inner_text;
use super::MERGEFIELD_MARKER;
use crate::xml::namespaces::W;
use crate::xml::XmlDocument;
use log::debug;

/// Replace the text of every simple field (ECMA-376 17.16.5.35) whose
/// instruction names a mapped merge field:
/// `<w:fldSimple w:instr=" MERGEFIELD Name "><w:r><w:t>«Name»</w:t></w:r></w:fldSimple>`
///
/// An unmapped field name commonly means "not merged this pass", so it is
/// skipped without comment. No nodes are removed here, only text rewritten.
pub fn merge_simple_fields(doc: &mut XmlDocument, fields: &FieldMap) {
    let Some(root) = doc.root() else {
        return;
    };

    // Snapshot before mutating; replace_inner_text inserts sibling nodes.
    let simple_fields: Vec<_> = doc
        .find_descendants(root, &W::fldSimple())
        .into_iter()
        .filter_map(|node| {
            let instr = doc.attribute(node, &W::instr())?;
            if !instr.contains(MERGEFIELD_MARKER) {
                return None;
            }
            let field_name = instr.split_whitespace().nth(1)?.to_string();
            Some((node, field_name))
        })
        .collect();

    for (node, field_name) in simple_fields {
        let Some(value) = fields.get(&field_name).map(str::to_string) else {
            continue;
        };
        for text_node in doc.find_descendants(node, &W::t()) {
            debug!(
                "Replacing <w:fldSimple w:instr='MERGEFIELD {field_name}'>...<w:t>{}</w:t> with {value}",
                doc.inner_text(text_node)
            );
            replace_inner_text(doc, text_node, Some(&value));
        }
    }
}
