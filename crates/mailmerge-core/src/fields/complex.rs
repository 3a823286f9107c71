use super::field_map::FieldMap;
use super::text::replace_inner_text;
use super::MERGEFIELD_MARKER;
use crate::xml::namespaces::W;
use crate::xml::XmlDocument;
use indextree::NodeId;
use log::{debug, warn};

/// Begin, separator and end markers plus the text run: the runs a complete
/// field sequence carries beyond its instruction runs. Scanning is capped at
/// this count plus the instruction runs collected so far, so malformed input
/// cannot send the walk to the end of the document.
const BOILERPLATE_COUNT: usize = 3;

/// Merge complex fields (ECMA-376 17.16): a sequence of sibling `w:r` runs,
///
/// - `<w:r><w:fldChar w:fldCharType="begin"/></w:r>`
/// - one or more `<w:r><w:instrText>` runs, whose concatenated text is the
///   field instruction (authoring tools split long instructions arbitrarily)
/// - `<w:r><w:fldChar w:fldCharType="separate"/></w:r>`
/// - `<w:r><w:t>«Name»</w:t></w:r>` result text
/// - `<w:r><w:fldChar w:fldCharType="end"/></w:r>`
///
/// The text run is rewritten from `fields` and every other run in the
/// sequence removed. Per 17.16.18 a text run only counts after a separator;
/// no separator means no display slot, and the sequence is left alone.
pub fn merge_complex_fields(doc: &mut XmlDocument, fields: &FieldMap) {
    let Some(root) = doc.root() else {
        return;
    };

    let begin_runs: Vec<_> = doc
        .descendants(root)
        .filter(|&id| is_field_char_run(doc, id, "begin"))
        .collect();
    debug!(
        "Found {} <w:fldChar w:fldCharType='begin'> runs",
        begin_runs.len()
    );

    for begin_run in begin_runs {
        merge_one_sequence(doc, begin_run, fields);
    }
}

fn merge_one_sequence(doc: &mut XmlDocument, begin_run: NodeId, fields: &FieldMap) {
    let mut boilerplate = vec![begin_run];
    let mut instr_runs: Vec<NodeId> = Vec::new();
    let mut separator_seen = false;
    let mut text_run: Option<NodeId> = None;
    let mut replacement = String::new();

    let mut sibling = begin_run;
    let mut scanned = 0;
    while let Some(next) = doc.next_sibling(sibling) {
        sibling = next;
        // Whitespace between runs survives parsing as text nodes; only
        // elements count against the cap.
        if !is_element(doc, sibling) {
            continue;
        }
        scanned += 1;
        if scanned > BOILERPLATE_COUNT + instr_runs.len() {
            break;
        }

        if is_field_char_run(doc, sibling, "end") {
            boilerplate.push(sibling);
            break;
        } else if is_field_char_run(doc, sibling, "separate") {
            separator_seen = true;
            boilerplate.push(sibling);
        } else if separator_seen && doc.find_child(sibling, &W::t()).is_some() {
            // Keep scanning: later runs can still be unexpected lookups.
            text_run = Some(sibling);
        } else if let Some(instr_text) = instruction_text(doc, sibling) {
            if !instr_text.contains(MERGEFIELD_MARKER) {
                continue;
            }
            instr_runs.push(sibling);
            let mut combined = instr_text;

            // The instruction string may be wrapped across several adjacent
            // instrText runs; stitch them back together, stopping where a new
            // MERGEFIELD marker starts. Consumed runs are removed later with
            // the rest of the sequence.
            while let Some(peek) = doc.next_sibling(sibling) {
                if !is_element(doc, peek) {
                    sibling = peek;
                    continue;
                }
                let Some(more) = instruction_text(doc, peek) else {
                    break;
                };
                if more.contains(MERGEFIELD_MARKER) {
                    break;
                }
                instr_runs.push(peek);
                combined.push_str(&more);
                sibling = peek;
                scanned += 1;
            }

            match parse_field_name(&combined) {
                None => {
                    debug!("<w:instrText MERGEFIELD> with no field name noted for replacement");
                }
                Some(field_name) => match fields.get(field_name) {
                    Some(value) => {
                        debug!("Noting <w:instrText '{field_name}'> for replacement with {value}");
                        replacement = value.to_string();
                    }
                    None => {
                        warn!("Nothing in the field values for {}", combined.trim());
                    }
                },
            }
        }
    }

    if let Some(text_run) = text_run {
        replace_inner_text(doc, text_run, Some(&replacement));
        for node in boilerplate.into_iter().chain(instr_runs) {
            doc.remove(node);
        }
    } else if !instr_runs.is_empty() {
        warn!("Ignored an incomplete field sequence of {} instruction runs", instr_runs.len());
    }
}

fn is_element(doc: &XmlDocument, node: NodeId) -> bool {
    doc.get(node).is_some_and(|data| data.is_element())
}

/// Is this a `w:r` whose `w:fldChar` child carries the given fldCharType?
fn is_field_char_run(doc: &XmlDocument, node: NodeId, char_type: &str) -> bool {
    if !doc.is_element_named(node, &W::r()) {
        return false;
    }
    doc.find_child(node, &W::fldChar())
        .and_then(|fld| doc.attribute(fld, &W::fldCharType()))
        == Some(char_type)
}

fn instruction_text(doc: &XmlDocument, node: NodeId) -> Option<String> {
    let instr = doc.find_child(node, &W::instrText())?;
    Some(doc.inner_text(instr))
}

/// The token following the MERGEFIELD keyword in the instruction text.
fn parse_field_name(instruction: &str) -> Option<&str> {
    let mut tokens = instruction.split_whitespace();
    tokens.by_ref().find(|t| *t == "MERGEFIELD")?;
    tokens.next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::builder::serialize;
    use crate::xml::parser::parse;
    use pretty_assertions::assert_eq;

    fn document(runs: &str) -> String {
        format!(
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body><w:p>{runs}</w:p></w:body>
</w:document>"#
        )
    }

    fn complete_sequence(instr_runs: &str) -> String {
        document(&format!(
            r#"<w:r><w:fldChar w:fldCharType="begin"/></w:r>
               {instr_runs}
               <w:r><w:fldChar w:fldCharType="separate"/></w:r>
               <w:r><w:t>«Name»</w:t></w:r>
               <w:r><w:fldChar w:fldCharType="end"/></w:r>"#
        ))
    }

    #[test]
    fn parse_field_name_takes_token_after_keyword() {
        assert_eq!(
            parse_field_name("MERGEFIELD  Name  \\* MERGEFORMAT "),
            Some("Name")
        );
        assert_eq!(parse_field_name(" MERGEFIELD "), None);
        assert_eq!(parse_field_name("no marker here"), None);
    }

    #[test]
    fn complete_sequence_is_replaced_and_stripped() {
        let xml = complete_sequence(
            r#"<w:r><w:instrText xml:space="preserve">MERGEFIELD  Name  \* MERGEFORMAT </w:instrText></w:r>"#,
        );
        let mut doc = parse(&xml).unwrap();
        let fields = FieldMap::new([("Name", "Ada Lovelace")], false);

        merge_complex_fields(&mut doc, &fields);

        let out = serialize(&doc).unwrap();
        assert!(out.contains("<w:t>Ada Lovelace</w:t>"));
        assert!(!out.contains("MERGEFIELD"));
        assert!(!out.contains("fldChar"));
        assert!(!out.contains("«Name»"));
    }

    #[test]
    fn whitespace_between_runs_does_not_count_against_the_scan_cap() {
        // Authoring tools pretty-print parts; the text nodes between runs
        // must not push the end marker past the scan cap.
        let compact = document(
            r#"<w:r><w:fldChar w:fldCharType="begin"/></w:r><w:r><w:instrText xml:space="preserve">MERGEFIELD Name </w:instrText></w:r><w:r><w:fldChar w:fldCharType="separate"/></w:r><w:r><w:t>«Name»</w:t></w:r><w:r><w:fldChar w:fldCharType="end"/></w:r>"#,
        );
        let spaced = document(
            "\n  <w:r><w:fldChar w:fldCharType=\"begin\"/></w:r>\n  <w:r><w:instrText xml:space=\"preserve\">MERGEFIELD Name </w:instrText></w:r>\n  <w:r><w:fldChar w:fldCharType=\"separate\"/></w:r>\n  <w:r><w:t>«Name»</w:t></w:r>\n  <w:r><w:fldChar w:fldCharType=\"end\"/></w:r>\n",
        );

        for xml in [compact, spaced] {
            let mut doc = parse(&xml).unwrap();
            let fields = FieldMap::new([("Name", "Ada")], false);

            merge_complex_fields(&mut doc, &fields);

            let out = serialize(&doc).unwrap();
            assert!(out.contains("<w:t>Ada</w:t>"));
            assert!(!out.contains("MERGEFIELD"));
            assert!(!out.contains("fldChar"));
        }
    }

    #[test]
    fn instruction_split_across_runs_is_reassembled() {
        let xml = complete_sequence(
            r#"<w:r><w:instrText xml:space="preserve"> MERGEFIELD </w:instrText></w:r>
               <w:r><w:instrText xml:space="preserve"> Name \* MERGEFORMAT </w:instrText></w:r>"#,
        );
        let mut doc = parse(&xml).unwrap();
        let fields = FieldMap::new([("Name", "Ada")], false);

        merge_complex_fields(&mut doc, &fields);

        let out = serialize(&doc).unwrap();
        assert!(out.contains("<w:t>Ada</w:t>"));
        assert!(!out.contains("instrText"));
    }

    #[test]
    fn very_split_instruction_across_three_runs() {
        let xml = complete_sequence(
            r#"<w:r><w:instrText xml:space="preserve"> MERGEFIELD  SplitFie</w:instrText></w:r>
               <w:r><w:instrText xml:space="preserve">ldNa</w:instrText></w:r>
               <w:r><w:instrText xml:space="preserve">me \* MERGEFORMAT </w:instrText></w:r>"#,
        );
        let mut doc = parse(&xml).unwrap();
        let fields = FieldMap::new([("SplitFieldName", "after replacement")], false);

        merge_complex_fields(&mut doc, &fields);

        let out = serialize(&doc).unwrap();
        assert!(out.contains("<w:t>after replacement</w:t>"));
        assert!(!out.contains("MERGEFIELD "));
    }

    #[test]
    fn unmapped_field_still_clears_the_placeholder() {
        let xml = complete_sequence(
            r#"<w:r><w:instrText xml:space="preserve">MERGEFIELD Unknown </w:instrText></w:r>"#,
        );
        let mut doc = parse(&xml).unwrap();
        let fields = FieldMap::new([("Name", "Ada")], false);

        merge_complex_fields(&mut doc, &fields);

        let out = serialize(&doc).unwrap();
        assert!(!out.contains("«Name»"));
        assert!(!out.contains("MERGEFIELD"));
        assert!(out.contains("<w:t/>") || out.contains("<w:t></w:t>"));
    }

    #[test]
    fn missing_separator_leaves_sequence_intact() {
        let xml = document(
            r#"<w:r><w:fldChar w:fldCharType="begin"/></w:r>
               <w:r><w:instrText xml:space="preserve">MERGEFIELD Name </w:instrText></w:r>
               <w:r><w:t>«Name»</w:t></w:r>
               <w:r><w:fldChar w:fldCharType="end"/></w:r>"#,
        );
        let mut doc = parse(&xml).unwrap();
        let fields = FieldMap::new([("Name", "Ada")], false);

        merge_complex_fields(&mut doc, &fields);

        let out = serialize(&doc).unwrap();
        assert!(out.contains("«Name»"));
        assert!(out.contains("MERGEFIELD Name"));
        assert!(out.contains("fldCharType=\"begin\""));
    }

    #[test]
    fn missing_text_run_leaves_sequence_intact() {
        let xml = document(
            r#"<w:r><w:fldChar w:fldCharType="begin"/></w:r>
               <w:r><w:instrText xml:space="preserve">MERGEFIELD Name </w:instrText></w:r>
               <w:r><w:fldChar w:fldCharType="separate"/></w:r>
               <w:r><w:fldChar w:fldCharType="end"/></w:r>"#,
        );
        let mut doc = parse(&xml).unwrap();
        let fields = FieldMap::new([("Name", "Ada")], false);

        merge_complex_fields(&mut doc, &fields);

        let out = serialize(&doc).unwrap();
        assert!(out.contains("MERGEFIELD Name"));
        assert!(out.contains("fldCharType=\"separate\""));
    }

    #[test]
    fn field_names_match_case_insensitively_by_default() {
        let xml = complete_sequence(
            r#"<w:r><w:instrText xml:space="preserve">MERGEFIELD NAME </w:instrText></w:r>"#,
        );
        let mut doc = parse(&xml).unwrap();
        let fields = FieldMap::new([("name", "Ada")], false);

        merge_complex_fields(&mut doc, &fields);

        assert!(serialize(&doc).unwrap().contains("<w:t>Ada</w:t>"));
    }

    #[test]
    fn two_sequences_in_one_paragraph_both_merge() {
        let runs = r#"<w:r><w:fldChar w:fldCharType="begin"/></w:r>
            <w:r><w:instrText xml:space="preserve">MERGEFIELD First </w:instrText></w:r>
            <w:r><w:fldChar w:fldCharType="separate"/></w:r>
            <w:r><w:t>«First»</w:t></w:r>
            <w:r><w:fldChar w:fldCharType="end"/></w:r>
            <w:r><w:fldChar w:fldCharType="begin"/></w:r>
            <w:r><w:instrText xml:space="preserve">MERGEFIELD Last </w:instrText></w:r>
            <w:r><w:fldChar w:fldCharType="separate"/></w:r>
            <w:r><w:t>«Last»</w:t></w:r>
            <w:r><w:fldChar w:fldCharType="end"/></w:r>"#;
        let mut doc = parse(&document(runs)).unwrap();
        let fields = FieldMap::new([("First", "Ada"), ("Last", "Lovelace")], false);

        merge_complex_fields(&mut doc, &fields);

        let out = serialize(&doc).unwrap();
        assert!(out.contains("<w:t>Ada</w:t>"));
        assert!(out.contains("<w:t>Lovelace</w:t>"));
        assert!(!out.contains("MERGEFIELD"));
    }
}
