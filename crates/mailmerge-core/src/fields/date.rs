use crate::xml::namespaces::W;
use crate::xml::{XmlDocument, XmlNodeData};
use chrono::NaiveDateTime;
use indextree::NodeId;
use log::debug;

/// Date-and-time field keywords substituted by default. ECMA-376 also names
/// CREATEDATE, EDITTIME and TIME; callers can pass their own list.
pub const DEFAULT_DATE_FIELDS: [&str; 3] = ["DATE", "PRINTDATE", "SAVEDATE"];

/// Replace date field instructions (ECMA-376 17.16) with rendered dates.
///
/// A caller-supplied `fixed_formatted` string always wins, verbatim. Failing
/// that, a `\@ "format"` code extracted from the instruction is translated
/// best-effort from the field-code date alphabet and applied to `date` (or
/// now). When neither yields text the date is rendered long-form. The
/// instruction node itself is swapped for a fresh `w:t` — date values are
/// single-line.
pub fn merge_date_fields(
    doc: &mut XmlDocument,
    date: Option<NaiveDateTime>,
    fixed_formatted: Option<&str>,
    date_fields: &[&str],
) {
    for keyword in date_fields {
        let needle = format!("{keyword} ");
        // One node per pass: the replacement removes the found node, so the
        // query must be repeated rather than snapshotted.
        while let Some(instr_node) = find_date_instruction(doc, &needle) {
            let instruction = doc.inner_text(instr_node);
            let rendered = fixed_formatted
                .map(str::to_string)
                .or_else(|| render_with_embedded_format(&instruction, date))
                .unwrap_or_else(|| long_date(date));

            debug!("Replacing <w:instrText '{keyword}'> with {rendered}");
            let replacement = doc.replace(instr_node, XmlNodeData::element(W::t()));
            doc.add_child(replacement, XmlNodeData::text(&rendered));
        }
    }
}

fn find_date_instruction(doc: &XmlDocument, needle: &str) -> Option<NodeId> {
    let root = doc.root()?;
    doc.find_descendants(root, &W::instrText())
        .into_iter()
        .find(|&id| doc.inner_text(id).contains(needle))
}

/// Extract the `\@` format code and apply it, or None when there is no
/// usable format. Formatting failures are swallowed; the caller falls back
/// to the long-date rendering.
fn render_with_embedded_format(instruction: &str, date: Option<NaiveDateTime>) -> Option<String> {
    let format = extract_format(instruction)?;
    // The field-code alphabet differs from the host's in case conventions:
    // uppercase day-of-month, date-scale b/B for year, A for day.
    let translated: String = format
        .chars()
        .map(|c| match c {
            'D' => 'd',
            'b' | 'B' => 'y',
            'A' => 'd',
            other => other,
        })
        .collect();
    let strftime = to_strftime(&translated)?;
    let rendered = now_if_none(date).format(&strftime).to_string();
    Some(rendered)
}

/// The format string lies between `\@` and the next backslash switch (or end
/// of string), wrapped in some mix of quotes, backslashes and spaces. No `\@`
/// introducer means no format at all, never "the whole instruction".
fn extract_format(instruction: &str) -> Option<&str> {
    let left = instruction.find("\\@")? + 2;
    let right = instruction[left..]
        .find('\\')
        .map(|i| left + i)
        .unwrap_or(instruction.len());
    let format = instruction[left..right].trim_matches(&[' ', '"', '\\'][..]);
    if format.is_empty() {
        None
    } else {
        Some(format)
    }
}

/// Translate a .NET-style date pattern (dd MMMM yyyy and friends) into a
/// chrono strftime string. Unknown letter runs pass through literally; this
/// is a best-effort bridge, not a full format engine.
fn to_strftime(pattern: &str) -> Option<String> {
    let mut out = String::with_capacity(pattern.len() * 2);
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let mut run = 1;
        while i + run < chars.len() && chars[i + run] == c {
            run += 1;
        }
        match (c, run) {
            ('d', 1) => out.push_str("%-d"),
            ('d', 2) => out.push_str("%d"),
            ('d', 3) => out.push_str("%a"),
            ('d', _) => out.push_str("%A"),
            ('M', 1) => out.push_str("%-m"),
            ('M', 2) => out.push_str("%m"),
            ('M', 3) => out.push_str("%b"),
            ('M', _) => out.push_str("%B"),
            ('y', 1) | ('y', 2) => out.push_str("%y"),
            ('y', _) => out.push_str("%Y"),
            ('H', 1) => out.push_str("%-H"),
            ('H', _) => out.push_str("%H"),
            ('h', 1) => out.push_str("%-I"),
            ('h', _) => out.push_str("%I"),
            ('m', 1) => out.push_str("%-M"),
            ('m', _) => out.push_str("%M"),
            ('s', 1) => out.push_str("%-S"),
            ('s', _) => out.push_str("%S"),
            ('t', _) => out.push_str("%p"),
            ('%', _) => {
                for _ in 0..run {
                    out.push_str("%%");
                }
            }
            _ => {
                for _ in 0..run {
                    out.push(c);
                }
            }
        }
        i += run;
    }
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Locale-long-date style rendering, the fallback when no format applies.
pub(crate) fn long_date(date: Option<NaiveDateTime>) -> String {
    now_if_none(date).format("%A, %-d %B %Y").to_string()
}

fn now_if_none(date: Option<NaiveDateTime>) -> NaiveDateTime {
    date.unwrap_or_else(|| chrono::Local::now().naive_local())
}
