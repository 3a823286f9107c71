use std::collections::HashMap;
use std::path::PathBuf;

/// Split positional arguments into (input, output) file pairs and
/// `name=value` field assignments. Assignments may appear anywhere; the
/// remaining arguments pair up odd/even in order. A trailing unpaired input
/// is dropped.
pub fn split_merge_args(args: &[String]) -> (Vec<(PathBuf, PathBuf)>, HashMap<String, String>) {
    let mut files = Vec::new();
    let mut fields = HashMap::new();
    let mut pending_input: Option<PathBuf> = None;

    for arg in args {
        if let Some((key, value)) = arg.split_once('=') {
            fields.insert(key.to_string(), value.to_string());
        } else if let Some(input) = pending_input.take() {
            files.push((input, PathBuf::from(arg)));
        } else {
            pending_input = Some(PathBuf::from(arg));
        }
    }

    (files, fields)
}
