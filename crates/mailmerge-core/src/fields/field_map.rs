use std::collections::HashMap;

/// Read-only name-to-value store for one merge call. Lookups are
/// case-insensitive unless the merge was configured for case-sensitive
/// matching; the fold happens once at construction, never against the
/// caller's own map.
#[derive(Debug, Clone)]
pub struct FieldMap {
    values: HashMap<String, String>,
    case_sensitive: bool,
}

impl FieldMap {
    pub fn new<'a>(
        fields: impl IntoIterator<Item = (&'a str, &'a str)>,
        case_sensitive: bool,
    ) -> Self {
        let values = fields
            .into_iter()
            .map(|(k, v)| (fold_key(k, case_sensitive), v.to_string()))
            .collect();
        Self {
            values,
            case_sensitive,
        }
    }

    pub fn from_map(fields: &HashMap<String, String>, case_sensitive: bool) -> Self {
        Self::new(
            fields.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            case_sensitive,
        )
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(&fold_key(name, self.case_sensitive))
            .map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

fn fold_key(key: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        key.to_string()
    } else {
        key.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive_by_default() {
        let fields = FieldMap::new([("FirstName", "Ada")], false);
        assert_eq!(fields.get("firstname"), Some("Ada"));
        assert_eq!(fields.get("FIRSTNAME"), Some("Ada"));
    }

    #[test]
    fn case_sensitive_mode_requires_exact_match() {
        let fields = FieldMap::new([("FirstName", "Ada")], true);
        assert_eq!(fields.get("FirstName"), Some("Ada"));
        assert_eq!(fields.get("firstname"), None);
    }

    #[test]
    fn building_does_not_mutate_the_callers_map() {
        let mut caller = HashMap::new();
        caller.insert("MixedCase".to_string(), "v".to_string());
        let fields = FieldMap::from_map(&caller, false);
        assert!(fields.contains("mixedcase"));
        assert!(caller.contains_key("MixedCase"));
    }
}
