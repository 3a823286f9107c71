use super::complex::merge_complex_fields;
use super::date::{long_date, merge_date_fields, DEFAULT_DATE_FIELDS};
use super::field_map::FieldMap;
use super::simple::merge_simple_fields;
use crate::error::{MergeError, MergeOutcome, Result};
use crate::package::DocxPackage;
use crate::settings::Settings;
use crate::xml::XmlDocument;
use chrono::NaiveDateTime;
use log::{debug, trace};
use std::collections::HashMap;
use std::path::Path;

/// Field name whose mapped value, when present, substitutes DATE fields.
pub const DATE_KEY: &str = "DATE";

/// Populates merge fields in docx documents, from byte buffers or files.
///
/// One `Merger` holds only read-only configuration, so separate documents in
/// a batch may be merged from separate invocations in parallel; each call
/// owns its own buffer and trees.
pub struct Merger {
    settings: Settings,
    date: Option<NaiveDateTime>,
    case_sensitive: bool,
}

impl Merger {
    pub fn new() -> Self {
        Self {
            settings: Settings::default(),
            date: None,
            case_sensitive: false,
        }
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Date used for DATE/PRINTDATE/SAVEDATE substitution when the field map
    /// carries no `DATE` entry. Defaults to the current date.
    pub fn with_date(mut self, date: NaiveDateTime) -> Self {
        self.date = Some(date);
        self
    }

    /// Opt out of the default case-insensitive field-name matching.
    pub fn match_field_names_case_sensitively(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Merge `field_values` into the docx in `input`, returning the merged
    /// package bytes plus any collected errors. An empty field map returns a
    /// byte-for-byte copy of the input.
    pub fn merge(&self, input: &[u8], field_values: &HashMap<String, String>) -> MergeOutcome {
        if field_values.is_empty() {
            debug!("Starting merge with empty field values");
        } else {
            trace!("Starting merge with {} field values", field_values.len());
        }

        // The full input is buffered before any transform touches it; the
        // caller's bytes are never mutated.
        let capacity = self.settings.output_buffer_capacity(
            input.len(),
            field_values.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        );
        let mut buffer = Vec::with_capacity(capacity);
        buffer.extend_from_slice(input);

        if field_values.is_empty() {
            return MergeOutcome::success(buffer);
        }

        let fields = FieldMap::from_map(field_values, self.case_sensitive);
        match self.apply_transforms(&buffer, &fields) {
            Ok(merged) => MergeOutcome::success(merged),
            Err(e) => MergeOutcome::failure(vec![e]),
        }
    }

    /// Merge into the document at `input_path`, returning the merged bytes.
    pub fn merge_file(
        &self,
        input_path: impl AsRef<Path>,
        field_values: &HashMap<String, String>,
    ) -> MergeOutcome {
        if let Some(error) = validate_input_file(input_path.as_ref()) {
            return MergeOutcome::failure(vec![error]);
        }
        match std::fs::read(input_path.as_ref()) {
            Ok(bytes) => self.merge(&bytes, field_values),
            Err(e) => MergeOutcome::failure(vec![e.into()]),
        }
    }

    /// Merge the document at `input_path` and save the result to
    /// `output_path`, which must not already exist.
    pub fn merge_file_to(
        &self,
        input_path: impl AsRef<Path>,
        field_values: &HashMap<String, String>,
        output_path: impl AsRef<Path>,
    ) -> MergeOutcome {
        let errors: Vec<MergeError> = [
            validate_input_file(input_path.as_ref()),
            validate_output_file(output_path.as_ref()),
        ]
        .into_iter()
        .flatten()
        .collect();
        if !errors.is_empty() {
            return MergeOutcome::failure(errors);
        }

        let mut outcome = self.merge_file(input_path, field_values);
        if let Some(bytes) = &outcome.output {
            if let Err(e) = std::fs::write(output_path.as_ref(), bytes) {
                outcome.output = None;
                outcome.errors.push(e.into());
            }
        }
        outcome
    }

    /// Merge a batch of (input, output) pairs. One pair's failure never
    /// aborts the rest; each outcome carries its own collected errors.
    pub fn merge_files(
        &self,
        pairs: &[(impl AsRef<Path>, impl AsRef<Path>)],
        field_values: &HashMap<String, String>,
    ) -> Vec<MergeOutcome> {
        pairs
            .iter()
            .map(|(input, output)| self.merge_file_to(input, field_values, output))
            .collect()
    }

    fn apply_transforms(&self, buffer: &[u8], fields: &FieldMap) -> Result<Vec<u8>> {
        let mut package = DocxPackage::open(buffer)?;

        // A DATE entry in the field map wins; next a configured date,
        // rendered long-form; otherwise each field's own format code decides.
        let date_value = fields
            .get(DATE_KEY)
            .map(str::to_string)
            .or_else(|| self.date.map(|d| long_date(Some(d))));

        let mut main = package.main_document()?;
        self.run_passes(&mut main, fields, date_value.as_deref());
        package.put_xml_part(crate::package::MAIN_DOCUMENT_PART, &main)?;

        // Header and footer parts get the identical pass, each part parsed
        // and serialized independently of the body tree.
        for part_name in package.header_footer_parts() {
            let mut part = package.get_xml_part(&part_name)?;
            self.run_passes(&mut part, fields, date_value.as_deref());
            package.put_xml_part(&part_name, &part)?;
        }

        package.save()
    }

    fn run_passes(&self, doc: &mut XmlDocument, fields: &FieldMap, date_value: Option<&str>) {
        merge_simple_fields(doc, fields);
        merge_complex_fields(doc, fields);
        merge_date_fields(doc, self.date, date_value, &DEFAULT_DATE_FIELDS);
    }
}

impl Default for Merger {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_input_file(path: &Path) -> Option<MergeError> {
    if path.as_os_str().is_empty() || path.to_string_lossy().trim().is_empty() {
        return Some(MergeError::missing_argument("input_path"));
    }
    if !path.exists() {
        return Some(MergeError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    None
}

fn validate_output_file(path: &Path) -> Option<MergeError> {
    if path.as_os_str().is_empty() || path.to_string_lossy().trim().is_empty() {
        return Some(MergeError::missing_argument("output_path"));
    }
    if path.exists() {
        return Some(MergeError::OutputExists {
            path: path.display().to_string(),
        });
    }
    // Probe writability with a placeholder; the probe file is deleted on
    // every exit path so success never leaves a zero-byte output behind.
    let probe = std::fs::File::create(path);
    let error = match probe {
        Ok(_) => None,
        Err(e) => Some(MergeError::Io(e)),
    };
    let _ = std::fs::remove_file(path);
    error
}
