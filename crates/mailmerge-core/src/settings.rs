/// Buffer and size limits for a merge run. Constructed in code; the CLI uses
/// the defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Upper bound on the size of a produced document.
    pub max_output_size: usize,
    /// Upper bound on the working buffer held in memory per document.
    pub max_in_memory_buffer_size: usize,
    /// Headroom multiplier applied to the input size when pre-sizing the
    /// output buffer, so typical merges avoid buffer-growth reallocations.
    pub output_headroom_factor: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_output_size: 100 * 1000 * 1000,
            max_in_memory_buffer_size: 10 * 1000 * 1000,
            output_headroom_factor: 1.2,
        }
    }
}

impl Settings {
    /// Pre-size the output buffer: base overhead, plus headroom over the
    /// input, plus twice the character length of every field name and value.
    pub fn output_buffer_capacity<'a>(
        &self,
        input_len: usize,
        fields: impl Iterator<Item = (&'a str, &'a str)>,
    ) -> usize {
        let field_chars: usize = fields.map(|(k, v)| k.len() + v.len()).sum();
        let estimate = 1024 + (input_len as f64 * self.output_headroom_factor) as usize
            + 2 * field_chars;
        estimate.min(self.max_output_size)
    }
}
