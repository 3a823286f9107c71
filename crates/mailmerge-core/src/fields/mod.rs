pub mod complex;
pub mod date;
pub mod field_map;
pub mod merger;
pub mod simple;
pub mod text;

pub use complex::merge_complex_fields;
pub use date::{merge_date_fields, DEFAULT_DATE_FIELDS};
pub use field_map::FieldMap;
pub use merger::{Merger, DATE_KEY};
pub use simple::merge_simple_fields;
pub use text::replace_inner_text;

/// Field-code keyword that marks a merge field instruction.
pub(crate) const MERGEFIELD_MARKER: &str = "MERGEFIELD ";
