pub mod error;
pub mod fields;
pub mod package;
pub mod settings;
pub mod xml;

pub use error::{MergeError, MergeOutcome, Result};
pub use fields::{FieldMap, Merger, DATE_KEY};
pub use settings::Settings;
