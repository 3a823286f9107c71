pub mod docx;

pub use docx::{DocxPackage, MAIN_DOCUMENT_PART};
