// Data model shared between the analysis engine and whatever presents its output.
pub mod models;
pub mod utils;
