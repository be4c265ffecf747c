pub mod fields;
pub mod text;
