pub mod footer;
pub mod overlay;
pub mod table;
pub mod text_input;
