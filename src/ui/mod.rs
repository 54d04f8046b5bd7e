pub mod panel;
pub mod render;
pub mod terminal;
