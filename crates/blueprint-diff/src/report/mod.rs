pub mod analysis;
pub mod html;
pub mod terminal;
