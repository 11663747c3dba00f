mod render;

pub use render::*;
