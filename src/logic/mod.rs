pub mod payload;
pub mod semester;

pub use payload::*;
pub use semester::*;
