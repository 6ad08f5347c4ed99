pub mod block;
pub mod coordinates;
pub mod element_view;
pub mod field;
pub mod instrument;
pub mod namespace;
pub mod observation;
pub mod path;
pub mod pointing;
pub mod target;
pub mod xml_tree;

pub use block::*;
pub use coordinates::*;
pub use element_view::*;
pub use field::*;
pub use instrument::*;
pub use namespace::*;
pub use observation::*;
pub use path::*;
pub use pointing::*;
pub use target::*;
pub use xml_tree::*;
