pub mod archive;
pub mod client;
pub mod envelope;
pub mod multipart;

pub use archive::*;
pub use client::*;
pub use envelope::*;
pub use multipart::*;
