//! Middleware components for the qlkube gateway
//!
//! - `honor_no_compression`: Lets clients opt out of gzip responses with the
//!   `x-no-compression` header

pub mod compression;

pub use compression::honor_no_compression;
