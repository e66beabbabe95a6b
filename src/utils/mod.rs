pub mod bytereader;
pub mod error;
pub mod image;
pub mod logger;
pub mod macros;
pub(crate) mod traits;
pub mod writer;
