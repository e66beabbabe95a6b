pub mod chunk;
pub mod crc;
pub mod decoder;
pub mod encoder;
pub mod expand;
pub mod filter;
pub mod header;
pub mod image;

pub use self::decoder::PngDecoder;
pub use self::header::{ColorType, Header, Palette};
pub use self::image::PngImage;
