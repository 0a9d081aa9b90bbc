pub mod buffer;
pub mod decode;
