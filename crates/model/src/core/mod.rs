pub mod encoding;
pub mod format;
pub mod value;
