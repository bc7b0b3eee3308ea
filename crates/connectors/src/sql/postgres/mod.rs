pub mod source;
pub mod typemap;
pub mod utils;

pub use source::PgSource;
