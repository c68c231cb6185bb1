pub mod citations;
pub mod tables;
pub mod years;

pub use citations::*;
pub use tables::{cast_column, read_table};
pub use years::*;
