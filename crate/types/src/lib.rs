pub mod types;

pub use types::{BoxType, Primitive};
