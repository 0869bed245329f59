//! Rule-based field extraction for one document.

mod builder;

pub use builder::{build, RecordBuilder};
