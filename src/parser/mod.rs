//! Parser module: description text to resolved model.

pub mod block;
pub mod join;
pub mod resolve;

pub use block::parse;
pub use resolve::{resolve, ResolvedClass};
