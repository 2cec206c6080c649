pub mod fetch;
pub mod search;

pub use fetch::*;
pub use search::*;
