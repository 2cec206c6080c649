pub mod batch;
pub mod context;
pub mod error;
pub mod graph;
pub mod retry;
pub mod stage;

pub use batch::*;
pub use context::*;
pub use error::*;
pub use graph::*;
pub use retry::*;
pub use stage::*;
