pub mod factor;
pub mod run;
pub mod search;

pub use factor::*;
pub use run::*;
pub use search::*;
