pub mod config;
pub mod coverage;
pub mod size;
pub mod util;
pub mod verify;

pub use config::*;
pub use coverage::*;
pub use size::*;
pub use util::*;
pub use verify::*;
