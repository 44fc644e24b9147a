pub mod coverage;
pub mod pipeline;
pub mod size;
pub mod tools;
