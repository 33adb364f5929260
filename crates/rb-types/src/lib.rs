pub mod model;
pub mod wire;
pub mod report;
pub mod config;
pub mod errors;

pub use model::*;
pub use wire::*;
pub use report::*;
pub use config::*;
pub use errors::*;
