pub mod error;
pub mod model;
pub mod patch;
pub mod traits;
