pub mod models;
pub mod enums;

pub use models::*;
pub use enums::*;
