pub mod fees;
pub mod health;

pub use fees::*;
pub use health::*;
