pub mod helpers;

pub use helpers::*;
pub use test_world::*;
