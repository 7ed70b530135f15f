// Not every helper is used in every test binary
#![allow(dead_code)]

mod test_setup;
pub use test_setup::*;
mod utils;
pub use utils::*;
