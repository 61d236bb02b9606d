pub mod shop;
pub mod token;

pub use shop::*;
pub use token::*;
