pub mod action;
pub mod filter;
pub mod rows;
pub mod view;

pub use action::*;
pub use filter::*;
pub use rows::*;
pub use view::*;
