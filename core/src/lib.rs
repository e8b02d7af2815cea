pub mod control;
pub mod error;
mod log;
mod readings;
pub mod threshold;
mod value;

pub use log::*;
pub use readings::*;
pub use value::*;
