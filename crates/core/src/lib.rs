#![forbid(unsafe_code)]

pub mod completion;
pub mod error;
pub mod model;
pub mod navigation;
pub mod time;

pub use error::Error;
pub use time::Clock;
