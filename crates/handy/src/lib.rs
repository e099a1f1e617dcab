#![doc = include_str!("../README.md")]

mod delay;
mod duration;
mod error;
mod handler;
mod pace;
mod path;
mod redirect;
mod response;
mod status;

pub use crate::delay::*;
pub use crate::duration::*;
pub use crate::error::*;
pub use crate::handler::*;
pub use crate::pace::*;
pub use crate::redirect::*;
pub use crate::response::*;
pub use crate::status::*;
