pub mod classify;
pub mod config;
pub mod convert;
pub mod date;
pub mod gps;
pub mod leapsecs;
pub mod logging;
pub mod nist;
pub mod token;

pub use crate::leapsecs::*;
