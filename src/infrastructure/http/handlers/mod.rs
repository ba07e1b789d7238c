//! HTTP Handlers

mod ping;
mod proposal;
mod vote;

pub use ping::*;
pub use proposal::*;
pub use vote::*;
