//! Tracked shows and the pending-item resolver.
//!
//! A [`Show`] owns its seasons, their episodes and the snippet histories used
//! to build search queries. The resolver functions in this module decide which
//! seasons can be fetched as a bundle and which episodes have to be fetched
//! one by one.

mod pending;
mod types;

pub use types::*;
