//! Cover art module
//!
//! This module handles:
//! - Resolving a record's cover through the local/remote/placeholder chain
//! - Checking that a remote cover is a real image before showing it

pub mod probe;
pub mod resolver;

pub use probe::{HttpProbe, RemoteProbe};
pub use resolver::{CoverResolver, CoverSettings, ImageReference, RemotePolicy, DEFAULT_REMOTE_TEMPLATE};
