//! CLI command implementations.

pub(crate) mod compose;
pub(crate) mod serve;

pub(crate) use compose::ComposeArgs;
pub(crate) use serve::ServeArgs;
