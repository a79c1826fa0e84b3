//! HTTP middleware.

pub(crate) mod compose;
