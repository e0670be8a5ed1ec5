//! HTTP middleware. Access logging runs innermost so it sees the final
//! handler status.

pub mod audit;
