//! HTTP service collecting one feedback per user and session, and serving
//! the most recent feedback of a session.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interface;
pub mod server;
pub mod util;

#[cfg(test)]
pub(crate) mod test_support;
