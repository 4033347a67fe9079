pub mod error;

pub mod client;
pub mod config;
pub mod identity;
pub mod persist;
pub mod profile;
pub mod prompt;
pub mod role;
pub mod session;
pub mod sign;
pub mod store;

pub mod cmd;

#[cfg(test)]
pub(crate) mod dev;
