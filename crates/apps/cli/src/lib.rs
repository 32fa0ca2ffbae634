//! Command-line front end for the ARGO dashboard core: the HTTP backend
//! source, environment configuration and the chat box's message log.

pub mod chat;
pub mod config;
pub mod data_sources;
