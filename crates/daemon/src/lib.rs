#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Bark daemon: serves the dog and idea API over HTTP and wires the registry
//! to its configured store and task queue backends.

pub mod config;
pub mod db;
pub mod http;
pub mod service;
pub mod tasks;
