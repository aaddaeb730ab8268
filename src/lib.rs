#![forbid(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod extract;
pub mod formats;
pub mod grade;
pub mod logging;
pub mod repository;
pub mod session;
pub mod snapshot;
pub mod term;
