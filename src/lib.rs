#![forbid(unsafe_code)]

pub mod app;
pub mod cli;
pub mod commands;
pub mod logging;
pub mod model;
pub mod prefs;
pub mod reader;
pub mod refs;
pub mod resolver;
pub mod sommaire;
pub mod store;
pub mod urlsync;
