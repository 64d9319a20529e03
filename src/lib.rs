#[macro_use]
extern crate tracing;
#[macro_use]
extern crate serde_derive;

pub mod config;
pub mod database;
pub mod error;
pub mod events;
pub mod models;
pub mod persistence;
pub mod rank;
pub mod scheduled;
pub mod shop;
pub mod webserver;
