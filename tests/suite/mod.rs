//! Integration test modules

mod config;
mod conventions;
mod digest;
mod images;
mod profile;
