#[macro_use] extern crate lazy_static;

pub mod config;
pub mod deps;
pub mod descriptor;
pub mod errors;
pub mod exec;
pub mod fetch;
pub mod image;
pub mod run;
pub mod source;
pub mod stage;

pub use crate::{config::Config, image::ImageReference, run::RunOptions};
