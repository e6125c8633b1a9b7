pub mod app;
pub mod cli;
pub mod config;
pub mod controller;
pub mod normalize;
pub mod output;
pub mod render;
pub mod sanitize;

#[cfg(test)]
mod tests;
