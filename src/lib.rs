pub mod check;
pub mod config;
pub mod container;
pub mod image;
pub mod logging;
pub mod output;
pub mod version;
