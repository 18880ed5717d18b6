pub mod data;
pub mod io;

#[cfg(test)]
pub mod tests;

pub use data::{path_display, Config};
pub use io::ConfigError;
