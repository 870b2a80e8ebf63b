pub mod toml_loader;

pub use toml_loader::{load_field_map, parse_field_map};
