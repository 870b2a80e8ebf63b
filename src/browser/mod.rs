pub mod headless;

pub use headless::{launch_browser, LaunchOptions};
