pub mod chrome_session;
#[cfg(test)]
pub mod fake;
pub mod js_executor;
pub mod page_script;
pub mod session;

pub use chrome_session::{ChromeLauncher, ChromeSession};
pub use js_executor::JsExecutor;
pub use page_script::PageScript;
pub use session::{BrowserSession, SessionLauncher};
