//! Terminal stand-in for page navigation.

use auth_pipeline::Navigator;
use parking_lot::Mutex;

/// Route the CLI reports while running a command.
pub const CLI_ROUTE: &str = "/cli";

/// Tells the user their session ended instead of moving to a page.
pub struct TerminalNavigator {
    path: Mutex<String>,
}

impl TerminalNavigator {
    pub fn new() -> Self {
        Self {
            path: Mutex::new(CLI_ROUTE.to_string()),
        }
    }
}

impl Navigator for TerminalNavigator {
    fn current_path(&self) -> String {
        self.path.lock().clone()
    }

    fn navigate(&self, path: &str) {
        *self.path.lock() = path.to_string();
        eprintln!("Your session has expired. Run `authctl login` to sign in again.");
    }
}
