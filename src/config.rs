// ABOUTME: Version and banner text shared by the CLI and REPL

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const WELCOME_MESSAGE: &str = "Tiny";
pub const WELCOME_SUBTITLE: &str = "a small imperative scripting language";
pub const FAREWELL_MESSAGE: &str = "Goodbye!";
pub const HISTORY_FILE: &str = ".tiny_history";
