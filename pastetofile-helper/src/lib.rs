pub mod cli;
pub mod clipboard;
pub mod history;
pub mod logging;
