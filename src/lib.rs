//! Bookstore Application Library
//!
//! Book records CRUD service: the `books` module, request parsing helpers and the
//! process bootstrap shared by the `bookstore` binary and the CLI.

pub mod bootstrap;
pub mod modules;
pub mod utils;

/// Re-export commonly used types
pub use modules::*;
