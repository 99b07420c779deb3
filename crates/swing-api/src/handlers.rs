//! Request handlers.

pub mod analyze;
pub mod health;
pub mod jobs;

pub use analyze::*;
pub use health::*;
pub use jobs::*;
