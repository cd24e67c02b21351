//! # upsync-git
//!
//! Subprocess boundary between upsync and the system `git` binary.
//! Every operation is an argument vector handed to a [`GitRunner`], which
//! returns the exit status together with the captured output streams.

mod error;
mod output;
mod repository;
mod traits;

pub use error::{Error, Result};
pub use output::CommandOutput;
pub use repository::Repository;
pub use traits::GitRunner;
