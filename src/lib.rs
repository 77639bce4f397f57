//! Carbon - start and stop groups of containerized services
//!
//! Services are declared in small `carbon.yml` files spread across
//! registered directories ("stores"). Carbon resolves a requested set of
//! service names against those declarations and then works through these steps:
//!
//! - Checks that every direct dependency was requested too
//! - Writes one generated compose file per distinct service set
//! - Records the started instances in a local SQLite registry
//! - Drives `docker compose` to bring the group up or stop it again
//!
//! Carbon does not run containers itself; it only builds command lines for
//! the container tool and records their intent.

pub mod builder;
pub mod catalog;
pub mod commands;
pub mod compose;
pub mod config;
pub mod digest;
pub mod error;
pub mod registry;
pub mod runner;

pub use error::{CarbonError, Result};
