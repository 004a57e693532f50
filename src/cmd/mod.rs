//! CLI command implementations.
//!
//! | Module      | Commands handled                                        |
//! |-------------|---------------------------------------------------------|
//! | `task`      | every dispatcher task (`up`, `exec`, `migrate`, ...), `Tasks` |
//! | `bootstrap` | `Bootstrap`                                             |
//! | `config`    | `Config`                                                |

pub mod bootstrap;
pub mod config;
pub mod task;

pub use bootstrap::cmd_bootstrap;
pub use config::cmd_config;
pub use task::{cmd_task, cmd_tasks};
