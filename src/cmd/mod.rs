//! CLI command implementations.
//!
//! | Module   | Commands handled |
//! |----------|------------------|
//! | `serve`  | `Serve`          |
//! | `demo`   | `Demo`           |
//! | `config` | `Config`         |

pub mod config;
pub mod demo;
pub mod serve;

pub use config::cmd_config;
pub use demo::cmd_demo;
pub use serve::cmd_serve;
