//! CLI command implementations.
//!
//! | Module   | Commands handled      |
//! |----------|-----------------------|
//! | `serve`  | `Serve`               |
//! | `db`     | `InitDb`              |
//! | `task`   | `Task Add`, `Task List` |

pub mod db;
pub mod serve;
pub mod task;

pub use db::cmd_init_db;
pub use serve::cmd_serve;
pub use task::{TaskArgs, cmd_task_add, cmd_task_list};
