//! The subcommands. Each writes its operator-facing output to `out` and
//! returns the process exit code.

mod check;
mod create;
mod debug;
mod next;
mod run;

pub use check::check;
pub use create::create;
pub use debug::debug;
pub use next::next;
pub use run::{RunOptions, run};
