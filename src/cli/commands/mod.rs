//! One module per subcommand.  Each exposes an `execute` function.

pub mod add;
pub mod category;
pub mod completions;
pub mod copy;
pub mod delete;
pub mod edit;
pub mod generate;
pub mod init;
pub mod list;
pub mod passwd;
pub mod search;
pub mod show;
pub mod totp;
pub mod two_factor;
