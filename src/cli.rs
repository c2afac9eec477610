mod args;

pub use args::{Cli, Command, IdCommand, OutputFormat, RoleCommand, RqlCommand, SearchArgs};
