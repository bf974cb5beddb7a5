//! Development server hostname helpers: a default `host:port` for a server
//! command, and a hosts file parser to check that the hostname resolves
//! locally.

#![deny(missing_docs)]

#[macro_use]
extern crate log;

pub use command::{run, Args, CommandError};
pub use config::Settings;
pub use hostfile::{host_file, load_hostfile, Error, FormatMode, Hostfile};
pub use runserver::{with_default_addrport, AddrPortError, DefaultAddrport, Handle, Options,
    RunserverOn, WithDefaultAddrport};

pub mod command;
pub mod config;
pub mod hostfile;
pub mod runserver;
