//! SVN CLI wrapper.

pub mod client;
pub mod parser;
pub mod runner;

pub use client::SvnClient;
pub use parser::*;
pub use runner::{ProcessRunner, SvnAuth, SvnRunner};
