//! An abstraction layer over chat-completion model backends.
//!
//! This crate establishes a unified protocol for agents to talk to hosted
//! and self-hosted LLMs, so that an agent can switch between them without
//! modifying its own code.
//!
//! Types in this crate don't perform any I/O, instead they are the
//! constraints that backend implementors should adhere to.

#![deny(missing_docs)]

mod backend;
mod config;
mod error;
mod model_type;
mod request;
mod response;

pub use backend::*;
pub use config::*;
pub use error::*;
pub use model_type::*;
pub use request::*;
pub use response::*;
