// #![deny(warnings)]

#![warn(unused_extern_crates)]
// Enable some groups of clippy lints.
#![deny(clippy::suspicious)]
#![deny(clippy::perf)]
// Specific lints to enforce.
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::trivially_copy_pass_by_ref)]
#![deny(clippy::disallowed_types)]
#![deny(clippy::manual_let_else)]
#![allow(clippy::unreachable)]

pub mod asn1;
pub mod config;
pub(crate) mod constants;
pub mod error;
pub mod proto;

pub use crate::config::SnifferConfig;
pub use crate::error::KrbError;
pub use crate::proto::{AsReqHash, Frame, KrbHandler, KrbRequest};
