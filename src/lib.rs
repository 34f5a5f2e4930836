//! Capability grammar and authorization engine for a distributed
//! filesystem metadata service.
//!
//! A capability string such as `allow rw path="/sandbox" uid=10` is
//! compiled into an ordered [`AuthCaps`] grant set. Incoming requests
//! are then checked with [`AuthCaps::is_capable`], which walks the
//! grants in stored order and allows on the first grant whose scope and
//! permission spec both cover the request. A request no grant covers is
//! denied, never an error.
//!
//! The metadata cache, request dispatch, credential storage and unix
//! mode-bit enforcement all live elsewhere; this crate is the pure
//! parse-and-decide core.

pub mod caps;
pub mod err;
pub mod parse;

pub use caps::{AuthCaps, CapGrant, CapMatch, CapSpec, MAY_EXECUTE, MAY_READ, MAY_WRITE};
pub use err::CapsErr;
