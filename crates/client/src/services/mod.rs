//! Typed service calls.
//!
//! Each call is a thin wrapper over [`Client::send`](crate::Client::send)
//! that fills in the request, turns a bad service result into
//! [`Error::ServiceFault`](crate::Error::ServiceFault) and unwraps the
//! part of the response callers use.

mod attribute;
mod discovery;
mod method;
mod node_management;
mod secure_channel;
mod session;
mod subscription;
mod view;
