// Core trait definitions for the update multiplexer
//
// This module defines the seam between the core and its outbound
// transport.

pub mod dispatcher;

pub use dispatcher::{DISPATCH_TIMEOUT, Dispatcher, RawResponse};
