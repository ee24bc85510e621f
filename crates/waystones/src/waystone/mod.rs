//! Waystone identities: the resolved record and the references bindings hold.

pub mod identity;
pub mod record;

pub use identity::{Identity, WaystoneProxy};
pub use record::{Waystone, WaystoneId};
