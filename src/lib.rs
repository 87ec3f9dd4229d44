//! quantum-port
//!
//! Creates or deletes a port on an OpenStack network so that it matches a
//! declared state. The module authenticates against Keystone (identity API
//! v2.0), resolves the tenant and network by name, and calls Neutron
//! (networking API v2.0) to create or delete the port.
//!
//! ```text
//! authenticate → network endpoint → tenant → network/subnet
//!      → present: find port, create if missing
//!      → absent:  find port, delete if found
//! ```
//!
//! A port is matched on `(tenant, name)` only: an existing port with the same
//! name is left untouched even when its other attributes differ.

pub mod client;
pub mod config;
pub mod error;
pub mod output;
pub mod params;
pub mod reconcile;

pub use error::{PortError, Result};
pub use params::{ModuleParams, RawParams, State};
pub use reconcile::{Action, Outcome};
