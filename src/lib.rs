//! Client for the door-access side of a Trassir server.
//!
//! A [`DoorService`] owns the vendor session and a cached directory of
//! doors, and exposes the handful of operations the bot and HTTP layers
//! need: list doors, find one by name, open one (with an audit record),
//! and report whether the connection settings are present. Vendor
//! failures never surface as errors; they degrade to empty results and
//! a log line.

pub mod audit;
pub mod cli;
pub mod config;
pub mod directory;
pub mod service;
pub mod session;
pub mod transport;

pub use audit::{AuditLog, AuditSink, OpenEvent};
pub use config::TrassirConfig;
pub use directory::{
    is_submenu_trigger, DoorDirectory, DOORS_CACHE_TTL, DOOR_NAME_OVERRIDES, FLOORS_SUBMENU_DOORS,
    FLOORS_SUBMENU_TITLE, HIDDEN_DOORS,
};
pub use service::{Door, DoorService};
pub use session::{Session, SESSION_REUSE_WINDOW};
pub use transport::{HttpTransport, PacsTransport, TransportError};
