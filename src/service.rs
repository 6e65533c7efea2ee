//! The door service façade: one instance owns the vendor session and the
//! cached directory, and every consumer-facing operation goes through it.
//!
//! Failure contract, shared by every public method: vendor trouble of any
//! kind (network, timeout, non-2xx, bad JSON, rejected login) degrades to
//! an empty mapping, `None`, or `false`. No vendor error ever reaches the
//! caller; the detail goes to the log.

use indexmap::IndexMap;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::audit::{AuditSink, OpenEvent};
use crate::config::TrassirConfig;
use crate::directory::{self, DoorDirectory};
use crate::session::Session;
use crate::transport::{self, PacsTransport};

const POINTS_ENDPOINT: &str = "devices-and-points-list";
const OPEN_ENDPOINT: &str = "access-point-open-once";
const LANGUAGE: &str = "en";

/// An id/name pair as consumers see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Door {
    pub id: u32,
    pub name: String,
}

/// One instance owns the session token and the directory cache. Methods
/// take `&mut self`; callers that share an instance across threads wrap it
/// in a mutex, which also closes the duplicate-refresh race two concurrent
/// stale checks would otherwise run.
pub struct DoorService {
    config: TrassirConfig,
    transport: Box<dyn PacsTransport>,
    audit: Box<dyn AuditSink>,
    session: Option<Session>,
    directory: DoorDirectory,
}

impl DoorService {
    pub fn new(
        config: TrassirConfig,
        transport: Box<dyn PacsTransport>,
        audit: Box<dyn AuditSink>,
    ) -> Self {
        Self {
            config,
            transport,
            audit,
            session: None,
            directory: DoorDirectory::new(),
        }
    }

    pub fn config(&self) -> &TrassirConfig {
        &self.config
    }

    /// Whether address, username and password are all set. No network call.
    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Make sure a usable session token is held, logging in if the current
    /// one is absent or past the reuse window.
    ///
    /// A failed login leaves any previous token in place and returns false
    /// immediately; retry is the caller's business.
    pub fn ensure_session(&mut self) -> bool {
        if let Some(session) = &self.session {
            if session.is_fresh() {
                return true;
            }
        }

        match self.transport.login(
            &self.config.address,
            &self.config.username,
            &self.config.password,
        ) {
            Ok(reply) => {
                if reply.success {
                    if let Some(sid) = reply.sid.filter(|sid| !sid.is_empty()) {
                        debug!(address = %self.config.address, "trassir login ok");
                        self.session = Some(Session::new(sid));
                        return true;
                    }
                }
                warn!(address = %self.config.address, "trassir rejected login");
                false
            }
            Err(e) => {
                warn!(address = %self.config.address, error = %e, "trassir login failed");
                false
            }
        }
    }

    /// Authenticated vendor call. `None` covers every failure: no session,
    /// transport error, non-2xx, unparseable body. A successful round trip
    /// slides the session expiry.
    fn request(&mut self, endpoint: &str, params: Value) -> Option<Value> {
        if !self.ensure_session() {
            warn!(endpoint, "dropping vendor call, no session");
            return None;
        }
        let Some(session) = &self.session else {
            return None;
        };
        let sid = session.sid().to_string();

        match self
            .transport
            .call(&self.config.address, endpoint, &sid, &params)
        {
            Ok(reply) => {
                if let Some(session) = self.session.as_mut() {
                    session.touch();
                }
                Some(reply)
            }
            Err(e) => {
                warn!(endpoint, error = %e, "vendor call failed");
                None
            }
        }
    }

    fn fetch_points(&mut self) -> Option<Vec<transport::AccessPoint>> {
        let reply = self.request(POINTS_ENDPOINT, json!({ "language": LANGUAGE }))?;
        let points = transport::parse_points(&reply);
        if points.is_none() {
            warn!("vendor listing carried no points array");
        }
        points
    }

    /// The primary door directory, refreshed from the vendor when empty or
    /// past its TTL. A failed refresh keeps whatever the cache held before.
    pub fn load_doors(&mut self) -> IndexMap<u32, String> {
        if self.directory.is_fresh() {
            return self.directory.doors().clone();
        }
        if let Some(points) = self.fetch_points() {
            self.directory.rebuild(&points);
            debug!(doors = self.directory.doors().len(), "door directory rebuilt");
        }
        self.directory.doors().clone()
    }

    /// The directory, optionally widened with the non-marker points.
    ///
    /// The widened view costs one extra vendor round trip per call and is
    /// never cached; the primary cache is not touched by it.
    pub fn get_doors(&mut self, include_additional: bool) -> IndexMap<u32, String> {
        let doors = self.load_doors();
        if !include_additional {
            return doors;
        }
        match self.fetch_points() {
            Some(points) => self.directory.with_additional(&points),
            None => doors,
        }
    }

    /// Fire the vendor's open-once command and report its verdict.
    ///
    /// A confirmed open is written to the audit sink with the resolved
    /// display name; a sink failure is logged and the verdict stands.
    /// Any vendor failure reads as "not opened".
    pub fn open_door(
        &mut self,
        door_id: u32,
        person_name: Option<&str>,
        tg_id: Option<i64>,
    ) -> bool {
        let reply = match self.request(
            OPEN_ENDPOINT,
            json!({ "access_point_id": door_id, "language": LANGUAGE }),
        ) {
            Some(reply) => reply,
            None => return false,
        };

        let opened = transport::parse_opened(&reply);
        if opened {
            let event = OpenEvent::new(
                door_id,
                self.directory.resolve_name(door_id),
                person_name.filter(|name| !name.is_empty()).map(str::to_string),
                tg_id,
            );
            if let Err(e) = self.audit.record(&event) {
                warn!(door_id, error = %e, "audit write failed");
            }
        }
        opened
    }

    /// Exact display-name lookup. With duplicate names the door the vendor
    /// listed first wins.
    pub fn find_door_by_name(&mut self, name: &str, include_additional: bool) -> Option<Door> {
        let doors = self.get_doors(include_additional);
        doors
            .iter()
            .find(|(_, door_name)| door_name.as_str() == name)
            .map(|(id, door_name)| Door {
                id: *id,
                name: door_name.clone(),
            })
    }

    /// The doors behind the "3-6 Этаж" submenu, in menu order.
    pub fn floors_submenu_doors(&mut self, include_additional: bool) -> IndexMap<u32, String> {
        let doors = self.get_doors(include_additional);
        directory::floors_submenu(&doors)
    }

    /// Every access point the vendor reports, raw and unfiltered.
    pub fn all_access_points(&mut self) -> Vec<Value> {
        let Some(reply) = self.request(POINTS_ENDPOINT, json!({ "language": LANGUAGE })) else {
            return Vec::new();
        };
        match reply.get("points").and_then(Value::as_array) {
            Some(points) => points.clone(),
            None => Vec::new(),
        }
    }

    /// Snapshot of the current cache as a list, without any vendor call.
    pub fn doors_list(&self) -> Vec<Door> {
        self.directory
            .doors()
            .iter()
            .map(|(id, name)| Door {
                id: *id,
                name: name.clone(),
            })
            .collect()
    }
}
