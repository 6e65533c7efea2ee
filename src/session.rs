//! Session token lifetime tracking.
//!
//! Trassir sessions stay valid for 15 minutes of inactivity. The reuse
//! window here is trimmed to 880 seconds so a token is never presented
//! right at the edge of its server-side expiry.

use std::time::{Duration, Instant};

/// How long a stored token is trusted without a fresh login.
pub const SESSION_REUSE_WINDOW: Duration = Duration::from_secs(880);

/// A vendor session id plus the moment it stops being trusted.
///
/// Every successful authenticated call pushes the deadline forward,
/// mirroring the server's inactivity-based expiry.
#[derive(Debug, Clone)]
pub struct Session {
    sid: String,
    valid_until: Instant,
}

impl Session {
    pub fn new(sid: String) -> Self {
        Self {
            sid,
            valid_until: Instant::now() + SESSION_REUSE_WINDOW,
        }
    }

    pub fn sid(&self) -> &str {
        &self.sid
    }

    /// True while the token is inside the reuse window.
    pub fn is_fresh(&self) -> bool {
        Instant::now() < self.valid_until
    }

    /// Restart the reuse window after a successful authenticated call.
    pub fn touch(&mut self) {
        self.valid_until = Instant::now() + SESSION_REUSE_WINDOW;
    }

    /// Pull the deadline closer. Lets tests cross the reuse window
    /// without sleeping.
    #[cfg(test)]
    pub fn backdate(&mut self, by: Duration) {
        if let Some(earlier) = self.valid_until.checked_sub(by) {
            self.valid_until = earlier;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_fresh() {
        let session = Session::new("sid-1".into());
        assert!(session.is_fresh());
        assert_eq!(session.sid(), "sid-1");
    }

    #[test]
    fn test_session_expires_past_window() {
        let mut session = Session::new("sid-1".into());
        session.backdate(SESSION_REUSE_WINDOW + Duration::from_secs(1));
        assert!(!session.is_fresh());
    }

    #[test]
    fn test_session_stays_fresh_inside_window() {
        let mut session = Session::new("sid-1".into());
        session.backdate(SESSION_REUSE_WINDOW - Duration::from_secs(10));
        assert!(session.is_fresh());
    }

    #[test]
    fn test_touch_restarts_the_window() {
        let mut session = Session::new("sid-1".into());
        session.backdate(SESSION_REUSE_WINDOW - Duration::from_secs(10));
        session.touch();
        session.backdate(SESSION_REUSE_WINDOW - Duration::from_secs(10));
        // Two near-window waits with a touch between never cross the window.
        assert!(session.is_fresh());
    }
}
