use crate::application::link::SIGN_ROUTE_PREFIX;
use crate::application::session::SessionKey;
use crate::domain::{Declaration, SignerRole};
use percent_encoding::percent_decode_str;

/// Result of matching a location against the signing-link shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    NoMatch,
    SignRequest(SessionKey),
}

/// Parse a full URL, a `#/sign/...` fragment or a `/sign/...` path
pub fn parse_route(location: &str) -> Route {
    let fragment = match location.find('#') {
        Some(idx) => &location[idx..],
        None if location.starts_with('/') => location,
        None => return Route::NoMatch,
    };
    let rest = fragment
        .strip_prefix(SIGN_ROUTE_PREFIX)
        .or_else(|| fragment.strip_prefix(&SIGN_ROUTE_PREFIX[1..]));
    let Some(rest) = rest else {
        return Route::NoMatch;
    };

    let mut segments = rest.split('/');
    let (Some(raw_id), Some(raw_role), None) = (segments.next(), segments.next(), segments.next())
    else {
        return Route::NoMatch;
    };

    let Ok(role) = raw_role.parse::<SignerRole>() else {
        return Route::NoMatch;
    };
    let Ok(record_id) = percent_decode_str(raw_id).decode_utf8() else {
        return Route::NoMatch;
    };
    if record_id.is_empty() {
        return Route::NoMatch;
    }

    Route::SignRequest(SessionKey::new(record_id.into_owned(), role))
}

/// Source of records already loaded on this device
pub trait RecordLookup {
    fn lookup(&self, record_id: &str) -> Option<&Declaration>;
}

impl RecordLookup for [Declaration] {
    fn lookup(&self, record_id: &str) -> Option<&Declaration> {
        self.iter().find(|d| d.id == record_id)
    }
}

impl RecordLookup for Vec<Declaration> {
    fn lookup(&self, record_id: &str) -> Option<&Declaration> {
        self.as_slice().lookup(record_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Location is not a signing link
    Idle,
    /// Signing link for a record this device has not loaded
    Unresolved(SessionKey),
    /// The role already signed; show the record, keep the image
    AlreadySigned(SessionKey),
    Open(SessionKey),
}

/// Tracks the current location and decides what a signing link asks for
#[derive(Debug, Default)]
pub struct SessionRouter {
    location: String,
}

impl SessionRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn navigate(&mut self, location: impl Into<String>) -> Route {
        self.location = location.into();
        self.current()
    }

    pub fn clear(&mut self) {
        self.location.clear();
    }

    pub fn current(&self) -> Route {
        parse_route(&self.location)
    }

    pub fn resolve<L: RecordLookup + ?Sized>(&self, records: &L) -> RouteDecision {
        let Route::SignRequest(key) = self.current() else {
            return RouteDecision::Idle;
        };
        match records.lookup(&key.record_id) {
            None => RouteDecision::Unresolved(key),
            Some(record) if record.is_signed_by(key.role) => RouteDecision::AlreadySigned(key),
            Some(_) => RouteDecision::Open(key),
        }
    }
}
