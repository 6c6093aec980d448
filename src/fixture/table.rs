//! Version-numbered fixture table
//!
//! Every registration gets the next version number. A request resolves to
//! the matching fixture with the highest version, so the most recent
//! registration wins and an older one shows through again once the newer
//! pattern is unregistered.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use base64::Engine;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::common::{Error, Result};

use super::pattern::UrlPattern;
use super::schema::{Me, Member, Organization, ShareSettings, Ticket, User};

/// Response body of a fulfilled fixture
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureBody {
    /// No body
    #[default]
    Empty,
    /// Plain text, sent verbatim
    Text(String),
    /// Arbitrary JSON value
    Json(serde_json::Value),
    /// `GET /api/me`
    Me(Me),
    User(User),
    Organizations(Vec<Organization>),
    Ticket(Ticket),
    Tickets(Vec<Ticket>),
    Members(Vec<Member>),
    ShareSettings(ShareSettings),
}

impl FixtureBody {
    /// Serialize the body to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let bytes = match self {
            FixtureBody::Empty => Vec::new(),
            FixtureBody::Text(text) => text.as_bytes().to_vec(),
            FixtureBody::Json(value) => serde_json::to_vec(value)?,
            FixtureBody::Me(me) => serde_json::to_vec(me)?,
            FixtureBody::User(user) => serde_json::to_vec(user)?,
            FixtureBody::Organizations(orgs) => serde_json::to_vec(orgs)?,
            FixtureBody::Ticket(ticket) => serde_json::to_vec(ticket)?,
            FixtureBody::Tickets(tickets) => serde_json::to_vec(tickets)?,
            FixtureBody::Members(members) => serde_json::to_vec(members)?,
            FixtureBody::ShareSettings(share) => serde_json::to_vec(share)?,
        };
        Ok(bytes)
    }

    /// Content type implied by the body kind
    pub fn default_content_type(&self) -> Option<&'static str> {
        match self {
            FixtureBody::Empty => None,
            FixtureBody::Text(_) => Some("text/plain"),
            _ => Some("application/json"),
        }
    }
}

fn default_status() -> u16 {
    200
}

/// Synthetic response descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureResponse {
    #[serde(default = "default_status")]
    pub status: u16,
    /// Overrides the content type implied by the body
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Written as a single-key map (`body: { tickets: [] }`) or a bare
    /// unit variant (`body: empty`)
    #[serde(default, with = "serde_yaml::with::singleton_map")]
    pub body: FixtureBody,
}

impl FixtureResponse {
    pub fn new(status: u16, body: FixtureBody) -> Self {
        Self {
            status,
            content_type: None,
            headers: BTreeMap::new(),
            body,
        }
    }

    /// `Content-Type` given in `headers`, if any
    fn header_content_type(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
            .map(|(_, value)| value.as_str())
    }

    /// Effective content type: `content_type`, then a `Content-Type` header,
    /// then the type implied by the body
    pub fn content_type(&self) -> Option<&str> {
        self.content_type
            .as_deref()
            .or_else(|| self.header_content_type())
            .or_else(|| self.body.default_content_type())
    }

    /// Headers to send, including `Content-Type`
    pub fn header_list(&self) -> Vec<(String, String)> {
        let mut headers: Vec<(String, String)> = self
            .headers
            .iter()
            .filter(|(name, _)| !name.eq_ignore_ascii_case("content-type"))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if let Some(ct) = self.content_type() {
            headers.push(("Content-Type".to_string(), ct.to_string()));
        }
        headers
    }

    /// Body encoded for the DevTools `Fetch.fulfillRequest` command
    pub fn body_base64(&self) -> Result<String> {
        Ok(base64::engine::general_purpose::STANDARD.encode(self.body.to_bytes()?))
    }
}

/// What to do with a request that matches a fixture
#[derive(Debug, Clone, PartialEq)]
pub enum FixtureAction {
    /// Answer with a synthetic response
    Fulfill(FixtureResponse),
    /// Let the request through to the real network
    Passthrough,
}

/// A route fixture: URL pattern, optional method filter, action
#[derive(Debug, Clone, PartialEq)]
pub struct Fixture {
    pub pattern: UrlPattern,
    /// Upper-case HTTP method, or `None` for any method
    pub method: Option<String>,
    pub action: FixtureAction,
}

impl Fixture {
    pub fn fulfill(pattern: &str, response: FixtureResponse) -> Self {
        Self {
            pattern: UrlPattern::new(pattern),
            method: None,
            action: FixtureAction::Fulfill(response),
        }
    }

    pub fn passthrough(pattern: &str) -> Self {
        Self {
            pattern: UrlPattern::new(pattern),
            method: None,
            action: FixtureAction::Passthrough,
        }
    }

    /// Restrict the fixture to one HTTP method
    pub fn for_method(mut self, method: &str) -> Self {
        self.method = Some(method.to_ascii_uppercase());
        self
    }

    /// Whether this fixture applies to a request
    pub fn applies_to(&self, method: &str, url: &str) -> bool {
        let method_ok = self
            .method
            .as_deref()
            .map(|m| m.eq_ignore_ascii_case(method))
            .unwrap_or(true);
        method_ok && self.pattern.is_match(url)
    }

    /// Check the fixture can be served (status range, serializable body)
    pub fn validate(&self) -> Result<()> {
        if let FixtureAction::Fulfill(response) = &self.action {
            if !(100..=599).contains(&response.status) {
                return Err(Error::invalid_fixture(
                    self.pattern.as_str(),
                    format!("status {} is not a valid HTTP status", response.status),
                ));
            }
            if response.content_type.is_some() && response.header_content_type().is_some() {
                return Err(Error::invalid_fixture(
                    self.pattern.as_str(),
                    "set 'content_type' or a Content-Type header, not both",
                ));
            }
            response
                .body
                .to_bytes()
                .map_err(|e| Error::invalid_fixture(self.pattern.as_str(), e))?;
        }
        if let Some(method) = &self.method {
            if method.is_empty() || !method.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(Error::invalid_fixture(
                    self.pattern.as_str(),
                    format!("invalid HTTP method '{}'", method),
                ));
            }
        }
        Ok(())
    }
}

/// A registered fixture with its version
#[derive(Debug)]
struct Entry {
    version: u64,
    fixture: Arc<Fixture>,
}

/// Outcome of resolving one request
#[derive(Debug, Clone)]
pub enum Resolution {
    /// Answer from this fixture snapshot
    Fulfill { version: u64, fixture: Arc<Fixture> },
    /// A pass-through fixture matched
    Passthrough { version: u64 },
    /// No fixture matched; the request goes to the network
    Unmatched,
}

impl Resolution {
    pub fn version(&self) -> Option<u64> {
        match self {
            Resolution::Fulfill { version, .. } | Resolution::Passthrough { version } => {
                Some(*version)
            }
            Resolution::Unmatched => None,
        }
    }

    /// The response to send, if the request is fulfilled
    pub fn response(&self) -> Option<&FixtureResponse> {
        match self {
            Resolution::Fulfill { fixture, .. } => match &fixture.action {
                FixtureAction::Fulfill(response) => Some(response),
                FixtureAction::Passthrough => None,
            },
            _ => None,
        }
    }
}

/// Fixture table keyed by pattern, shared between the runner and the
/// request interception task
#[derive(Debug, Default)]
pub struct FixtureTable {
    routes: RwLock<BTreeMap<String, Vec<Entry>>>,
    next_version: AtomicU64,
}

impl FixtureTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fixture; returns its version
    pub fn register(&self, fixture: Fixture) -> u64 {
        let mut routes = self.routes.write();
        // Allocated under the write lock so versions follow insertion order
        let version = self.next_version.fetch_add(1, Ordering::SeqCst) + 1;
        let key = fixture.pattern.as_str().to_string();
        routes.entry(key).or_default().push(Entry {
            version,
            fixture: Arc::new(fixture),
        });
        version
    }

    /// Remove every version registered under `pattern`; returns how many were removed
    pub fn unregister(&self, pattern: &str) -> usize {
        self.routes
            .write()
            .remove(pattern)
            .map(|entries| entries.len())
            .unwrap_or(0)
    }

    /// Resolve a request against the current table
    ///
    /// The returned snapshot is unaffected by later registrations.
    pub fn resolve(&self, method: &str, url: &str) -> Resolution {
        let routes = self.routes.read();
        let best = routes
            .values()
            .flat_map(|entries| entries.iter())
            .filter(|entry| entry.fixture.applies_to(method, url))
            .max_by_key(|entry| entry.version);

        match best {
            Some(entry) => match entry.fixture.action {
                FixtureAction::Fulfill(_) => Resolution::Fulfill {
                    version: entry.version,
                    fixture: Arc::clone(&entry.fixture),
                },
                FixtureAction::Passthrough => Resolution::Passthrough {
                    version: entry.version,
                },
            },
            None => Resolution::Unmatched,
        }
    }

    /// Number of registered fixtures across all patterns
    pub fn len(&self) -> usize {
        self.routes.read().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
