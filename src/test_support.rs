//! Test support utilities shared across unit and integration tests.

use std::collections::{BTreeSet, VecDeque};
use std::env;
use std::ffi::OsString;
use std::future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, MutexGuard as AsyncMutexGuard};

use crate::transport::{Method, Transport, TransportError, TransportFuture};

/// Records a single call made through [`ScriptedTransport`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransportCall {
    /// Verb of the call.
    pub method: Method,
    /// Path passed to the transport.
    pub path: String,
    /// Request body; empty for `GET`.
    pub body: Vec<u8>,
}

impl TransportCall {
    /// Parses the body as JSON, returning `None` when it is not valid JSON.
    #[must_use]
    pub fn body_json(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

#[derive(Debug, Default)]
struct Script {
    responses: VecDeque<Result<Vec<u8>, TransportError>>,
    calls: Vec<TransportCall>,
}

/// Scripted transport that returns pre-seeded responses in FIFO order.
///
/// Clones share the same script, so a test can keep a handle for assertions
/// after moving the transport into a manager.
#[derive(Clone, Debug, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    /// Creates a transport with no queued responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues a successful response carrying `body`.
    pub fn push_json(&self, body: impl Into<String>) {
        self.script()
            .responses
            .push_back(Ok(body.into().into_bytes()));
    }

    /// Queues a transport failure.
    pub fn push_error(&self, error: TransportError) {
        self.script().responses.push_back(Err(error));
    }

    /// Queues a rejected status for `path`.
    pub fn push_status(&self, method: Method, path: &str, status: u16) {
        self.push_error(TransportError::Status {
            method,
            path: path.to_owned(),
            status,
            body: String::from("{\"errors\":[\"simulated failure\"]}"),
        });
    }

    /// Returns a snapshot of all calls recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<TransportCall> {
        self.script().calls.clone()
    }

    /// Returns how many calls were made.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.script().calls.len()
    }

    fn respond(&self, method: Method, path: &str, body: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        let mut script = self.script();
        script.calls.push(TransportCall {
            method,
            path: path.to_owned(),
            body,
        });
        script
            .responses
            .pop_front()
            .unwrap_or_else(|| {
                Err(TransportError::Request {
                    method,
                    path: path.to_owned(),
                    message: String::from("no scripted response available"),
                })
            })
    }
}

impl Transport for ScriptedTransport {
    fn get<'a>(&'a self, path: &'a str) -> TransportFuture<'a, Vec<u8>> {
        Box::pin(future::ready(self.respond(Method::Get, path, Vec::new())))
    }

    fn post<'a>(&'a self, path: &'a str, body: Vec<u8>) -> TransportFuture<'a, Vec<u8>> {
        Box::pin(future::ready(self.respond(Method::Post, path, body)))
    }

    fn delete<'a>(&'a self, path: &'a str, body: Vec<u8>) -> TransportFuture<'a, Vec<u8>> {
        Box::pin(future::ready(self.respond(Method::Delete, path, body)))
    }
}

/// Builds a transient request failure for `path`.
#[must_use]
pub fn request_failure(method: Method, path: &str) -> TransportError {
    TransportError::Request {
        method,
        path: path.to_owned(),
        message: String::from("connection reset"),
    }
}

fn json_strings(values: &[&str]) -> String {
    values
        .iter()
        .map(|value| format!("\"{value}\""))
        .collect::<Vec<_>>()
        .join(",")
}

/// Produces a `GET /operating-systems` payload from `(id, slug, distro,
/// provisionable_on)` tuples.
#[must_use]
pub fn json_operating_systems(items: &[(&str, &str, &str, &[&str])]) -> String {
    let entries = items
        .iter()
        .map(|(id, slug, distro, targets)| {
            format!(
                "{{\"id\":\"{id}\",\"slug\":\"{slug}\",\"name\":\"{distro}\",\"distro\":\"{distro}\",\"provisionable_on\":[{}]}}",
                json_strings(targets)
            )
        })
        .collect::<Vec<_>>()
        .join(",");
    format!("{{\"operating_systems\":[{entries}]}}")
}

/// Produces a `GET /projects/{id}/plans` payload from `(id, class)` tuples.
#[must_use]
pub fn json_plans(items: &[(&str, &str)]) -> String {
    let entries = items
        .iter()
        .map(|(id, class)| {
            format!("{{\"id\":\"{id}\",\"slug\":\"{class}\",\"name\":\"{class}\",\"class\":\"{class}\"}}")
        })
        .collect::<Vec<_>>()
        .join(",");
    format!("{{\"plans\":[{entries}]}}")
}

/// Produces a `GET /projects/{id}/facilities` payload from `(id, features)`
/// tuples.
#[must_use]
pub fn json_facilities(items: &[(&str, &[&str])]) -> String {
    let entries = items
        .iter()
        .map(|(id, features)| {
            format!(
                "{{\"id\":\"{id}\",\"code\":\"{id}\",\"features\":[{}]}}",
                json_strings(features)
            )
        })
        .collect::<Vec<_>>()
        .join(",");
    format!("{{\"facilities\":[{entries}]}}")
}

/// Produces a device record with the given identifier.
#[must_use]
pub fn json_device(id: &str) -> String {
    format!(
        "{{\"id\":\"{id}\",\"short_id\":\"{id}\",\"hostname\":\"metal-lease-test\",\"state\":\"queued\"}}"
    )
}

/// Produces a `GET /devices/{id}/events` payload, newest event first.
#[must_use]
pub fn json_events(bodies: &[&str]) -> String {
    let entries = bodies
        .iter()
        .enumerate()
        .map(|(index, body)| {
            format!(
                "{{\"id\":\"evt-{index}\",\"body\":\"{body}\",\"type\":\"provisioning\",\"created_at\":\"2024-01-01T10:00:00Z\"}}"
            )
        })
        .collect::<Vec<_>>()
        .join(",");
    format!("{{\"events\":[{entries}]}}")
}

/// Produces a payload carrying only a provider error list.
#[must_use]
pub fn json_errors(errors: &[&str]) -> String {
    format!("{{\"errors\":[{}]}}", json_strings(errors))
}

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: AsyncMutex<()> = AsyncMutex::const_new(());

/// Guard that holds the env mutex and restores variables on drop.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: AsyncMutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets multiple environment variables while holding a global mutex.
    pub async fn set_vars(pairs: &[(&str, &str)]) -> Self {
        debug_assert!(
            {
                let mut seen = BTreeSet::new();
                pairs.iter().all(|(key, _)| seen.insert(*key))
            },
            "duplicate environment variable keys passed to EnvGuard::set_vars"
        );

        let guard = ENV_LOCK.lock().await;
        let mut previous = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let old = env::var_os(key);
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`, preventing races.
            unsafe { env::set_var(key, value) };
            previous.push(((*key).to_owned(), old));
        }

        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in &self.previous {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}
