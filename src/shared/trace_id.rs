//! Request trace identifiers.
//!
//! Each request gets a fresh id of the form `<base36 millis>-<base36 random>`.
//! The id only correlates log lines: it is never returned to the caller and
//! carries no security meaning. The current id is held in task-local storage
//! for the lifetime of the request future.

use std::future::Future;

use chrono::Utc;
use rand::Rng;
use tokio::task_local;

task_local! {
    static TRACE_ID: TraceId;
}

/// Per-request log correlation id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TraceId(String);

impl TraceId {
    /// Time-based prefix plus random suffix.
    pub fn generate() -> Self {
        let millis = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
        let suffix: u32 = rand::rng().random();
        Self(format!("{}-{}", to_base36(millis), to_base36(u64::from(suffix))))
    }

    /// The trace id of the request being handled on this task, if any.
    pub fn current() -> Option<Self> {
        TRACE_ID.try_with(|id| id.clone()).ok()
    }

    /// Run `fut` with `self` as the current trace id.
    pub async fn scope<F>(self, fut: F) -> F::Output
    where
        F: Future,
    {
        TRACE_ID.scope(self, fut).await
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".into();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base36_encoding() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }

    #[test]
    fn generated_ids_have_prefix_and_suffix() {
        let id = TraceId::generate();
        let (prefix, suffix) = id.as_str().split_once('-').unwrap();
        assert!(!prefix.is_empty());
        assert!(!suffix.is_empty());
        assert_ne!(TraceId::generate(), TraceId::generate());
    }

    #[tokio::test]
    async fn current_reflects_scope() {
        let id = TraceId::generate();
        let seen = id.clone().scope(async { TraceId::current() }).await;
        assert_eq!(seen, Some(id));
        assert!(TraceId::current().is_none());
    }
}
