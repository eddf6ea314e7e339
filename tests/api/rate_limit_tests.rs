//! Rate limiter tests against the in-process counter store

use std::sync::Arc;

use pretty_assertions::assert_eq;

use social_server::infrastructure::cache::MemoryRateLimitStore;
use social_server::presentation::middleware::{RateDecision, RateLimiter, RateRule};

use crate::common::UnreachableStore;

fn memory_limiter() -> RateLimiter {
    RateLimiter::new(Arc::new(MemoryRateLimitStore::new()), true)
}

#[tokio::test]
async fn verification_resend_allows_one_per_window() {
    let limiter = memory_limiter();

    let first = limiter.check(RateRule::VerificationResend, 1).await.unwrap();
    let second = limiter.check(RateRule::VerificationResend, 1).await.unwrap();

    assert!(matches!(first, RateDecision::Allowed(info) if info.remaining == 0));
    match second {
        RateDecision::Limited(info) => {
            assert_eq!(info.limit, 1);
            assert!(info.reset_after > 0 && info.reset_after <= 300);
        }
        other => panic!("expected limited, got {:?}", other),
    }
}

#[tokio::test]
async fn counters_are_per_user_and_per_rule() {
    let limiter = memory_limiter();

    limiter.check(RateRule::VerificationResend, 1).await.unwrap();

    assert!(matches!(
        limiter.check(RateRule::VerificationResend, 2).await.unwrap(),
        RateDecision::Allowed(_)
    ));
    assert!(matches!(
        limiter.check(RateRule::PostCreate, 1).await.unwrap(),
        RateDecision::Allowed(_)
    ));
}

#[tokio::test]
async fn post_quota_is_thirty_per_minute() {
    let limiter = memory_limiter();

    for _ in 0..30 {
        assert!(matches!(
            limiter.check(RateRule::PostCreate, 7).await.unwrap(),
            RateDecision::Allowed(_)
        ));
    }
    assert!(matches!(
        limiter.check(RateRule::PostCreate, 7).await.unwrap(),
        RateDecision::Limited(_)
    ));
}

#[tokio::test]
async fn unreachable_store_fails_open_when_configured() {
    let limiter = RateLimiter::new(Arc::new(UnreachableStore), true);

    let decision = limiter.check(RateRule::Upload, 1).await.unwrap();
    assert_eq!(decision, RateDecision::Unchecked);
}

#[tokio::test]
async fn unreachable_store_fails_closed_when_configured() {
    let limiter = RateLimiter::new(Arc::new(UnreachableStore), false);

    assert!(limiter.check(RateRule::Upload, 1).await.is_err());
}
