// Credential rotation - spreads calls across the key pool and falls through
// to the next key on rate-limit and auth failures

use std::future::Future;

use rand::seq::SliceRandom;

use crate::error::LlmError;
use crate::models::ApiKeyEntry;

/// Run `task` with one credential at a time until it succeeds.
///
/// With an empty pool the task runs once with `fallback_key`. Otherwise keys
/// are tried in random order; 429s and 401/403s move on to the next key, any
/// other error is returned immediately. Each key is tried at most once.
pub async fn call_with_rotation<T, F, Fut>(
    keys: &[ApiKeyEntry],
    fallback_key: Option<&str>,
    mut task: F,
) -> Result<T, LlmError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    if keys.is_empty() {
        let key = fallback_key.ok_or(LlmError::NoCredentials)?;
        tracing::debug!("Key store empty, using fallback key");
        return task(key.to_string()).await;
    }

    let mut order: Vec<&ApiKeyEntry> = keys.iter().collect();
    order.shuffle(&mut rand::rng());

    let mut last_error: Option<LlmError> = None;
    let mut attempts = 0;

    for entry in order {
        attempts += 1;
        match task(entry.key.clone()).await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_rate_limited() => {
                tracing::warn!("Key {} rate limited. Rotating...", entry.label);
                last_error = Some(e);
            }
            Err(e) if e.is_auth_failure() => {
                tracing::error!("Error with key {}: {}", entry.label, e);
                last_error = Some(e);
            }
            Err(e) => {
                tracing::error!("Error with key {}: {}", entry.label, e);
                return Err(e);
            }
        }
    }

    Err(match last_error {
        Some(last) => LlmError::Exhausted { attempts, last: Box::new(last) },
        None => LlmError::NoCredentials,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    fn keys(secrets: &[&str]) -> Vec<ApiKeyEntry> {
        secrets
            .iter()
            .enumerate()
            .map(|(i, s)| ApiKeyEntry {
                id: format!("id-{}", i),
                label: format!("key {}", i),
                key: s.to_string(),
                created_at: 0,
            })
            .collect()
    }

    fn api_error(status: u16) -> LlmError {
        LlmError::Api { status, message: format!("status {}", status) }
    }

    #[tokio::test]
    async fn test_empty_pool_uses_fallback() {
        let result = call_with_rotation(&[], Some("env-key"), |key| async move { Ok::<_, LlmError>(key) }).await;
        assert_eq!(result.unwrap(), "env-key");
    }

    #[tokio::test]
    async fn test_empty_pool_without_fallback_never_calls() {
        let calls = Mutex::new(0);
        let result = call_with_rotation(&[], None, |_key| {
            *calls.lock().unwrap() += 1;
            async { Ok::<_, LlmError>(()) }
        })
        .await;
        assert!(matches!(result, Err(LlmError::NoCredentials)));
        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rotates_past_rate_limited_and_rejected_keys() {
        let pool = keys(&["limited", "revoked", "forbidden", "good"]);
        let tried = Mutex::new(Vec::new());

        let result = call_with_rotation(&pool, Some("unused"), |key| {
            tried.lock().unwrap().push(key.clone());
            async move {
                match key.as_str() {
                    "limited" => Err(api_error(429)),
                    "revoked" => Err(api_error(401)),
                    "forbidden" => Err(api_error(403)),
                    _ => Ok(key),
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "good");
        let tried = tried.into_inner().unwrap();
        assert_eq!(tried.last().map(String::as_str), Some("good"));
        assert!(!tried.contains(&"unused".to_string()));
    }

    #[tokio::test]
    async fn test_message_mentioning_429_rotates() {
        let pool = keys(&["a", "b"]);
        let result = call_with_rotation(&pool, None, |key| async move {
            if key == "a" {
                Err(LlmError::Api { status: 500, message: "got 429 from upstream".to_string() })
            } else {
                Ok(key)
            }
        })
        .await;
        assert_eq!(result.unwrap(), "b");
    }

    #[tokio::test]
    async fn test_other_errors_propagate_immediately() {
        let pool = keys(&["a", "b", "c"]);
        let calls = Mutex::new(0);

        let result: Result<(), _> = call_with_rotation(&pool, None, |_key| {
            *calls.lock().unwrap() += 1;
            async { Err(api_error(500)) }
        })
        .await;

        assert!(matches!(result, Err(LlmError::Api { status: 500, .. })));
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_pool_returns_last_error() {
        let pool = keys(&["a", "b", "c"]);
        let tried = Mutex::new(Vec::new());

        let result: Result<(), _> = call_with_rotation(&pool, Some("fallback"), |key| {
            tried.lock().unwrap().push(key);
            async { Err(api_error(429)) }
        })
        .await;

        match result {
            Err(LlmError::Exhausted { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert_eq!(last.status(), Some(429));
            }
            other => panic!("unexpected result: {:?}", other),
        }

        // Every key exactly once, fallback never used
        let tried = tried.into_inner().unwrap();
        let unique: HashSet<_> = tried.iter().cloned().collect();
        assert_eq!(tried.len(), 3);
        assert_eq!(unique.len(), 3);
        assert!(!unique.contains("fallback"));
    }

    #[tokio::test]
    async fn test_order_is_randomized() {
        let pool = keys(&["a", "b", "c", "d", "e", "f"]);
        let mut first_keys = HashSet::new();

        for _ in 0..200 {
            let first = call_with_rotation(&pool, None, |key| async move { Ok::<_, LlmError>(key) })
                .await
                .unwrap();
            first_keys.insert(first);
        }

        assert!(first_keys.len() > 1, "rotation always picked the same key first");
    }
}
