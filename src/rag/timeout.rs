// Per-step deadlines for the suggested-reply pipeline
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use crate::errors::ProviderError;

/// Optional deadline for each network round trip
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepTimeouts {
    pub embed: Option<Duration>,
    pub search: Option<Duration>,
    pub generate: Option<Duration>,
}

impl StepTimeouts {
    /// Same deadline for every step
    pub fn uniform(limit: Duration) -> Self {
        Self {
            embed: Some(limit),
            search: Some(limit),
            generate: Some(limit),
        }
    }
}

/// Await `fut`, turning an elapsed deadline into [`ProviderError::Timeout`]
pub async fn with_timeout<T, F>(limit: Option<Duration>, fut: F) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| ProviderError::Timeout {
                duration_ms: limit.as_millis() as u64,
            })?,
        None => fut.await,
    }
}
