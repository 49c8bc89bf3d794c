use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;

use crate::{
    error::{AppError, AppResult},
    models::{parse_recommendations, RecommendationRequest, ServiceStatus},
    transport::{CallOptions, Framing, RecommendationTransport},
};

/// Timeout and framing for each kind of call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSettings {
    pub view: CallOptions,
    pub recommend: CallOptions,
    pub self_test: CallOptions,
}

impl Default for CallSettings {
    fn default() -> Self {
        Self {
            view: CallOptions::new(Duration::from_secs(5), Framing::NewlineTerminated),
            recommend: CallOptions::new(Duration::from_secs(10), Framing::NewlineTerminated),
            self_test: CallOptions::new(Duration::from_secs(5), Framing::NewlineTerminated),
        }
    }
}

/// Call sites the HTTP layer uses to reach the recommendation service
///
/// View notifications and the startup self-test are absorbed here: their
/// failures are logged and never returned. Recommendation queries propagate
/// failures, since a recommendation list cannot be faked.
#[derive(Clone)]
pub struct RecommendationService {
    transport: Arc<dyn RecommendationTransport>,
    calls: CallSettings,
}

impl RecommendationService {
    pub fn new(transport: Arc<dyn RecommendationTransport>, calls: CallSettings) -> Self {
        Self { transport, calls }
    }

    /// Reports a view in the background.
    ///
    /// Returns immediately; the handle only exists so callers that must
    /// outlive the notification (tests, short-lived processes) can wait for it.
    pub fn notify_view(&self, user_id: &str, video_id: &str) -> JoinHandle<()> {
        let service = self.clone();
        let request = RecommendationRequest::View {
            user_id: user_id.to_string(),
            video_id: video_id.to_string(),
        };

        tokio::spawn(async move {
            match service.send_view(&request).await {
                Ok(ack) if ack.is_success() => tracing::info!(
                    action = %request.action(),
                    ?request,
                    "Recommendation service recorded view"
                ),
                Ok(ack) => tracing::warn!(
                    action = %request.action(),
                    ?request,
                    ack = %ack,
                    "Recommendation service did not acknowledge view"
                ),
                Err(e) => tracing::warn!(
                    action = %request.action(),
                    ?request,
                    error = %e,
                    "Failed to notify recommendation service of view"
                ),
            }
        })
    }

    async fn send_view(&self, request: &RecommendationRequest) -> AppResult<ServiceStatus> {
        request.validate()?;

        let response = self
            .transport
            .call(request.to_message(), self.calls.view)
            .await?;

        Ok(ServiceStatus::from_message(&response))
    }

    /// Fetches recommended video IDs for a user.
    ///
    /// IDs are opaque; resolving them against the catalog is the caller's job.
    pub async fn query_recommendations(&self, user_id: &str) -> AppResult<Vec<String>> {
        let request = RecommendationRequest::Recommend {
            user_id: user_id.to_string(),
        };
        request.validate()?;

        let response = self
            .transport
            .call(request.to_message(), self.calls.recommend)
            .await
            .map_err(|e| {
                tracing::error!(user_id = %user_id, error = %e, "Recommendation query failed");
                AppError::from(e)
            })?;

        let status = ServiceStatus::from_message(&response);
        if status.is_error() {
            return Err(AppError::ExternalApi(status.message.unwrap_or_else(|| {
                "Recommendation service rejected the request".to_string()
            })));
        }

        let recommendations = parse_recommendations(&response);
        tracing::info!(
            user_id = %user_id,
            count = recommendations.len(),
            "Fetched recommendations"
        );

        Ok(recommendations)
    }

    /// Runs the connectivity check and reports whether it passed.
    ///
    /// Only logs; a failing check never aborts the caller.
    pub async fn self_test(&self) -> bool {
        let request = RecommendationRequest::SelfTest;

        match self
            .transport
            .call(request.to_message(), self.calls.self_test)
            .await
        {
            Ok(response) => {
                let ack = ServiceStatus::from_message(&response);
                if ack.is_success() {
                    tracing::info!(ack = %ack, "Recommendation service self-test passed");
                    true
                } else {
                    tracing::warn!(ack = %ack, "Recommendation service self-test rejected");
                    false
                }
            }
            Err(e) => {
                tracing::warn!(
                    action = %request.action(),
                    error = %e,
                    "Recommendation service self-test failed"
                );
                false
            }
        }
    }

    /// Runs the self-test on its own task so startup continues meanwhile
    pub fn spawn_self_test(&self) -> JoinHandle<bool> {
        let service = self.clone();
        tokio::spawn(async move { service.self_test().await })
    }
}

/// Waits for a background self-test so its outcome is logged before the
/// process exits. A task that panicked or was cancelled counts as failed.
pub async fn await_self_test(handle: JoinHandle<bool>) -> bool {
    match handle.await {
        Ok(passed) => passed,
        Err(e) => {
            tracing::warn!(error = %e, "Recommendation service self-test did not finish");
            false
        }
    }
}
