use async_trait::async_trait;
use exam_core::model::{ExamId, ExamMode, SessionId};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::mapping::started_exam_from_wire;
use super::wire::{ErrorBody, StartExamRequest, StartExamResponse, SubmitExamRequest};
use crate::api::{AnswerSync, BackendError, ExamBackend, ExamResult, StartedExam, SubmittedAnswer};
use crate::auth::SessionContext;
use crate::config::BackendConfig;

/// `ExamBackend` over JSON/HTTPS.
///
/// Every request carries the bearer credential from the shared
/// `SessionContext`; a 401 response invalidates that context.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    config: BackendConfig,
    context: SessionContext,
}

impl HttpBackend {
    /// # Errors
    ///
    /// Returns `BackendError::Network` if the HTTP client cannot be built.
    pub fn new(config: BackendConfig, context: SessionContext) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| BackendError::Network(err.to_string()))?;
        Ok(Self {
            client,
            config,
            context,
        })
    }

    #[must_use]
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.context.bearer_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|err| BackendError::Network(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            self.context.invalidate();
            return Err(BackendError::Unauthorized);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::into_message)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
        Err(BackendError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
        response
            .json::<T>()
            .await
            .map_err(|err| BackendError::Decode(err.to_string()))
    }
}

#[async_trait]
impl ExamBackend for HttpBackend {
    async fn start_exam(
        &self,
        exam_id: ExamId,
        mode: ExamMode,
    ) -> Result<StartedExam, BackendError> {
        let url = self.config.endpoint(&format!("exams/{exam_id}/start"));
        let request = self.client.post(url).json(&StartExamRequest {
            mode: mode.as_str(),
        });
        let response = self.send(request).await?;
        let body: StartExamResponse = Self::decode(response).await?;
        started_exam_from_wire(body, mode)
    }

    async fn submit_answer(&self, sync: &AnswerSync) -> Result<(), BackendError> {
        let url = self
            .config
            .endpoint(&format!("sessions/{}/answers", sync.session_id));
        self.send(self.client.put(url).json(sync)).await?;
        Ok(())
    }

    async fn submit_exam(
        &self,
        session_id: &SessionId,
        answers: &[SubmittedAnswer],
    ) -> Result<ExamResult, BackendError> {
        let url = self.config.endpoint(&format!("sessions/{session_id}/submit"));
        let request = self.client.post(url).json(&SubmitExamRequest { answers });
        let response = self.send(request).await?;
        Self::decode(response).await
    }
}
