//! HTTP-backed REPL session
//!
//! Talks to a remote REPL environment service over JSON. The service assigns
//! a session id on reset; all later calls carry it. The credential handed to
//! `reset` is forwarded verbatim so the environment can make its own sub-LLM
//! calls - this client never inspects it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::session::{Observation, ReplSession, RunState, SessionError, StepResult};

#[derive(Serialize)]
struct ResetRequest<'a> {
    context: &'a str,
    task_prompt: &'a str,
    max_iterations: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    credential: Option<&'a str>,
}

#[derive(Deserialize)]
struct ResetResponse {
    session_id: String,
    observation: Observation,
}

#[derive(Serialize)]
struct SessionRequest<'a> {
    session_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
}

/// REPL session backed by a remote environment service
pub struct RemoteReplSession {
    base_url: String,
    client: reqwest::Client,
    session_id: Option<String>,
    closed: bool,
}

impl RemoteReplSession {
    /// Create a session client for the given environment base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
            session_id: None,
            closed: false,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn session_id(&self) -> Result<&str, SessionError> {
        self.session_id
            .as_deref()
            .ok_or_else(|| SessionError::Protocol("session not initialized; call reset first".to_string()))
    }

    async fn post<Req: Serialize, Resp: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &Req,
    ) -> Result<Resp, SessionError> {
        let response = self
            .client
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SessionError::Protocol(format!(
                "environment returned {} on /{}: {}",
                status, path, body
            )));
        }

        Ok(response.json::<Resp>().await?)
    }
}

#[async_trait]
impl ReplSession for RemoteReplSession {
    async fn reset(
        &mut self,
        context: &str,
        task_prompt: &str,
        max_iterations: usize,
        credential: Option<&str>,
    ) -> Result<Observation, SessionError> {
        let request = ResetRequest {
            context,
            task_prompt,
            max_iterations,
            credential,
        };

        let response: ResetResponse = self.post("reset", &request).await?;
        self.session_id = Some(response.session_id);
        self.closed = false;
        Ok(response.observation)
    }

    async fn execute(&mut self, code: &str) -> Result<StepResult, SessionError> {
        let session_id = self.session_id()?.to_string();
        let request = SessionRequest {
            session_id: &session_id,
            code: Some(code),
        };
        self.post("execute", &request).await
    }

    async fn state(&mut self) -> Result<RunState, SessionError> {
        let session_id = self.session_id()?.to_string();
        let request = SessionRequest {
            session_id: &session_id,
            code: None,
        };
        self.post("state", &request).await
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        // Idempotent: a second close (or close before reset) is a no-op
        if self.closed {
            return Ok(());
        }
        let Some(session_id) = self.session_id.clone() else {
            self.closed = true;
            return Ok(());
        };

        let request = SessionRequest {
            session_id: &session_id,
            code: None,
        };
        let _: serde_json::Value = self.post("close", &request).await?;
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_request_omits_absent_credential() {
        let req = ResetRequest {
            context: "ctx",
            task_prompt: "task",
            max_iterations: 5,
            credential: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("credential"));

        let req = ResetRequest {
            credential: Some("tok"),
            ..req
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"credential\":\"tok\""));
    }

    #[test]
    fn test_reset_response_parse() {
        let raw = r#"{
            "session_id": "abc",
            "observation": {"iteration": 0, "max_iterations": 10, "context_length": 42}
        }"#;
        let parsed: ResetResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.session_id, "abc");
        assert_eq!(parsed.observation.iteration, 0);
        assert_eq!(parsed.observation.context_length, 42);
        assert!(parsed.observation.result.stdout.is_empty());
    }

    #[tokio::test]
    async fn test_execute_before_reset_is_protocol_error() {
        let mut session = RemoteReplSession::new("http://localhost:9");
        let err = session.execute("print(1)").await.unwrap_err();
        assert!(matches!(err, SessionError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_close_before_reset_is_noop() {
        let mut session = RemoteReplSession::new("http://localhost:9");
        assert!(session.close().await.is_ok());
        // Second close stays a no-op
        assert!(session.close().await.is_ok());
    }
}
