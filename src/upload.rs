//! HTTP client for the Coveralls jobs API.

use tracing::debug;

use crate::ports::CoverallsService;

const BOUNDARY: &str = "----covpub-json-file-boundary";

/// Posts job payloads to `<server>/api/v1/jobs` as the `json_file` part of
/// a multipart form.
pub struct CoverallsClient {
    agent: ureq::Agent,
}

impl CoverallsClient {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .user_agent(concat!("covpub/", env!("CARGO_PKG_VERSION")))
                .build(),
        }
    }
}

impl Default for CoverallsClient {
    fn default() -> Self {
        Self::new()
    }
}

impl CoverallsService for CoverallsClient {
    fn upload(&self, payload: &str, server_url: &str) -> Result<(), String> {
        let url = jobs_url(server_url);
        debug!(%url, bytes = payload.len(), "uploading coverage job");

        let result = self
            .agent
            .post(&url)
            .set(
                "Content-Type",
                &format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .send_bytes(multipart_body(payload).as_bytes());

        match result {
            Ok(resp) => {
                debug!(status = resp.status(), "coverage job accepted");
                Ok(())
            }
            Err(ureq::Error::Status(code, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                Err(format!("HTTP {code}: {body}"))
            }
            Err(ureq::Error::Transport(transport)) => Err(transport.to_string()),
        }
    }
}

fn jobs_url(server_url: &str) -> String {
    format!("{}/api/v1/jobs", server_url.trim_end_matches('/'))
}

fn multipart_body(payload: &str) -> String {
    format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"json_file\"; filename=\"coverage.json\"\r\n\
         Content-Type: application/json\r\n\
         \r\n\
         {payload}\r\n\
         --{BOUNDARY}--\r\n"
    )
}
