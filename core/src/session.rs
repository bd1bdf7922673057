//! Session state plus request building and response parsing.
//!
//! # Design
//! `Session` holds the session id and base URL and nothing else. Each
//! operation is split into a `build_*` method that produces an `HttpRequest`
//! and a `parse_*` method that consumes an `HttpResponse`. All four share one
//! request builder and one status policy, so cookie handling and error
//! semantics cannot drift between endpoints.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;
use uuid::Uuid;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::params::{
    FullParams, ProjectExecute, ProjectExecutionStatistics, ProjectGlobalAbort, ProjectNodes,
    ToFullParams,
};
use crate::types::{ExecutionStatistics, Node, NodesResponse};

pub const PROJECT_NODES_PATH: &str = "/project/nodes";
pub const EXECUTION_STATISTICS_PATH: &str = "/project/execution-statistics";
pub const EXECUTE_PATH: &str = "/project/execute";
pub const GLOBAL_ABORT_PATH: &str = "/project/global-abort";

/// Name of the cookie that carries the session id.
pub const SESSION_COOKIE: &str = "sid";

/// Statuses treated as success.
const SUCCESS_STATUSES: [u16; 2] = [200, 202];

/// Stands in for the body of a failed response that could not be read.
pub const UNREADABLE_BODY: &str = "*failed to retrieve*";

/// An authenticated session with a PolyAnalyst server.
///
/// The session id is obtained elsewhere (login is not handled here).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    sid: String,
    base_url: String,
}

impl Session {
    pub fn new(base_url: &str, sid: &str) -> Self {
        Self {
            sid: sid.to_string(),
            base_url: base_url.to_string(),
        }
    }

    pub fn sid(&self) -> &str {
        &self.sid
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_list_project_nodes(&self, prj_uuid: Uuid) -> Result<HttpRequest, ApiError> {
        let params = ProjectNodes { prj_uuid }.to_full_params()?;
        self.build_request(HttpMethod::Get, PROJECT_NODES_PATH, params)
    }

    pub fn build_execution_statistics(&self, prj_uuid: Uuid) -> Result<HttpRequest, ApiError> {
        let params = ProjectExecutionStatistics { prj_uuid }.to_full_params()?;
        self.build_request(HttpMethod::Get, EXECUTION_STATISTICS_PATH, params)
    }

    pub fn build_execute_project(&self, params: &ProjectExecute) -> Result<HttpRequest, ApiError> {
        self.build_request(HttpMethod::Post, EXECUTE_PATH, params.to_full_params()?)
    }

    pub fn build_abort_project(&self, prj_uuid: Uuid) -> Result<HttpRequest, ApiError> {
        let params = ProjectGlobalAbort { prj_uuid }.to_full_params()?;
        self.build_request(HttpMethod::Post, GLOBAL_ABORT_PATH, params)
    }

    pub fn parse_list_project_nodes(&self, response: HttpResponse) -> Result<Vec<Node>, ApiError> {
        let body = check_status(response)?;
        let nodes: NodesResponse = decode(&body)?;
        Ok(nodes.nodes)
    }

    pub fn parse_execution_statistics(
        &self,
        response: HttpResponse,
    ) -> Result<ExecutionStatistics, ApiError> {
        let body = check_status(response)?;
        decode(&body)
    }

    pub fn parse_execute_project(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(response)?;
        Ok(())
    }

    pub fn parse_abort_project(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(response)?;
        Ok(())
    }

    fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        params: FullParams,
    ) -> Result<HttpRequest, ApiError> {
        let joined = format!("{}{path}", self.base_url.trim_end_matches('/'));
        let mut url = Url::parse(&joined).map_err(|e| ApiError::RequestBuild(format!("{joined}: {e}")))?;
        if url.cannot_be_a_base() {
            return Err(ApiError::RequestBuild(format!("{joined}: not an http(s) URL")));
        }
        url.set_query(Some(&params.encode_query()));

        if !is_cookie_value(&self.sid) {
            return Err(ApiError::RequestBuild(
                "session id contains characters not allowed in a cookie value".to_string(),
            ));
        }
        let mut headers = vec![("cookie".to_string(), format!("{SESSION_COOKIE}={}", self.sid))];
        if params.body.is_some() {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }

        Ok(HttpRequest {
            method,
            url: url.into(),
            headers,
            body: params.body,
        })
    }
}

/// RFC 6265 `cookie-octet`: visible ASCII except `"`, `,`, `;` and `\`.
fn is_cookie_value(value: &str) -> bool {
    value
        .bytes()
        .all(|b| matches!(b, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E))
}

/// Apply the status policy and hand back the body of a successful response.
///
/// A bad status wins over an unreadable body; the body read failure is only
/// reported on its own when the status was acceptable.
fn check_status(response: HttpResponse) -> Result<Vec<u8>, ApiError> {
    let status = response.status;
    if !SUCCESS_STATUSES.contains(&status) {
        let body = match &response.body {
            Ok(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            Err(_) => UNREADABLE_BODY.to_string(),
        };
        warn!(status, "unexpected response status");
        return Err(ApiError::BadStatus { status, body });
    }
    response.body.map_err(|reason| {
        warn!(status, %reason, "response body could not be read");
        ApiError::BodyRead(reason)
    })
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::Decode(e.to_string()))
}
