//! Per-operation parameter sets and their wire form.
//!
//! Each parameter set is turned into a `FullParams` (query pairs plus an
//! optional JSON body) by a pure conversion; `Session` joins the result with
//! the base URL and session cookie.

use serde::Serialize;
use url::form_urlencoded;
use uuid::Uuid;

use crate::error::ApiError;
use crate::types::NodeRef;

const PRJ_UUID: &str = "prjUUID";

/// Query parameters and body of a single request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FullParams {
    pub query: Vec<(String, String)>,
    pub body: Option<String>,
}

impl FullParams {
    /// Encode the query pairs as `application/x-www-form-urlencoded`.
    pub fn encode_query(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.query)
            .finish()
    }
}

/// Conversion of a parameter set into its wire form.
pub trait ToFullParams {
    fn to_full_params(&self) -> Result<FullParams, ApiError>;
}

fn project_query(prj_uuid: Uuid) -> Vec<(String, String)> {
    vec![(PRJ_UUID.to_string(), prj_uuid.to_string())]
}

/// Parameters of `GET /project/nodes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectNodes {
    pub prj_uuid: Uuid,
}

impl ToFullParams for ProjectNodes {
    fn to_full_params(&self) -> Result<FullParams, ApiError> {
        Ok(FullParams {
            query: project_query(self.prj_uuid),
            body: None,
        })
    }
}

/// Parameters of `GET /project/execution-statistics`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectExecutionStatistics {
    pub prj_uuid: Uuid,
}

impl ToFullParams for ProjectExecutionStatistics {
    fn to_full_params(&self) -> Result<FullParams, ApiError> {
        Ok(FullParams {
            query: project_query(self.prj_uuid),
            body: None,
        })
    }
}

/// Parameters of `POST /project/global-abort`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectGlobalAbort {
    pub prj_uuid: Uuid,
}

impl ToFullParams for ProjectGlobalAbort {
    fn to_full_params(&self) -> Result<FullParams, ApiError> {
        Ok(FullParams {
            query: project_query(self.prj_uuid),
            body: None,
        })
    }
}

/// Parameters of `POST /project/execute`.
///
/// An empty `nodes` list executes the whole project; otherwise only the
/// listed nodes run and they are sent in the JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectExecute {
    pub prj_uuid: Uuid,
    pub nodes: Vec<NodeRef>,
}

impl ProjectExecute {
    pub fn whole_project(prj_uuid: Uuid) -> Self {
        Self {
            prj_uuid,
            nodes: Vec::new(),
        }
    }

    pub fn with_nodes(prj_uuid: Uuid, nodes: Vec<NodeRef>) -> Self {
        Self { prj_uuid, nodes }
    }
}

#[derive(Serialize)]
struct ExecuteBody<'a> {
    #[serde(rename = "prjUUID")]
    prj_uuid: Uuid,
    nodes: &'a [NodeRef],
}

impl ToFullParams for ProjectExecute {
    fn to_full_params(&self) -> Result<FullParams, ApiError> {
        let body = if self.nodes.is_empty() {
            None
        } else {
            let body = ExecuteBody {
                prj_uuid: self.prj_uuid,
                nodes: &self.nodes,
            };
            Some(serde_json::to_string(&body).map_err(|e| ApiError::Serialization(e.to_string()))?)
        };
        Ok(FullParams {
            query: project_query(self.prj_uuid),
            body,
        })
    }
}
