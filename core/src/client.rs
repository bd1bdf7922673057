//! Blocking PolyAnalyst API client.
//!
//! `Client` pairs a `Session` with a `Transport`: every operation builds a
//! request, runs it through the transport and parses the response. Nothing is
//! retried and errors reach the caller unchanged.

use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::params::ProjectExecute;
use crate::session::Session;
use crate::transport::{Transport, UreqTransport};
use crate::types::{ExecutionStatistics, Node};

pub struct Client<T = UreqTransport> {
    session: Session,
    transport: T,
}

impl Client<UreqTransport> {
    pub fn new(session: Session) -> Self {
        Self::with_transport(session, UreqTransport::new())
    }
}

impl<T: Transport> Client<T> {
    pub fn with_transport(session: Session, transport: T) -> Self {
        Self { session, transport }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Nodes of a project, in server order (`GET /project/nodes`).
    pub fn list_project_nodes(&self, prj_uuid: Uuid) -> Result<Vec<Node>, ApiError> {
        debug!(%prj_uuid, "listing project nodes");
        let req = self.session.build_list_project_nodes(prj_uuid)?;
        let response = self.transport.execute(req)?;
        self.session.parse_list_project_nodes(response)
    }

    /// Execution statistics of a project (`GET /project/execution-statistics`).
    pub fn execution_statistics(&self, prj_uuid: Uuid) -> Result<ExecutionStatistics, ApiError> {
        debug!(%prj_uuid, "fetching execution statistics");
        let req = self.session.build_execution_statistics(prj_uuid)?;
        let response = self.transport.execute(req)?;
        self.session.parse_execution_statistics(response)
    }

    /// Start execution (`POST /project/execute`). Returns once the server has
    /// accepted the request, not when execution finishes.
    pub fn execute_project(&self, params: &ProjectExecute) -> Result<(), ApiError> {
        debug!(prj_uuid = %params.prj_uuid, nodes = params.nodes.len(), "executing project");
        let req = self.session.build_execute_project(params)?;
        let response = self.transport.execute(req)?;
        self.session.parse_execute_project(response)
    }

    /// Abort everything running in a project (`POST /project/global-abort`).
    pub fn abort_project(&self, prj_uuid: Uuid) -> Result<(), ApiError> {
        debug!(%prj_uuid, "aborting project");
        let req = self.session.build_abort_project(prj_uuid)?;
        let response = self.transport.execute(req)?;
        self.session.parse_abort_project(response)
    }
}
