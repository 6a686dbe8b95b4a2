use async_trait::async_trait;

use super::request::InboundRequest;
use super::response::InfoResponse;
use crate::domain::InfoError;

/// A named request-handling behavior exposed to peer nodes.
///
/// The registry files each capability under the lowercase form of `name()`.
/// Handlers that need deferred work hold their own `Arc<TaskDispatcher>`.
#[async_trait]
pub trait InfoRequest: Send + Sync {
    fn name(&self) -> &str;

    /// `arguments` are the path segments following the capability name.
    async fn handle(
        &self,
        request: &InboundRequest,
        arguments: &[String],
    ) -> Result<InfoResponse, InfoError>;
}
