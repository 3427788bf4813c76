//! Cascading deletion of linked responses.
//!
//! When a message that invoked a command is deleted, the responses linked to
//! it through [`EventRouter::link_messages`](crate::EventRouter::link_messages)
//! can be removed as well. The platform side of deletion is supplied by the
//! integrator through [`MessageDeleter`]; every failure is swallowed.

use async_trait::async_trait;
use futures::future::join_all;
use tracing::debug;

/// Platform operations needed to delete messages.
#[async_trait]
pub trait MessageDeleter: Send + Sync {
    /// Whether the bot may delete several messages in one call here.
    fn can_bulk_delete(&self) -> bool;

    /// Deletes several messages at once.
    async fn bulk_delete(&self, ids: Vec<u64>) -> anyhow::Result<()>;

    /// Deletes one message.
    async fn delete(&self, id: u64) -> anyhow::Result<()>;
}

/// Deletes `ids`, in bulk when there is more than one and the deleter allows
/// it, otherwise one by one. Errors are logged and ignored.
pub(crate) async fn delete_responses(deleter: &dyn MessageDeleter, mut ids: Vec<u64>) {
    if ids.is_empty() {
        return;
    }
    ids.sort_unstable();

    if ids.len() > 1 && deleter.can_bulk_delete() {
        let count = ids.len();
        if let Err(e) = deleter.bulk_delete(ids).await {
            debug!(count, error = %e, "Bulk deletion of linked responses failed");
        }
        return;
    }

    let results = join_all(ids.iter().map(|&id| deleter.delete(id))).await;
    for (id, result) in ids.iter().zip(results) {
        if let Err(e) = result {
            debug!(message_id = id, error = %e, "Deletion of linked response failed");
        }
    }
}
