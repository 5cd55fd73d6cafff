//! Group fan-out — replicate one operation across the members of a group.

use glowhub_domain::command::{CommandKind, GroupOperation};
use glowhub_domain::error::GlowHubError;
use glowhub_domain::id::{CommandId, DeviceAddress, GroupKey};

use crate::queue::CommandQueue;
use crate::registry::LightRegistry;

pub struct GroupService {
    registry: LightRegistry,
    queue: CommandQueue,
}

impl GroupService {
    pub fn new(registry: LightRegistry, queue: CommandQueue) -> Self {
        Self { registry, queue }
    }

    /// Lights currently carrying the group's identifier.
    ///
    /// # Errors
    ///
    /// Returns [`GlowHubError::NotFound`] for unknown group keys.
    pub fn members(&self, key: &GroupKey) -> Result<Vec<DeviceAddress>, GlowHubError> {
        self.registry.members(key)
    }

    /// Queue `op` once per member, each as its own command.
    ///
    /// Members succeed or fail independently once executed; a failing
    /// member does not stop the others.
    ///
    /// # Errors
    ///
    /// Returns [`GlowHubError::NotFound`] for unknown group keys or
    /// [`GlowHubError::QueueClosed`] when the worker has stopped.
    #[tracing::instrument(skip(self, key), fields(group = %key))]
    pub fn group_operation(
        &self,
        key: &GroupKey,
        op: GroupOperation,
    ) -> Result<Vec<CommandId>, GlowHubError> {
        let members = self.registry.members(key)?;
        tracing::debug!(members = members.len(), "fanning out group operation");
        members
            .into_iter()
            .map(|address| {
                self.queue.submit(
                    address,
                    CommandKind::GroupOp {
                        group: key.clone(),
                        op: op.clone(),
                    },
                )
            })
            .collect()
    }
}
