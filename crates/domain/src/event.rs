//! Events — notifications pushed to the protocol adapter when observable
//! state changes or a queued write fails.

use serde::{Deserialize, Serialize};

use crate::id::{CommandId, DeviceAddress, GroupKey};
use crate::light::LightState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum HubEvent {
    /// A light's mirror changed (poll, acknowledged write, commit).
    LightChanged(LightState),
    /// A light crossed the offline threshold.
    LightOffline { address: DeviceAddress },
    /// Group membership was recomputed.
    GroupChanged { key: GroupKey, members: usize },
    /// A queued write failed and was dropped.
    CommandFailed {
        command: CommandId,
        target: DeviceAddress,
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_serialize_with_event_tag() {
        let event = HubEvent::GroupChanged {
            key: GroupKey::from_label("Office"),
            members: 3,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "group_changed");
        assert_eq!(json["members"], 3);
    }
}
