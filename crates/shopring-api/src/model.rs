//! Request and response models exchanged over HTTP
//!
//! All payloads use camelCase field names.

use serde::{Deserialize, Serialize};

use crate::node::VirtualNode;

// API paths, relative to `shopring_common::API_PREFIX`
pub const HEALTH_PATH: &str = "/health";
pub const LISTS_UPDATE_PATH: &str = "/lists/update";
pub const LISTS_GET_PATH: &str = "/lists/get";
pub const LISTS_REPLICATE_PATH: &str = "/lists/replicate";
pub const KEYS_PATH: &str = "/keys";
pub const KEYS_PURGE_PATH: &str = "/keys/purge";
pub const KEYS_REPLICATE_PATH: &str = "/keys/replicate";
pub const RING_PATH: &str = "/ring";
pub const RING_JOIN_PATH: &str = "/ring/join";
pub const RING_LEAVE_PATH: &str = "/ring/leave";
pub const RING_SYNC_PATH: &str = "/ring/sync";

pub const ROLE_SERVER: &str = "server";
pub const ROLE_ROUTER: &str = "router";

/// Push a list state to the cluster. Routers fill in `vnode` before forwarding.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateListRequest {
    pub list_uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_name: Option<String>,
    pub list_content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vnode: Option<VirtualNode>,
    /// Set by a router when the owner was down and the copy is parked elsewhere
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hinted_handoff: Option<VirtualNode>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetListRequest {
    pub list_uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vnode: Option<VirtualNode>,
}

/// Server to server copy of a list at a replication level
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicateListRequest {
    pub list_uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_name: Option<String>,
    pub list_content: String,
    pub vnode: VirtualNode,
    pub level: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hinted_handoff: Option<VirtualNode>,
}

/// A stored list as returned by servers and routers
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingListData {
    pub list_uuid: String,
    #[serde(default)]
    pub list_name: Option<String>,
    pub list_content: String,
    pub vnode: VirtualNode,
    pub level: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateListResponse {
    pub message: String,
    pub list: ShoppingListData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hinted_handoff: Option<VirtualNode>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeysQuery {
    pub vnode: VirtualNode,
    #[serde(default)]
    pub level: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeysResponse {
    pub vnode: VirtualNode,
    pub level: i32,
    pub lists: Vec<ShoppingListData>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeResponse {
    pub purged: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicateKeysResponse {
    pub replicated: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalanceResponse {
    pub version: u64,
    pub moved: usize,
    pub promoted: usize,
    pub marked: usize,
    pub hinted: usize,
}

// ============================================================================
// Ring membership
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberInfo {
    pub id: u32,
    pub address: String,
}

/// Versioned ring membership broadcast by routers
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RingSnapshot {
    pub version: u64,
    pub vnodes_per_server: u32,
    pub members: Vec<MemberInfo>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub server_id: u32,
    pub address: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    pub server_id: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthInfo {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
}

impl HealthInfo {
    pub fn server(id: u32) -> Self {
        Self {
            role: ROLE_SERVER.to_string(),
            id: Some(id),
        }
    }

    pub fn router() -> Self {
        Self {
            role: ROLE_ROUTER.to_string(),
            id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_camel_case() {
        let request = UpdateListRequest {
            list_uuid: "u-1".to_string(),
            list_name: Some("groceries".to_string()),
            list_content: "{}".to_string(),
            vnode: Some(VirtualNode::new(1, 2)),
            hinted_handoff: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["listUuid"], "u-1");
        assert_eq!(json["listName"], "groceries");
        assert_eq!(json["listContent"], "{}");
        assert_eq!(json["vnode"], "S1V2");
        assert!(json.get("hintedHandoff").is_none());
    }

    #[test]
    fn test_update_request_optional_fields() {
        let request: UpdateListRequest =
            serde_json::from_str(r#"{"listUuid":"a","listContent":"{}"}"#).unwrap();
        assert_eq!(request.list_name, None);
        assert_eq!(request.vnode, None);
    }

    #[test]
    fn test_ring_snapshot_json() {
        let snapshot = RingSnapshot {
            version: 3,
            vnodes_per_server: 3,
            members: vec![MemberInfo {
                id: 1,
                address: "http://127.0.0.1:5001".to_string(),
            }],
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["vnodesPerServer"], 3);
        assert_eq!(json["members"][0]["address"], "http://127.0.0.1:5001");
    }

    #[test]
    fn test_health_info() {
        assert_eq!(HealthInfo::server(2).id, Some(2));
        assert_eq!(HealthInfo::router().role, ROLE_ROUTER);
    }
}
