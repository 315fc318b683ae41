//! Domain types returned by the persistence layer

use serde::{Deserialize, Serialize};
use shopring_api::{ShoppingListData, VirtualNode};

use crate::entity::{client_list, server_list};

/// One stored copy of a list on a server
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerListRow {
    pub id: i32,
    pub vnode: VirtualNode,
    pub list_uuid: String,
    pub list_name: Option<String>,
    pub list_content: String,
    /// 0 = primary, 1.. = replica rank
    pub level: i32,
    pub to_delete: bool,
    /// Node this copy is meant for when parked here temporarily
    pub hinted_handoff: Option<VirtualNode>,
}

impl ServerListRow {
    pub fn is_primary(&self) -> bool {
        self.level == 0
    }

    pub fn to_data(&self) -> ShoppingListData {
        ShoppingListData {
            list_uuid: self.list_uuid.clone(),
            list_name: self.list_name.clone(),
            list_content: self.list_content.clone(),
            vnode: self.vnode,
            level: self.level,
        }
    }
}

impl TryFrom<server_list::Model> for ServerListRow {
    type Error = anyhow::Error;

    fn try_from(model: server_list::Model) -> Result<Self, Self::Error> {
        let vnode = VirtualNode::from_db_id(model.virtualnode_id);
        let hinted_handoff = match model.hinted_handoff.as_deref() {
            Some(hint) if !hint.is_empty() => Some(hint.parse::<VirtualNode>()?),
            _ => None,
        };
        Ok(Self {
            id: model.id,
            vnode,
            list_uuid: model.list_uuid,
            list_name: model.list_name,
            list_content: model.list_content,
            level: model.replicated,
            to_delete: model.to_delete,
            hinted_handoff,
        })
    }
}

/// A list in a user's local database
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientList {
    pub uuid: String,
    pub name: String,
    pub content: String,
}

impl From<client_list::Model> for ClientList {
    fn from(model: client_list::Model) -> Self {
        Self {
            uuid: model.list_uuid,
            name: model.list_name,
            content: model.list_content,
        }
    }
}
