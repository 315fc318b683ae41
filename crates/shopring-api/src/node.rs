//! Virtual node identifiers (`S<server>V<index>`)

use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use shopring_common::ShopringError;

/// One position of a physical server on the hash ring
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VirtualNode {
    pub server_id: u32,
    pub index: u32,
}

impl VirtualNode {
    pub fn new(server_id: u32, index: u32) -> Self {
        Self { server_id, index }
    }

    /// Compact integer form stored in the server database.
    ///
    /// The 64 packed bits are stored as-is, so server ids with the top bit set
    /// come out as negative column values.
    pub fn to_db_id(self) -> i64 {
        let packed = (u64::from(self.server_id) << 32) | u64::from(self.index);
        packed as i64
    }

    pub fn from_db_id(id: i64) -> Self {
        let packed = id as u64;
        Self {
            server_id: (packed >> 32) as u32,
            index: (packed & 0xFFFF_FFFF) as u32,
        }
    }
}

impl Display for VirtualNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "S{}V{}", self.server_id, self.index)
    }
}

impl FromStr for VirtualNode {
    type Err = ShopringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ShopringError::IllegalArgument(format!("invalid virtual node '{}'", s));

        let rest = s.trim().strip_prefix('S').ok_or_else(invalid)?;
        let (server, index) = rest.split_once('V').ok_or_else(invalid)?;
        let server_id = server.parse::<u32>().map_err(|_| invalid())?;
        let index = index.parse::<u32>().map_err(|_| invalid())?;

        Ok(Self { server_id, index })
    }
}

impl TryFrom<String> for VirtualNode {
    type Error = ShopringError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VirtualNode> for String {
    fn from(node: VirtualNode) -> Self {
        node.to_string()
    }
}
