//! SQLite persistence backends via SeaORM
//!
//! `ServerDbPersistService` stores every copy a storage server holds.
//! `ClientDbPersistService` stores a single user's lists.

use async_trait::async_trait;
use sea_orm::{prelude::Expr, *};
use shopring_api::VirtualNode;
use shopring_consistency::PnCounterMap;
use tracing::debug;

use crate::entity::{client_list, server_list};
use crate::model::{ClientList, ServerListRow};
use crate::traits::*;

fn merge_content(stored: &str, incoming: &str) -> anyhow::Result<String> {
    Ok(PnCounterMap::merge_json(stored, incoming)?)
}

fn to_rows(models: Vec<server_list::Model>) -> anyhow::Result<Vec<ServerListRow>> {
    models.into_iter().map(ServerListRow::try_from).collect()
}

// ============================================================================
// Server storage
// ============================================================================

pub struct ServerDbPersistService {
    db: DatabaseConnection,
}

impl ServerDbPersistService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// The live row for `(list_uuid, vnode)` holding `hinted_handoff`.
    ///
    /// Copies parked for another node never share a row with the copies this
    /// server keeps for itself, so `None` only matches unhinted rows.
    async fn find_live_model(
        &self,
        list_uuid: &str,
        vnode: VirtualNode,
        hinted_handoff: Option<VirtualNode>,
    ) -> anyhow::Result<Option<server_list::Model>> {
        let hint = match hinted_handoff {
            Some(node) => server_list::Column::HintedHandoff.eq(node.to_string()),
            None => server_list::Column::HintedHandoff.is_null(),
        };
        Ok(server_list::Entity::find()
            .filter(server_list::Column::ListUuid.eq(list_uuid))
            .filter(server_list::Column::VirtualnodeId.eq(vnode.to_db_id()))
            .filter(server_list::Column::ToDelete.eq(false))
            .filter(hint)
            .order_by_asc(server_list::Column::Id)
            .one(&self.db)
            .await?)
    }
}

#[async_trait]
impl ServerListPersistence for ServerDbPersistService {
    async fn list_exists(&self, list_uuid: &str, vnode: VirtualNode) -> anyhow::Result<bool> {
        Ok(self.find_live_model(list_uuid, vnode, None).await?.is_some())
    }

    async fn list_find(
        &self,
        list_uuid: &str,
        vnode: VirtualNode,
    ) -> anyhow::Result<Option<ServerListRow>> {
        self.find_live_model(list_uuid, vnode, None)
            .await?
            .map(ServerListRow::try_from)
            .transpose()
    }

    async fn list_find_any(&self, list_uuid: &str) -> anyhow::Result<Option<ServerListRow>> {
        server_list::Entity::find()
            .filter(server_list::Column::ListUuid.eq(list_uuid))
            .filter(server_list::Column::ToDelete.eq(false))
            .order_by_asc(server_list::Column::Replicated)
            .order_by_asc(server_list::Column::Id)
            .one(&self.db)
            .await?
            .map(ServerListRow::try_from)
            .transpose()
    }

    async fn list_create(
        &self,
        vnode: VirtualNode,
        list_uuid: &str,
        list_name: Option<&str>,
        list_content: &str,
    ) -> anyhow::Result<ServerListRow> {
        let entity = server_list::ActiveModel {
            virtualnode_id: Set(vnode.to_db_id()),
            list_uuid: Set(list_uuid.to_string()),
            list_name: Set(list_name.map(str::to_string)),
            list_content: Set(list_content.to_string()),
            replicated: Set(0),
            to_delete: Set(false),
            hinted_handoff: Set(None),
            ..Default::default()
        };

        let model = entity.insert(&self.db).await?;
        debug!(list = list_uuid, vnode = %vnode, "Created list row");
        ServerListRow::try_from(model)
    }

    async fn list_merge_content(
        &self,
        vnode: VirtualNode,
        list_uuid: &str,
        list_content: &str,
    ) -> anyhow::Result<Option<ServerListRow>> {
        let Some(model) = self.find_live_model(list_uuid, vnode, None).await? else {
            return Ok(None);
        };

        let merged = merge_content(&model.list_content, list_content)?;
        let mut active: server_list::ActiveModel = model.into();
        active.list_content = Set(merged);
        let model = active.update(&self.db).await?;
        ServerListRow::try_from(model).map(Some)
    }

    async fn list_upsert_replica(
        &self,
        vnode: VirtualNode,
        list_uuid: &str,
        list_name: Option<&str>,
        list_content: &str,
        level: i32,
        hinted_handoff: Option<VirtualNode>,
    ) -> anyhow::Result<ServerListRow> {
        let hint = hinted_handoff.map(|node| node.to_string());

        let model = match self.find_live_model(list_uuid, vnode, hinted_handoff).await? {
            Some(model) => {
                let merged = merge_content(&model.list_content, list_content)?;
                let name = model.list_name.clone().or(list_name.map(str::to_string));
                let mut active: server_list::ActiveModel = model.into();
                active.list_content = Set(merged);
                active.list_name = Set(name);
                active.replicated = Set(level);
                active.update(&self.db).await?
            }
            None => {
                // Reject malformed content before inserting
                PnCounterMap::from_json(list_content)?;
                server_list::ActiveModel {
                    virtualnode_id: Set(vnode.to_db_id()),
                    list_uuid: Set(list_uuid.to_string()),
                    list_name: Set(list_name.map(str::to_string)),
                    list_content: Set(list_content.to_string()),
                    replicated: Set(level),
                    to_delete: Set(false),
                    hinted_handoff: Set(hint),
                    ..Default::default()
                }
                .insert(&self.db)
                .await?
            }
        };

        debug!(list = list_uuid, vnode = %vnode, level, "Stored replica");
        ServerListRow::try_from(model)
    }

    async fn keys_by_level(
        &self,
        vnode: VirtualNode,
        level: i32,
    ) -> anyhow::Result<Vec<ServerListRow>> {
        let models = server_list::Entity::find()
            .filter(server_list::Column::VirtualnodeId.eq(vnode.to_db_id()))
            .filter(server_list::Column::Replicated.eq(level))
            .filter(server_list::Column::ToDelete.eq(false))
            .filter(server_list::Column::HintedHandoff.is_null())
            .order_by_asc(server_list::Column::Id)
            .all(&self.db)
            .await?;
        to_rows(models)
    }

    async fn keys_all_by_level(&self, level: i32) -> anyhow::Result<Vec<ServerListRow>> {
        let models = server_list::Entity::find()
            .filter(server_list::Column::Replicated.eq(level))
            .filter(server_list::Column::ToDelete.eq(false))
            .filter(server_list::Column::HintedHandoff.is_null())
            .order_by_asc(server_list::Column::Id)
            .all(&self.db)
            .await?;
        to_rows(models)
    }

    async fn list_mark_to_delete(&self, vnode: VirtualNode, list_uuid: &str) -> anyhow::Result<u64> {
        let result = server_list::Entity::update_many()
            .col_expr(server_list::Column::ToDelete, Expr::value(true))
            .filter(server_list::Column::ListUuid.eq(list_uuid))
            .filter(server_list::Column::VirtualnodeId.eq(vnode.to_db_id()))
            .filter(server_list::Column::HintedHandoff.is_null())
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    async fn list_mark_row_to_delete(&self, row_id: i32) -> anyhow::Result<bool> {
        let result = server_list::Entity::update_many()
            .col_expr(server_list::Column::ToDelete, Expr::value(true))
            .filter(server_list::Column::Id.eq(row_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn purge_marked(&self) -> anyhow::Result<u64> {
        let result = server_list::Entity::delete_many()
            .filter(server_list::Column::ToDelete.eq(true))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    async fn update_replication_level(
        &self,
        vnode: VirtualNode,
        list_uuid: &str,
        level: i32,
    ) -> anyhow::Result<bool> {
        let result = server_list::Entity::update_many()
            .col_expr(server_list::Column::Replicated, Expr::value(level))
            .filter(server_list::Column::ListUuid.eq(list_uuid))
            .filter(server_list::Column::VirtualnodeId.eq(vnode.to_db_id()))
            .filter(server_list::Column::ToDelete.eq(false))
            .filter(server_list::Column::HintedHandoff.is_null())
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn list_set_hint(
        &self,
        row_id: i32,
        hinted_handoff: Option<VirtualNode>,
    ) -> anyhow::Result<bool> {
        let hint = hinted_handoff.map(|node| node.to_string());
        let result = server_list::Entity::update_many()
            .col_expr(server_list::Column::HintedHandoff, Expr::value(hint))
            .filter(server_list::Column::Id.eq(row_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn hinted_rows(&self) -> anyhow::Result<Vec<ServerListRow>> {
        let models = server_list::Entity::find()
            .filter(server_list::Column::HintedHandoff.is_not_null())
            .filter(server_list::Column::ToDelete.eq(false))
            .order_by_asc(server_list::Column::Id)
            .all(&self.db)
            .await?;
        to_rows(models)
    }

    async fn all_live_rows(&self) -> anyhow::Result<Vec<ServerListRow>> {
        let models = server_list::Entity::find()
            .filter(server_list::Column::ToDelete.eq(false))
            .order_by_asc(server_list::Column::Id)
            .all(&self.db)
            .await?;
        to_rows(models)
    }
}

// ============================================================================
// Client storage
// ============================================================================

pub struct ClientDbPersistService {
    db: DatabaseConnection,
}

impl ClientDbPersistService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// `name`, or `name (<short uuid>)` when another list already uses it
    async fn unique_name(&self, uuid: &str, name: &str) -> anyhow::Result<String> {
        match self.list_find_by_name(name).await? {
            Some(existing) if existing.uuid != uuid => {
                let short: String = uuid.chars().take(8).collect();
                Ok(format!("{} ({})", name, short))
            }
            _ => Ok(name.to_string()),
        }
    }
}

#[async_trait]
impl ClientListPersistence for ClientDbPersistService {
    async fn list_create(&self, uuid: &str, name: &str, content: &str) -> anyhow::Result<()> {
        let entity = client_list::ActiveModel {
            list_uuid: Set(uuid.to_string()),
            list_name: Set(name.to_string()),
            list_content: Set(content.to_string()),
        };

        client_list::Entity::insert(entity).exec(&self.db).await?;
        Ok(())
    }

    async fn list_exists_by_name(&self, name: &str) -> anyhow::Result<bool> {
        Ok(self.list_find_by_name(name).await?.is_some())
    }

    async fn list_find_by_name(&self, name: &str) -> anyhow::Result<Option<ClientList>> {
        Ok(client_list::Entity::find()
            .filter(client_list::Column::ListName.eq(name))
            .one(&self.db)
            .await?
            .map(ClientList::from))
    }

    async fn list_find(&self, uuid: &str) -> anyhow::Result<Option<ClientList>> {
        Ok(client_list::Entity::find_by_id(uuid.to_string())
            .one(&self.db)
            .await?
            .map(ClientList::from))
    }

    async fn list_all(&self) -> anyhow::Result<Vec<ClientList>> {
        Ok(client_list::Entity::find()
            .order_by_asc(client_list::Column::ListName)
            .all(&self.db)
            .await?
            .into_iter()
            .map(ClientList::from)
            .collect())
    }

    async fn list_save_content(&self, uuid: &str, content: &str) -> anyhow::Result<bool> {
        let result = client_list::Entity::update_many()
            .col_expr(client_list::Column::ListContent, Expr::value(content))
            .filter(client_list::Column::ListUuid.eq(uuid))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn list_upsert(&self, uuid: &str, name: &str, content: &str) -> anyhow::Result<ClientList> {
        if let Some(existing) = self.list_find(uuid).await? {
            let merged = merge_content(&existing.content, content)?;
            self.list_save_content(uuid, &merged).await?;
            return Ok(ClientList {
                content: merged,
                ..existing
            });
        }

        PnCounterMap::from_json(content)?;
        let name = self.unique_name(uuid, name).await?;
        self.list_create(uuid, &name, content).await?;
        Ok(ClientList {
            uuid: uuid.to_string(),
            name,
            content: content.to_string(),
        })
    }

    async fn list_delete(&self, uuid: &str) -> anyhow::Result<bool> {
        let result = client_list::Entity::delete_by_id(uuid.to_string())
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}
