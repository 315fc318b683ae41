//! Hinted handoff: deliver parked copies to the nodes they were meant for

use std::{sync::Arc, time::Duration};

use shopring_api::{ReplicateListRequest, UpdateListRequest, VirtualNode};
use shopring_common::ShopringError;
use shopring_persistence::ServerListRow;
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{debug, info, warn};

use super::storage::StorageService;

/// Result of one handoff round
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HandoffReport {
    pub delivered: usize,
    pub pending: usize,
}

enum Route<'a> {
    Remote(&'a str, VirtualNode),
    Local(VirtualNode),
    Drop,
}

impl StorageService {
    /// Try to deliver every hinted row once
    pub async fn handoff_once(&self) -> anyhow::Result<HandoffReport> {
        let rows = self.persistence().hinted_rows().await?;
        let mut report = HandoffReport::default();
        if rows.is_empty() {
            return Ok(report);
        }

        let view = self.cluster().read().clone();
        for row in rows {
            let Some(hint) = row.hinted_handoff else {
                continue;
            };

            // A hint for a server that left the ring is rerouted to the current owner
            let route = if let Some(address) = view.address_of_node(hint) {
                Route::Remote(address, hint)
            } else if !row.is_primary() {
                Route::Drop
            } else {
                match view.ring().responsible(&row.list_uuid) {
                    Some(owner) if owner.server_id == self.server_id() => Route::Local(owner),
                    Some(owner) => match view.address_of_node(owner) {
                        Some(address) => Route::Remote(address, owner),
                        None => Route::Drop,
                    },
                    None => {
                        report.pending += 1;
                        continue;
                    }
                }
            };

            let delivered = match route {
                Route::Remote(address, target) => self.deliver(address, target, &row).await,
                Route::Local(owner) => {
                    self.persistence()
                        .list_upsert_replica(
                            owner,
                            &row.list_uuid,
                            row.list_name.as_deref(),
                            &row.list_content,
                            0,
                            None,
                        )
                        .await?;
                    true
                }
                Route::Drop => {
                    debug!(list = %row.list_uuid, hint = %hint, "Dropping hint for departed node");
                    true
                }
            };

            if delivered {
                self.persistence().list_mark_row_to_delete(row.id).await?;
                report.delivered += 1;
            } else {
                report.pending += 1;
            }
        }

        if report.delivered > 0 {
            self.persistence().purge_marked().await?;
            info!(
                delivered = report.delivered,
                pending = report.pending,
                "Hinted handoff round finished"
            );
        }
        Ok(report)
    }

    async fn deliver(&self, address: &str, target: VirtualNode, row: &ServerListRow) -> bool {
        let result: Result<(), ShopringError> = if row.is_primary() {
            let request = UpdateListRequest {
                list_uuid: row.list_uuid.clone(),
                list_name: row.list_name.clone(),
                list_content: row.list_content.clone(),
                vnode: Some(target),
                hinted_handoff: None,
            };
            self.peers().update_list(address, &request).await.map(|_| ())
        } else {
            let request = ReplicateListRequest {
                list_uuid: row.list_uuid.clone(),
                list_name: row.list_name.clone(),
                list_content: row.list_content.clone(),
                vnode: target,
                level: row.level,
                hinted_handoff: None,
            };
            self.peers().replicate_list(address, &request).await.map(|_| ())
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                debug!(list = %row.list_uuid, target = %target, error = %e, "Handoff still pending");
                false
            }
        }
    }
}

/// Run handoff rounds every `interval` until shutdown
pub fn start_handoff_task(
    storage: Arc<StorageService>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = storage.handoff_once().await {
                        warn!(error = %e, "Hinted handoff round failed");
                    }
                }
                _ = shutdown.recv() => {
                    info!("Hinted handoff task stopped");
                    break;
                }
            }
        }
    })
}
