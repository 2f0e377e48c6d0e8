//! Per-transaction pipeline.
//!
//! fetch → decode → blocklist → one item per message and file stub.
//! A failing item is logged and counted; the remaining items still run.

use super::MonitorCore;
use crate::domain::{
    downloaded_summary, sanitize_file_name, summarize, MonitorError, ProcessOutcome, SkipReason,
};
use crate::ports::{ContentStore, IndexStore};
use p2fk_01_codec::{DecodedRecord, RecordDecoder};
use p2fk_02_peer_network::PeerNetwork;
use p2fk_03_content_resolver::{ContentError, ContentResolve};
use shared_types::{IndexedItem, MonitorEvent, TxId};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// An item ready to persist and the summary its event carries.
struct Pending {
    item: IndexedItem,
    summary: String,
}

impl<N, D, S, R, C> MonitorCore<N, D, S, R, C>
where
    N: PeerNetwork + ?Sized + 'static,
    D: RecordDecoder + 'static,
    S: IndexStore + 'static,
    R: ContentResolve + 'static,
    C: ContentStore + 'static,
{
    pub(crate) async fn process(
        &self,
        id: &TxId,
        cancel: &CancellationToken,
    ) -> Result<ProcessOutcome, MonitorError> {
        self.metrics.transaction_processed();

        let details = match self.network.get_transaction(id).await {
            Ok(details) => details,
            Err(e) => {
                self.metrics.transaction_skipped(SkipReason::FetchFailed);
                return Err(e.into());
            }
        };
        let Some(record) = self.decoder.decode(&details.to_carrier_transaction()) else {
            trace!(tx_id = %id, "[p2fk-04] No P2FK record");
            self.metrics.transaction_skipped(SkipReason::NotP2fk);
            return Ok(ProcessOutcome::Skipped(SkipReason::NotP2fk));
        };

        if let Some(signer) = &record.signed_by {
            match self.store.is_address_blocked(signer).await {
                Ok(false) => {}
                Ok(true) => {
                    debug!(tx_id = %id, %signer, "[p2fk-04] Signer blocked");
                    self.metrics.transaction_skipped(SkipReason::BlockedSigner);
                    return Ok(ProcessOutcome::Skipped(SkipReason::BlockedSigner));
                }
                Err(e) => {
                    self.metrics.transaction_skipped(SkipReason::StoreFailed);
                    return Err(e.into());
                }
            }
        }

        let mut items = 0;
        let mut failed = 0;
        for message in &record.messages {
            let pending = match self.message_item(&record, message, cancel).await {
                Ok(pending) => pending,
                Err(MonitorError::Cancelled) => return Err(MonitorError::Cancelled),
                Err(e) => {
                    warn!(tx_id = %id, error = %e, "[p2fk-04] Message not indexed");
                    failed += 1;
                    continue;
                }
            };
            match self.persist(&record, pending).await {
                Ok(_) => items += 1,
                Err(e) => {
                    warn!(tx_id = %id, error = %e, "[p2fk-04] Failed to save item");
                    failed += 1;
                }
            }
        }
        for file in &record.files {
            let pending = Pending {
                item: IndexedItem::file(record.tx_id, file.name.as_str(), file.declared_len),
                summary: file.name.clone(),
            };
            match self.persist(&record, pending).await {
                Ok(_) => items += 1,
                Err(e) => {
                    warn!(tx_id = %id, file = %file.name, error = %e, "[p2fk-04] Failed to save item");
                    failed += 1;
                }
            }
        }
        Ok(ProcessOutcome::Indexed { items, failed })
    }

    /// A message item, or a content-ref item when the text points at
    /// content that could be downloaded.
    async fn message_item(
        &self,
        record: &DecodedRecord,
        message: &str,
        cancel: &CancellationToken,
    ) -> Result<Pending, MonitorError> {
        let Some(reference) = self.extractor.extract(message) else {
            return Ok(Pending {
                item: IndexedItem::message(record.tx_id, message),
                summary: summarize(message, self.config.summary_chars),
            });
        };

        let bytes = match self.resolver.download(&reference.hash, cancel).await {
            Ok(bytes) => bytes,
            Err(ContentError::Cancelled { .. }) => return Err(MonitorError::Cancelled),
            Err(e) => {
                self.metrics.content_failed();
                return Err(e.into());
            }
        };
        let file_name = reference.file_name_or_default();
        let path = self
            .content
            .save(&sanitize_file_name(&file_name), &bytes)
            .await?;
        debug!(
            tx_id = %record.tx_id,
            hash = %reference.hash,
            bytes = bytes.len(),
            "[p2fk-04] Content downloaded"
        );
        Ok(Pending {
            summary: downloaded_summary(&file_name),
            item: IndexedItem::content_ref(
                record.tx_id,
                message,
                reference.hash,
                file_name,
                bytes.len() as u64,
                path,
            ),
        })
    }

    async fn persist(&self, record: &DecodedRecord, pending: Pending) -> Result<u64, MonitorError> {
        let item = pending
            .item
            .signed_by(record.signed_by.clone())
            .with_block(record.block.clone());
        let (tx_id, kind) = (item.tx_id, item.kind);
        let item_id = self.store.save_indexed_item(item).await?;
        self.metrics.item_indexed(kind);
        info!(tx_id = %tx_id, %kind, item_id, "[p2fk-04] Item indexed");
        self.events
            .publish(MonitorEvent::item_indexed(tx_id, kind, pending.summary))
            .await;
        Ok(item_id)
    }
}
