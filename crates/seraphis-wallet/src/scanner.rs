//! Ledger scanning state machine.
//!
//! Pull-based chunked refresh: ask the ledger for the chunk at the store's
//! next height, verify it chains onto the store's top block id, extract
//! owned records, apply them, repeat. A parent-id mismatch is a reorg: the
//! store rewinds by a growing multiple of `reorg_avoidance_increment` and
//! the scan retries, up to `max_partialscan_attempts` times.
//!
//! The unconfirmed pool is scanned separately after the chain tip is
//! reached and never drives reorg logic.

use curve25519_dalek::montgomery::MontgomeryPoint;
use serde::{Deserialize, Serialize};

use seraphis_crypto::address_tag::CipherContext;
use seraphis_crypto::{Enote, JamtisKeys, KeyImage};

use crate::error::WalletError;
use crate::record_utils::try_get_enote_record;
use crate::records::{OriginContext, SpentContext};
use crate::store::EnoteStore;
use crate::{BlockId, TxId};

/// One enote observed in a ledger chunk, with everything recovery needs.
#[derive(Debug, Clone)]
pub struct ChunkEnote {
    pub enote: Enote,
    pub enote_ephemeral_pubkey: MontgomeryPoint,
    pub input_context: [u8; 32],
    pub tx_id: TxId,
    pub block_index: u64,
    pub block_timestamp: u64,
}

/// A key image observed spent in a ledger chunk.
#[derive(Debug, Clone, Copy)]
pub struct ChunkSpentKeyImage {
    pub key_image: KeyImage,
    pub tx_id: TxId,
    pub block_index: u64,
}

/// A contiguous range of scanned blocks.
///
/// `enotes` are ordered by block index, then intra-block tx index, then
/// intra-tx output index.
#[derive(Debug, Clone, Default)]
pub struct LedgerChunk {
    pub start_height: u64,
    /// Id of the block at `start_height - 1`; all zero at genesis.
    pub parent_block_id: BlockId,
    pub block_ids: Vec<BlockId>,
    pub enotes: Vec<ChunkEnote>,
    pub spent_key_images: Vec<ChunkSpentKeyImage>,
}

/// Unconfirmed-pool contents.
#[derive(Debug, Clone, Default)]
pub struct PoolChunk {
    pub enotes: Vec<(Enote, MontgomeryPoint, [u8; 32], TxId)>,
    pub spent_key_images: Vec<(KeyImage, TxId)>,
}

/// Capability interface onto the ledger. The `next_chunk` call is the
/// scanner's only suspension point; nothing else blocks on I/O.
pub trait LedgerSource {
    /// Chunk starting at `start_height`, or `None` when the store has
    /// caught up with the chain tip. `max_chunk_size` is advisory; the
    /// ledger may return fewer blocks.
    fn next_chunk(
        &self,
        start_height: u64,
        max_chunk_size: usize,
    ) -> Result<Option<LedgerChunk>, WalletError>;

    /// Current chain tip.
    fn top_block_id(&self) -> Option<BlockId>;

    /// Current unconfirmed pool; empty by default for sources without one.
    fn unconfirmed_chunk(&self) -> PoolChunk {
        PoolChunk::default()
    }
}

/// Refresh tuning knobs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Blocks rewound per reorg retry (multiplied by the attempt number).
    pub reorg_avoidance_increment: u64,
    /// Advisory chunk size passed to the ledger.
    pub max_chunk_size_hint: usize,
    /// Reorg retries before giving up.
    pub max_partialscan_attempts: usize,
}

impl Default for RefreshConfig {
    fn default() -> RefreshConfig {
        RefreshConfig {
            reorg_avoidance_increment: 10,
            max_chunk_size_hint: 100,
            max_partialscan_attempts: 3,
        }
    }
}

/// Scan the ledger into the enote store until the chain tip is reached,
/// then scan the unconfirmed pool.
pub fn refresh_enote_store(
    config: &RefreshConfig,
    keys: &JamtisKeys,
    cipher_context: &CipherContext,
    ledger: &dyn LedgerSource,
    store: &mut EnoteStore,
) -> Result<(), WalletError> {
    let mut reorg_attempts: usize = 0;
    let mut records_found: usize = 0;
    let mut enotes_seen: usize = 0;

    loop {
        let start_height = store.next_height();
        let chunk = ledger.next_chunk(start_height, config.max_chunk_size_hint)?;
        if let Some(chunk) = &chunk {
            if chunk.start_height != start_height || chunk.block_ids.is_empty() {
                return Err(WalletError::MisalignedChunk);
            }
        }

        // reorg check: a returned chunk must chain onto our top block; when
        // the ledger reports no further chunk, its tip must be our top
        // block (the chain may have shrunk below us)
        let reorg = match (store.top_block_id(), &chunk) {
            (Some(top_block_id), Some(chunk)) => chunk.parent_block_id != top_block_id,
            (Some(top_block_id), None) => ledger.top_block_id() != Some(top_block_id),
            (None, _) => false,
        };
        if reorg {
            reorg_attempts += 1;
            if reorg_attempts > config.max_partialscan_attempts {
                return Err(WalletError::ReorgAttemptsExhausted);
            }

            let rewind_depth = config.reorg_avoidance_increment * reorg_attempts as u64;
            let new_top_height = start_height.saturating_sub(rewind_depth + 1);
            log::debug!(
                "reorg detected at height {start_height}; rewinding to {new_top_height} \
                 (attempt {reorg_attempts})"
            );
            store.rewind_to(new_top_height);
            continue;
        }

        match chunk {
            Some(chunk) => {
                enotes_seen += chunk.enotes.len();
                records_found += apply_onchain_chunk(&chunk, keys, cipher_context, store);
            }
            None => break,
        }
    }

    // pool scan: re-derived from scratch each refresh
    store.clear_nonconfirmed();
    let pool = ledger.unconfirmed_chunk();
    for (enote, enote_ephemeral_pubkey, input_context, tx_id) in &pool.enotes {
        enotes_seen += 1;
        if let Some(record) =
            try_get_enote_record(enote, enote_ephemeral_pubkey, input_context, keys, cipher_context)
        {
            records_found += 1;
            store.update_with_record(record, OriginContext::unconfirmed(*tx_id));
        }
    }
    for (key_image, tx_id) in &pool.spent_key_images {
        store.update_spent(key_image, SpentContext::spent_unconfirmed(*tx_id));
    }

    log::info!(
        "refresh complete at height {:?}: {} owned records among {} scanned enotes",
        store.top_height(),
        records_found,
        enotes_seen
    );
    Ok(())
}

fn apply_onchain_chunk(
    chunk: &LedgerChunk,
    keys: &JamtisKeys,
    cipher_context: &CipherContext,
    store: &mut EnoteStore,
) -> usize {
    let mut records_found = 0;

    for chunk_enote in &chunk.enotes {
        if let Some(record) = try_get_enote_record(
            &chunk_enote.enote,
            &chunk_enote.enote_ephemeral_pubkey,
            &chunk_enote.input_context,
            keys,
            cipher_context,
        ) {
            records_found += 1;
            store.update_with_record(
                record,
                OriginContext::onchain(
                    chunk_enote.block_index,
                    chunk_enote.block_timestamp,
                    chunk_enote.tx_id,
                ),
            );
        }
    }

    for spent in &chunk.spent_key_images {
        store.update_spent(
            &spent.key_image,
            SpentContext::spent_onchain(spent.block_index, spent.tx_id),
        );
    }

    for (offset, block_id) in chunk.block_ids.iter().enumerate() {
        store.append_block(chunk.start_height + offset as u64, *block_id);
    }

    log::debug!(
        "applied chunk {}..{}: {} owned of {} enotes",
        chunk.start_height,
        chunk.start_height + chunk.block_ids.len() as u64,
        records_found,
        chunk.enotes.len()
    );
    records_found
}
