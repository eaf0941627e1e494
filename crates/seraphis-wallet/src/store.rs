//! Enote store: full records keyed by key image, with origin and spent
//! contexts and balance queries.
//!
//! The store always reflects a prefix of the ledger: it tracks the block
//! ids it has scanned so the scanner can detect reorgs, and `rewind_to`
//! atomically drops everything above a fork point. Context updates are
//! monotone toward on-chain except through a rewind.

use std::collections::HashMap;

use seraphis_crypto::KeyImage;

use crate::records::{
    ContextualEnoteRecord, EnoteRecord, OriginContext, OriginStatus, SpentContext, SpentStatus,
};
use crate::BlockId;

#[derive(Default)]
pub struct EnoteStore {
    records: HashMap<KeyImage, ContextualEnoteRecord>,
    /// Ids of scanned blocks, aligned to heights `refresh_base_height..`.
    block_ids: Vec<BlockId>,
    refresh_base_height: u64,
}

impl EnoteStore {
    /// Empty store that will begin scanning at `refresh_base_height`.
    pub fn new(refresh_base_height: u64) -> EnoteStore {
        EnoteStore {
            records: HashMap::new(),
            block_ids: Vec::new(),
            refresh_base_height,
        }
    }

    pub fn refresh_base_height(&self) -> u64 {
        self.refresh_base_height
    }

    /// Height the next scan chunk should start at.
    pub fn next_height(&self) -> u64 {
        self.refresh_base_height + self.block_ids.len() as u64
    }

    /// Height of the last scanned block.
    pub fn top_height(&self) -> Option<u64> {
        self.next_height().checked_sub(1).filter(|_| !self.block_ids.is_empty())
    }

    /// Id of the last scanned block.
    pub fn top_block_id(&self) -> Option<BlockId> {
        self.block_ids.last().copied()
    }

    pub fn block_id_at(&self, height: u64) -> Option<BlockId> {
        let offset = height.checked_sub(self.refresh_base_height)?;
        self.block_ids.get(offset as usize).copied()
    }

    /// Record that `height` was scanned. Heights must arrive contiguously.
    pub fn append_block(&mut self, height: u64, block_id: BlockId) {
        debug_assert_eq!(height, self.next_height());
        self.block_ids.push(block_id);
    }

    /// Apply a freshly scanned record. New key images are inserted;
    /// existing ones only upgrade toward a more confirmed origin.
    pub fn update_with_record(&mut self, record: EnoteRecord, origin: OriginContext) {
        let key_image = record.key_image;
        match self.records.get_mut(&key_image) {
            None => {
                self.records.insert(
                    key_image,
                    ContextualEnoteRecord {
                        record,
                        origin,
                        spent: SpentContext::unspent(),
                    },
                );
            }
            Some(existing) => {
                if origin.status.confirmation_rank() >= existing.origin.status.confirmation_rank()
                {
                    existing.origin = origin;
                }
            }
        }
    }

    /// Apply an observed spend of a stored record.
    pub fn update_spent(&mut self, key_image: &KeyImage, spent: SpentContext) {
        if let Some(existing) = self.records.get_mut(key_image) {
            if spent.status.confirmation_rank() >= existing.spent.status.confirmation_rank() {
                existing.spent = spent;
            }
        }
    }

    /// Drop all offchain/unconfirmed observations; called before a fresh
    /// pool scan so vanished transactions do not linger.
    pub fn clear_nonconfirmed(&mut self) {
        self.records.retain(|_, contextual| {
            contextual.origin.status == OriginStatus::Onchain
        });
        for contextual in self.records.values_mut() {
            if matches!(
                contextual.spent.status,
                SpentStatus::SpentOffchain | SpentStatus::SpentUnconfirmed
            ) {
                contextual.spent = SpentContext::unspent();
            }
        }
    }

    /// Rewind so that `new_top_height` is the highest scanned block.
    /// On-chain records above the fork are dropped (a rescan re-finds them
    /// if they are still in the chain); spends above it revert to unspent.
    pub fn rewind_to(&mut self, new_top_height: u64) {
        let keep = new_top_height
            .checked_sub(self.refresh_base_height)
            .map(|offset| offset as usize + 1)
            .unwrap_or(0);
        self.block_ids.truncate(keep);

        self.records.retain(|_, contextual| {
            !(contextual.origin.status == OriginStatus::Onchain
                && contextual.origin.block_index.is_some_and(|index| index > new_top_height))
        });
        for contextual in self.records.values_mut() {
            if contextual.spent.status == SpentStatus::SpentOnchain
                && contextual.spent.block_index.is_some_and(|index| index > new_top_height)
            {
                contextual.spent = SpentContext::unspent();
            }
        }
    }

    pub fn contains(&self, key_image: &KeyImage) -> bool {
        self.records.contains_key(key_image)
    }

    pub fn get(&self, key_image: &KeyImage) -> Option<&ContextualEnoteRecord> {
        self.records.get(key_image)
    }

    pub fn records(&self) -> impl Iterator<Item = &ContextualEnoteRecord> {
        self.records.values()
    }

    pub fn num_records(&self) -> usize {
        self.records.len()
    }

    /// Sum of amounts over records whose origin status is in
    /// `allowed_origins` and whose spent status is not in
    /// `forbidden_spent`.
    pub fn balance(
        &self,
        allowed_origins: &[OriginStatus],
        forbidden_spent: &[SpentStatus],
    ) -> u128 {
        self.records
            .values()
            .filter(|contextual| allowed_origins.contains(&contextual.origin.status))
            .filter(|contextual| !forbidden_spent.contains(&contextual.spent.status))
            .map(|contextual| contextual.amount() as u128)
            .sum()
    }
}
