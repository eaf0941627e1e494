//! In-memory ledger for tests and offline demos.
//!
//! Implements [`LedgerSource`] over a vector of blocks with an unconfirmed
//! pool, plus `pop_blocks` for exercising reorg paths. Block ids chain over
//! the parent id and a per-ledger nonce so replacing a block always changes
//! the id even when the contents match.

use curve25519_dalek::montgomery::MontgomeryPoint;

use seraphis_crypto::hash::keccak256;
use seraphis_crypto::{Enote, KeyImage};

use crate::error::WalletError;
use crate::scanner::{ChunkEnote, ChunkSpentKeyImage, LedgerChunk, LedgerSource, PoolChunk};
use crate::{BlockId, TxId};

/// A transaction as the scanner sees it.
#[derive(Debug, Clone)]
pub struct MockTx {
    pub tx_id: TxId,
    pub input_context: [u8; 32],
    /// Outputs with their enote ephemeral pubkeys.
    pub outputs: Vec<(Enote, MontgomeryPoint)>,
    pub spent_key_images: Vec<KeyImage>,
}

#[derive(Debug, Clone)]
struct MockBlock {
    block_id: BlockId,
    timestamp: u64,
    txs: Vec<MockTx>,
}

/// In-memory chain plus unconfirmed pool.
#[derive(Default)]
pub struct MockLedger {
    blocks: Vec<MockBlock>,
    pool: Vec<MockTx>,
    block_nonce: u64,
}

impl MockLedger {
    pub fn new() -> MockLedger {
        MockLedger::default()
    }

    /// Number of blocks in the chain.
    pub fn height(&self) -> u64 {
        self.blocks.len() as u64
    }

    /// Append a block; returns its height.
    pub fn add_block(&mut self, txs: Vec<MockTx>) -> u64 {
        let height = self.blocks.len() as u64;
        let parent = self
            .blocks
            .last()
            .map(|block| block.block_id)
            .unwrap_or([0u8; 32]);

        self.block_nonce += 1;
        let block_id = keccak256(&[
            &parent,
            &height.to_le_bytes(),
            &self.block_nonce.to_le_bytes(),
        ]);

        self.blocks.push(MockBlock {
            block_id,
            timestamp: 1_600_000_000 + height * 120,
            txs,
        });
        height
    }

    /// Drop the top `count` blocks.
    pub fn pop_blocks(&mut self, count: usize) {
        let keep = self.blocks.len().saturating_sub(count);
        self.blocks.truncate(keep);
    }

    pub fn add_tx_to_pool(&mut self, tx: MockTx) {
        self.pool.push(tx);
    }

    pub fn clear_pool(&mut self) {
        self.pool.clear();
    }

    /// Move the whole pool into a new block; returns its height.
    pub fn mine_pool(&mut self) -> u64 {
        let txs = std::mem::take(&mut self.pool);
        self.add_block(txs)
    }
}

impl LedgerSource for MockLedger {
    fn next_chunk(
        &self,
        start_height: u64,
        max_chunk_size: usize,
    ) -> Result<Option<LedgerChunk>, WalletError> {
        let start = start_height as usize;
        if start >= self.blocks.len() {
            return Ok(None);
        }
        let end = self.blocks.len().min(start + max_chunk_size.max(1));

        let parent_block_id = if start == 0 {
            [0u8; 32]
        } else {
            self.blocks[start - 1].block_id
        };

        let mut chunk = LedgerChunk {
            start_height,
            parent_block_id,
            ..LedgerChunk::default()
        };
        for (offset, block) in self.blocks[start..end].iter().enumerate() {
            let block_index = start_height + offset as u64;
            chunk.block_ids.push(block.block_id);

            for tx in &block.txs {
                for (enote, enote_ephemeral_pubkey) in &tx.outputs {
                    chunk.enotes.push(ChunkEnote {
                        enote: *enote,
                        enote_ephemeral_pubkey: *enote_ephemeral_pubkey,
                        input_context: tx.input_context,
                        tx_id: tx.tx_id,
                        block_index,
                        block_timestamp: block.timestamp,
                    });
                }
                for key_image in &tx.spent_key_images {
                    chunk.spent_key_images.push(ChunkSpentKeyImage {
                        key_image: *key_image,
                        tx_id: tx.tx_id,
                        block_index,
                    });
                }
            }
        }

        Ok(Some(chunk))
    }

    fn top_block_id(&self) -> Option<BlockId> {
        self.blocks.last().map(|block| block.block_id)
    }

    fn unconfirmed_chunk(&self) -> PoolChunk {
        let mut pool_chunk = PoolChunk::default();
        for tx in &self.pool {
            for (enote, enote_ephemeral_pubkey) in &tx.outputs {
                pool_chunk.enotes.push((
                    *enote,
                    *enote_ephemeral_pubkey,
                    tx.input_context,
                    tx.tx_id,
                ));
            }
            for key_image in &tx.spent_key_images {
                pool_chunk.spent_key_images.push((*key_image, tx.tx_id));
            }
        }
        pool_chunk
    }
}
