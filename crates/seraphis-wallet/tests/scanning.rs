//! Scanning and enote-store behavior against an in-memory ledger.

mod common;

use curve25519_dalek::scalar::Scalar;

use seraphis_crypto::address::AddressIndex;
use seraphis_crypto::enote_utils;
use seraphis_wallet::mock_ledger::{MockLedger, MockTx};
use seraphis_wallet::scanner::refresh_enote_store;
use seraphis_wallet::{EnoteStore, OriginStatus, RefreshConfig, SpentStatus};

use common::{build_plain_enote, coinbase_tx, wallet};

const ALL_SPENT: [SpentStatus; 3] = [
    SpentStatus::SpentOffchain,
    SpentStatus::SpentUnconfirmed,
    SpentStatus::SpentOnchain,
];

fn confirmed_balance(store: &EnoteStore) -> u128 {
    store.balance(&[OriginStatus::Onchain], &ALL_SPENT)
}

fn tight_config() -> RefreshConfig {
    RefreshConfig {
        reorg_avoidance_increment: 1,
        max_chunk_size_hint: 1,
        max_partialscan_attempts: 4,
    }
}

#[test]
fn single_coinbase_is_found() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (keys, cipher) = wallet(0x0001);

    let mut ledger = MockLedger::new();
    ledger.add_block(vec![coinbase_tx(&keys, &cipher, AddressIndex::from_u128(0), 1, 0, 900)]);

    let mut store = EnoteStore::new(0);
    refresh_enote_store(&tight_config(), &keys, &cipher, &ledger, &mut store).unwrap();

    assert_eq!(store.num_records(), 1);
    assert_eq!(confirmed_balance(&store), 1);
    assert_eq!(
        store.balance(&[OriginStatus::Offchain, OriginStatus::Unconfirmed], &ALL_SPENT),
        0
    );
}

#[test]
fn balance_tracks_appends_and_pops() {
    let (keys, cipher) = wallet(0x0002);

    let mut ledger = MockLedger::new();
    ledger.add_block(vec![coinbase_tx(&keys, &cipher, AddressIndex::from_u128(0), 1, 0, 901)]);

    let mut store = EnoteStore::new(0);
    let config = tight_config();
    refresh_enote_store(&config, &keys, &cipher, &ledger, &mut store).unwrap();
    assert_eq!(confirmed_balance(&store), 1);

    // second coinbase in a second block
    ledger.add_block(vec![coinbase_tx(&keys, &cipher, AddressIndex::from_u128(1), 2, 1, 902)]);
    refresh_enote_store(&config, &keys, &cipher, &ledger, &mut store).unwrap();
    assert_eq!(confirmed_balance(&store), 3);

    // pop the second block; the scan must rewind and drop the record
    ledger.pop_blocks(1);
    refresh_enote_store(&config, &keys, &cipher, &ledger, &mut store).unwrap();
    assert_eq!(confirmed_balance(&store), 1);
    assert_eq!(store.num_records(), 1);
}

#[test]
fn incremental_scan_matches_fresh_scan() {
    let (keys, cipher) = wallet(0x0003);

    let mut ledger = MockLedger::new();
    for height in 0..7u64 {
        if height % 2 == 0 {
            ledger.add_block(vec![coinbase_tx(
                &keys,
                &cipher,
                AddressIndex::from_u128(height as u128),
                10 + height,
                height,
                1000 + height,
            )]);
        } else {
            ledger.add_block(vec![]);
        }
    }

    // incremental: scan after every block was already added above; here we
    // scan in two stages and compare to a from-genesis scan
    let config = tight_config();
    let mut incremental = EnoteStore::new(0);
    refresh_enote_store(&config, &keys, &cipher, &ledger, &mut incremental).unwrap();

    ledger.add_block(vec![coinbase_tx(&keys, &cipher, AddressIndex::from_u128(99), 5, 7, 1099)]);
    refresh_enote_store(&config, &keys, &cipher, &ledger, &mut incremental).unwrap();

    let mut fresh = EnoteStore::new(0);
    refresh_enote_store(&config, &keys, &cipher, &ledger, &mut fresh).unwrap();

    assert_eq!(incremental.num_records(), fresh.num_records());
    assert_eq!(confirmed_balance(&incremental), confirmed_balance(&fresh));
    assert_eq!(incremental.top_block_id(), fresh.top_block_id());
}

#[test]
fn reorg_with_replacement_blocks_recovers() {
    let (keys, cipher) = wallet(0x0004);

    let mut ledger = MockLedger::new();
    ledger.add_block(vec![]);
    ledger.add_block(vec![coinbase_tx(&keys, &cipher, AddressIndex::from_u128(0), 8, 1, 911)]);

    let config = tight_config();
    let mut store = EnoteStore::new(0);
    refresh_enote_store(&config, &keys, &cipher, &ledger, &mut store).unwrap();
    assert_eq!(confirmed_balance(&store), 8);

    // replace the paying block with an empty one and extend the chain
    ledger.pop_blocks(1);
    ledger.add_block(vec![]);
    ledger.add_block(vec![coinbase_tx(&keys, &cipher, AddressIndex::from_u128(1), 3, 2, 912)]);

    refresh_enote_store(&config, &keys, &cipher, &ledger, &mut store).unwrap();
    assert_eq!(confirmed_balance(&store), 3);
    assert_eq!(store.num_records(), 1);
}

#[test]
fn deep_reorg_exhausts_attempts() {
    let (keys, cipher) = wallet(0x0005);

    let mut ledger = MockLedger::new();
    for height in 0..12u64 {
        ledger.add_block(vec![coinbase_tx(
            &keys,
            &cipher,
            AddressIndex::from_u128(height as u128),
            1,
            height,
            2000 + height,
        )]);
    }

    let config = RefreshConfig {
        reorg_avoidance_increment: 1,
        max_chunk_size_hint: 100,
        max_partialscan_attempts: 2,
    };
    let mut store = EnoteStore::new(0);
    refresh_enote_store(&config, &keys, &cipher, &ledger, &mut store).unwrap();

    // rewrite the whole chain: deeper than 1+2 blocks of rewind can reach
    ledger.pop_blocks(12);
    for _ in 0..12u64 {
        ledger.add_block(vec![]);
    }

    let err = refresh_enote_store(&config, &keys, &cipher, &ledger, &mut store).unwrap_err();
    assert!(matches!(err, seraphis_wallet::WalletError::ReorgAttemptsExhausted));
}

#[test]
fn unconfirmed_pool_is_scanned_and_superseded() {
    let (keys, cipher) = wallet(0x0006);

    let mut ledger = MockLedger::new();
    ledger.add_block(vec![]);

    // a tx paying us sits in the pool
    let input_context = enote_utils::make_input_context_standard(&[[0x44u8; 32]]);
    let (enote, ephemeral_pubkey) = build_plain_enote(
        &keys,
        &cipher,
        AddressIndex::from_u128(4),
        70,
        Scalar::from(555u64),
        &input_context,
    );
    ledger.add_tx_to_pool(MockTx {
        tx_id: [0x77u8; 32],
        input_context,
        outputs: vec![(enote, ephemeral_pubkey)],
        spent_key_images: vec![],
    });

    let config = tight_config();
    let mut store = EnoteStore::new(0);
    refresh_enote_store(&config, &keys, &cipher, &ledger, &mut store).unwrap();

    assert_eq!(confirmed_balance(&store), 0);
    assert_eq!(store.balance(&[OriginStatus::Unconfirmed], &ALL_SPENT), 70);

    // mining the pool upgrades the record to onchain
    ledger.mine_pool();
    refresh_enote_store(&config, &keys, &cipher, &ledger, &mut store).unwrap();

    assert_eq!(confirmed_balance(&store), 70);
    assert_eq!(store.balance(&[OriginStatus::Unconfirmed], &ALL_SPENT), 0);
    assert_eq!(store.num_records(), 1);
}

#[test]
fn spent_key_image_updates_spent_context() {
    let (keys, cipher) = wallet(0x0007);

    let mut ledger = MockLedger::new();
    ledger.add_block(vec![coinbase_tx(&keys, &cipher, AddressIndex::from_u128(0), 40, 0, 921)]);

    let config = tight_config();
    let mut store = EnoteStore::new(0);
    refresh_enote_store(&config, &keys, &cipher, &ledger, &mut store).unwrap();

    let key_image = store.records().next().unwrap().key_image();

    // a tx spending our enote lands in block 1
    ledger.add_block(vec![MockTx {
        tx_id: [0x99u8; 32],
        input_context: enote_utils::make_input_context_standard(&[key_image]),
        outputs: vec![],
        spent_key_images: vec![key_image],
    }]);
    refresh_enote_store(&config, &keys, &cipher, &ledger, &mut store).unwrap();

    let contextual = store.get(&key_image).unwrap();
    assert_eq!(contextual.spent.status, SpentStatus::SpentOnchain);
    assert_eq!(contextual.spent.block_index, Some(1));
    assert_eq!(confirmed_balance(&store), 0);
    // origin is still onchain; only the spendability changed
    assert_eq!(store.balance(&[OriginStatus::Onchain], &[]), 40);
}
