use chain_data::{EnhancedTransaction, TxDirection};
use cost_basis::{
    load_or_rebuild, rebuild_from_history, CostBasisLedger, CostBasisMethod, FlatPrice,
    LedgerError,
};

fn tx(txid: &str, direction: TxDirection, amount: u64, net: i64, fee: u64, ts: Option<u64>) -> EnhancedTransaction {
    EnhancedTransaction {
        txid: txid.to_string(),
        direction,
        inputs: Vec::new(),
        outputs: Vec::new(),
        fee,
        amount,
        net_amount: net,
        confirmed: ts.is_some(),
        block_height: ts.map(|t| (t / 600) as u32),
        timestamp: ts,
        cost_basis: None,
    }
}

/// Newest first, the order providers return history in.
fn history() -> Vec<EnhancedTransaction> {
    vec![
        tx("pending", TxDirection::Received, 10_000_000, 10_000_000, 500, None),
        tx("self", TxDirection::SelfTransfer, 0, -1_000, 1_000, Some(4_000)),
        tx("spend", TxDirection::Sent, 49_990_000, -50_000_000, 10_000, Some(3_000)),
        tx("buy2", TxDirection::Received, 40_000_000, 40_000_000, 800, Some(2_000)),
        tx("buy1", TxDirection::Received, 30_000_000, 30_000_000, 700, Some(1_000)),
    ]
}

fn price_by_time(ts: u64) -> Option<f64> {
    match ts {
        1_000 => Some(20_000.0),
        2_000 => Some(30_000.0),
        3_000 => Some(40_000.0),
        4_000 => Some(45_000.0),
        _ => None,
    }
}

#[test]
fn rebuild_replays_oldest_first() {
    let mut txs = history();
    let ledger = rebuild_from_history(CostBasisMethod::Fifo, &mut txs, &price_by_time).unwrap();

    // 0.7 bought, 0.5 spent, 0.00001 fee on the self transfer.
    assert!((ledger.total_held() - 0.19999).abs() < 1e-8);

    let spend = txs.iter().find(|t| t.txid == "spend").unwrap();
    let data = spend.cost_basis.unwrap();
    assert_eq!(data.price_usd, 40_000.0);
    assert!((data.cost_basis_usd.unwrap() - 12_000.0).abs() < 1e-6);
    assert!((data.realized_gain_usd.unwrap() - 8_000.0).abs() < 1e-6);

    let buy1 = txs.iter().find(|t| t.txid == "buy1").unwrap();
    assert!((buy1.cost_basis.unwrap().value_usd - 6_000.0).abs() < 1e-6);
    assert!(buy1.cost_basis.unwrap().realized_gain_usd.is_none());

    let pending = txs.iter().find(|t| t.txid == "pending").unwrap();
    assert!(pending.cost_basis.is_none());
}

#[test]
fn missing_price_fails_rebuild() {
    let mut txs = history();
    let oracle = |ts: u64| if ts == 3_000 { None } else { Some(1.0) };
    match rebuild_from_history(CostBasisMethod::Fifo, &mut txs, &oracle) {
        Err(LedgerError::MissingPrice { txid, timestamp }) => {
            assert_eq!(txid, "spend");
            assert_eq!(timestamp, 3_000);
        }
        other => panic!("expected MissingPrice, got {other:?}"),
    }
}

#[test]
fn load_prefers_saved_blob() {
    let mut saved = CostBasisLedger::new(CostBasisMethod::Fifo);
    saved.record_acquisition("only", 1.0, 10_000.0, 5).unwrap();
    let blob = saved.to_blob().unwrap();

    let mut txs = history();
    let ledger =
        load_or_rebuild(Some(&blob), CostBasisMethod::Fifo, &mut txs, &FlatPrice(1.0)).unwrap();
    assert_eq!(ledger.lot_count(), 1);
    assert!(txs.iter().all(|t| t.cost_basis.is_none()));
}

#[test]
fn load_rebuilds_on_bad_blob() {
    let mut txs = history();
    let ledger =
        load_or_rebuild(Some("{broken"), CostBasisMethod::Fifo, &mut txs, &FlatPrice(30_000.0))
            .unwrap();
    assert!(ledger.total_held() > 0.0);
    assert!(txs.iter().any(|t| t.cost_basis.is_some()));
}

#[test]
fn lots_conserve_holdings_and_cost() {
    for method in [CostBasisMethod::Fifo, CostBasisMethod::Lifo] {
        let mut ledger = CostBasisLedger::new(method);
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = || {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            seed
        };

        for step in 0..500u64 {
            let amount = (next() % 5_000_000 + 1) as f64 / 1e8;
            let price = (next() % 60_000 + 1_000) as f64;
            if next() % 3 == 0 {
                ledger.record_disposal("out", amount, price, step).unwrap();
            } else {
                ledger.record_acquisition("in", amount, price, step).unwrap();
            }

            let held: f64 = ledger.lots().map(|l| l.remaining_amount).sum();
            let cost: f64 = ledger.lots().map(|l| l.remaining_amount * l.acquisition_price).sum();
            assert!((held - ledger.total_held()).abs() < 1e-8, "{method} step {step}");
            assert!((cost - ledger.total_cost()).abs() < 1e-6, "{method} step {step}");
            assert!(ledger.lots().all(|l| l.remaining_amount >= 1e-8));
        }
    }
}
