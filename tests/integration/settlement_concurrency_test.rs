// Concurrency race tests: N truly parallel settles of one composite id must
// yield exactly one Settled, one state mutation, and one OrderPaid event.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use splitpay::config::BillingConfig;
use splitpay::core::Currency;
use splitpay::installments::{InstallmentRepository, InstallmentService, InstallmentStatus};
use splitpay::modules::gateways::PaymentChannel;
use splitpay::modules::orders::Order;
use splitpay::settlements::{OrderPaidListener, SettlementEngine, SettlementResult};

#[derive(Default)]
struct CountingListener {
    fired: AtomicUsize,
}

impl OrderPaidListener for CountingListener {
    fn on_order_paid(&self, _order: &Order) {
        self.fired.fetch_add(1, Ordering::SeqCst);
    }
}

async fn seed(
    repo: &Arc<InstallmentRepository>,
) -> (String, String) {
    let order = Order::new();
    let order_id = order.id.clone();
    repo.insert_order(order).await.unwrap();

    let service = InstallmentService::new(repo.clone(), BillingConfig::default());
    let installment = service
        .create_installment(
            &order_id,
            dec!(1200.00),
            3,
            Currency::CNY,
            NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
        )
        .await
        .unwrap();
    (installment.no, order_id)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_duplicates_settle_exactly_once() {
    let repo = Arc::new(InstallmentRepository::new());
    let (no, _) = seed(&repo).await;

    let listener = Arc::new(CountingListener::default());
    let engine = Arc::new(SettlementEngine::new(repo.clone()).on_order_paid(listener.clone()));

    let concurrency = 32;
    let mut handles = Vec::with_capacity(concurrency);
    for i in 0..concurrency {
        let engine = engine.clone();
        let trade_id = format!("{}_0", no);
        let channel = if i % 2 == 0 {
            PaymentChannel::Alipay
        } else {
            PaymentChannel::Wechat
        };
        handles.push(tokio::spawn(async move {
            engine
                .settle(&trade_id, channel, &format!("rcpt-{}", i), dec!(406.00))
                .await
                .unwrap()
        }));
    }

    let mut settled = 0;
    let mut already = 0;
    for handle in handles {
        match handle.await.unwrap() {
            SettlementResult::Settled => settled += 1,
            SettlementResult::AlreadySettled => already += 1,
            SettlementResult::NotFound => panic!("unexpected NotFound"),
        }
    }

    assert_eq!(settled, 1);
    assert_eq!(already, concurrency - 1);
    assert_eq!(listener.fired.load(Ordering::SeqCst), 1);

    // Exactly one receipt won the race and it is never overwritten
    let installment = repo.find_installment(&no).await.unwrap();
    assert!(installment.item(0).unwrap().is_settled());
    assert_eq!(installment.status, InstallmentStatus::Repaying);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_distinct_sequences_all_settle() {
    let repo = Arc::new(InstallmentRepository::new());
    let (no, order_id) = seed(&repo).await;

    let listener = Arc::new(CountingListener::default());
    let engine = Arc::new(SettlementEngine::new(repo.clone()).on_order_paid(listener.clone()));

    // Duplicates of every sequence racing at once
    let mut handles = Vec::new();
    for sequence in 0..3u32 {
        for attempt in 0..8 {
            let engine = engine.clone();
            let trade_id = format!("{}_{}", no, sequence);
            handles.push(tokio::spawn(async move {
                (
                    sequence,
                    engine
                        .settle(
                            &trade_id,
                            PaymentChannel::Alipay,
                            &format!("rcpt-{}-{}", sequence, attempt),
                            dec!(406.00),
                        )
                        .await
                        .unwrap(),
                )
            }));
        }
    }

    let mut settled_per_sequence = [0usize; 3];
    for handle in handles {
        let (sequence, result) = handle.await.unwrap();
        if result == SettlementResult::Settled {
            settled_per_sequence[sequence as usize] += 1;
        }
    }

    assert_eq!(settled_per_sequence, [1, 1, 1]);
    assert_eq!(listener.fired.load(Ordering::SeqCst), 1);

    let installment = repo.find_installment(&no).await.unwrap();
    assert_eq!(installment.status, InstallmentStatus::Finished);
    assert!(installment.is_fully_settled());
    assert!(repo.find_order(&order_id).await.unwrap().is_paid());
}
