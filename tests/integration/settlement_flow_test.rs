// End-to-end settlement flow: schedule creation, idempotent settlement of
// each period, order stamping and the exactly-once OrderPaid event.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use splitpay::config::BillingConfig;
use splitpay::core::Currency;
use splitpay::installments::{InstallmentRepository, InstallmentService, InstallmentStatus};
use splitpay::modules::gateways::PaymentChannel;
use splitpay::modules::orders::Order;
use splitpay::settlements::{
    Acknowledgement, ChannelStatus, GatewayNotification, OrderPaidListener, SettlementEngine,
    SettlementResult,
};

#[derive(Default)]
struct CountingListener {
    fired: AtomicUsize,
}

impl OrderPaidListener for CountingListener {
    fn on_order_paid(&self, _order: &Order) {
        self.fired.fetch_add(1, Ordering::SeqCst);
    }
}

struct Harness {
    repo: Arc<InstallmentRepository>,
    engine: SettlementEngine,
    listener: Arc<CountingListener>,
    installment_no: String,
    order_id: String,
}

async fn harness() -> Harness {
    let repo = Arc::new(InstallmentRepository::new());
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

    let listener = Arc::new(CountingListener::default());
    let engine = SettlementEngine::new(repo.clone()).on_order_paid(listener.clone());

    Harness {
        repo,
        engine,
        listener,
        installment_no: installment.no,
        order_id,
    }
}

#[tokio::test]
async fn test_down_payment_settles_order_and_advances_status() {
    let h = harness().await;
    let trade_id = format!("{}_0", h.installment_no);

    let result = h
        .engine
        .settle(&trade_id, PaymentChannel::Alipay, "alipay-rcpt-1", dec!(406.00))
        .await
        .unwrap();
    assert_eq!(result, SettlementResult::Settled);

    let installment = h.repo.find_installment(&h.installment_no).await.unwrap();
    assert_eq!(installment.status, InstallmentStatus::Repaying);
    let item = installment.item(0).unwrap();
    assert!(item.is_settled());
    assert_eq!(item.channel, Some(PaymentChannel::Alipay));
    assert_eq!(item.receipt_id.as_deref(), Some("alipay-rcpt-1"));

    let order = h.repo.find_order(&h.order_id).await.unwrap();
    assert!(order.is_paid());
    assert_eq!(order.payment_method.as_deref(), Some("installment"));
    assert_eq!(order.payment_no.as_deref(), Some(h.installment_no.as_str()));
    assert_eq!(h.listener.fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_duplicate_notifications_are_idempotent() {
    let h = harness().await;
    let trade_id = format!("{}_0", h.installment_no);

    let first = h
        .engine
        .settle(&trade_id, PaymentChannel::Alipay, "rcpt-1", dec!(406.00))
        .await
        .unwrap();
    assert_eq!(first, SettlementResult::Settled);

    let stamped = h
        .repo
        .find_installment(&h.installment_no)
        .await
        .unwrap()
        .item(0)
        .unwrap()
        .settled_at;

    // Same receipt, different receipt, even a different channel: all
    // idempotent hits with no re-emitted side effects
    for (channel, receipt) in [
        (PaymentChannel::Alipay, "rcpt-1"),
        (PaymentChannel::Alipay, "rcpt-2"),
        (PaymentChannel::Wechat, "wx-rcpt-9"),
    ] {
        let result = h
            .engine
            .settle(&trade_id, channel, receipt, dec!(406.00))
            .await
            .unwrap();
        assert_eq!(result, SettlementResult::AlreadySettled);
    }

    let item_after = h
        .repo
        .find_installment(&h.installment_no)
        .await
        .unwrap()
        .item(0)
        .unwrap()
        .clone();
    assert_eq!(item_after.settled_at, stamped);
    assert_eq!(item_after.channel, Some(PaymentChannel::Alipay));
    assert_eq!(item_after.receipt_id.as_deref(), Some("rcpt-1"));
    assert_eq!(h.listener.fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_final_sequence_finishes_the_series() {
    let h = harness().await;

    for sequence in 0..3u32 {
        let trade_id = format!("{}_{}", h.installment_no, sequence);
        let result = h
            .engine
            .settle(&trade_id, PaymentChannel::Wechat, &format!("wx-{}", sequence), dec!(406.00))
            .await
            .unwrap();
        assert_eq!(result, SettlementResult::Settled);
    }

    let installment = h.repo.find_installment(&h.installment_no).await.unwrap();
    assert_eq!(installment.status, InstallmentStatus::Finished);
    assert!(installment.is_fully_settled());
    // Order was stamped exactly once, by sequence 0
    assert_eq!(h.listener.fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_amount_mismatch_is_audited_not_dropped() -> anyhow::Result<()> {
    let h = harness().await;
    let trade_id = format!("{}_0", h.installment_no);

    // Channel reports an amount with an accrued fine the schedule does not
    // carry; the settlement must still apply
    let result = h
        .engine
        .settle(&trade_id, PaymentChannel::Alipay, "rcpt", dec!(410.00))
        .await?;
    assert_eq!(result, SettlementResult::Settled);
    Ok(())
}

#[tokio::test]
async fn test_unresolvable_ids_return_not_found() {
    let h = harness().await;

    let unknown_series = h
        .engine
        .settle("19990101000000000000_0", PaymentChannel::Alipay, "rcpt", dec!(1))
        .await
        .unwrap();
    assert_eq!(unknown_series, SettlementResult::NotFound);

    let unknown_sequence = h
        .engine
        .settle(
            &format!("{}_9", h.installment_no),
            PaymentChannel::Alipay,
            "rcpt",
            dec!(1),
        )
        .await
        .unwrap();
    assert_eq!(unknown_sequence, SettlementResult::NotFound);
}

#[tokio::test]
async fn test_notification_shim_maps_acknowledgements() {
    let h = harness().await;

    // Non-payment status: acknowledged without effect
    let pending = GatewayNotification {
        trade_id: format!("{}_0", h.installment_no),
        channel: PaymentChannel::Alipay,
        amount: dec!(406.00),
        receipt_id: "rcpt".to_string(),
        status: ChannelStatus::from_channel_code(PaymentChannel::Alipay, "WAIT_BUYER_PAY"),
    };
    assert_eq!(
        h.engine.apply_notification(&pending).await.unwrap(),
        Acknowledgement::Success
    );
    let installment = h.repo.find_installment(&h.installment_no).await.unwrap();
    assert!(!installment.item(0).unwrap().is_settled());

    // Successful payment status settles and acks
    let paid = GatewayNotification {
        status: ChannelStatus::from_channel_code(PaymentChannel::Alipay, "TRADE_SUCCESS"),
        ..pending.clone()
    };
    assert_eq!(
        h.engine.apply_notification(&paid).await.unwrap(),
        Acknowledgement::Success
    );

    // Unresolvable id: failure ack, the gateway may retry
    let missing = GatewayNotification {
        trade_id: "19990101000000000000_0".to_string(),
        ..paid
    };
    assert_eq!(
        h.engine.apply_notification(&missing).await.unwrap(),
        Acknowledgement::Failure
    );
}
