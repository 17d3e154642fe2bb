use std::collections::HashMap;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use stockflow_events::InMemoryEventBus;
use stockflow_infra::export::transactions_csv;
use stockflow_infra::services::{InventoryService, PurchasingService};
use stockflow_infra::{Clock, EventPublisher, SystemClock};
use stockflow_inventory::{NewItem, TransactionDraft, TransactionFilter, TransactionKind};
use stockflow_purchasing::{NewLine, NewPurchaseOrder, PurchaseOrderStatus};

fn new_item(sku: &str, quantity: i64) -> NewItem {
    NewItem {
        sku: sku.to_string(),
        name: format!("Bench {sku}"),
        description: None,
        category: "Bench".to_string(),
        unit: "each".to_string(),
        barcode: None,
        quantity,
        min_stock: 0,
        max_stock: 1_000,
        location: "Main".to_string(),
        unit_cost: 100,
        retail_price: 150,
        supplier: None,
    }
}

fn inventory() -> Arc<InventoryService> {
    let publisher = EventPublisher::new(Arc::new(InMemoryEventBus::new()));
    Arc::new(InventoryService::in_memory(publisher, Arc::new(SystemClock)))
}

fn bench_record_transaction(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_transaction");

    group.bench_function("stock_in", |b| {
        let svc = inventory();
        let item = svc.create_item(new_item("BENCH-1", 0)).unwrap();
        b.iter(|| {
            svc.record_transaction(
                item.id_typed(),
                TransactionDraft::new(TransactionKind::StockIn, black_box(1), "bench"),
            )
            .unwrap()
        });
    });

    group.bench_function("rejected_stock_out", |b| {
        let svc = inventory();
        let item = svc.create_item(new_item("BENCH-2", 0)).unwrap();
        b.iter(|| {
            let res = svc.record_transaction(
                item.id_typed(),
                TransactionDraft::new(TransactionKind::StockOut, black_box(1), "bench"),
            );
            black_box(res.is_err())
        });
    });

    group.finish();
}

fn bench_ledger_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger_query");

    for size in [100usize, 1_000, 10_000] {
        let svc = inventory();
        let item = svc.create_item(new_item("BENCH-Q", 0)).unwrap();
        for _ in 0..size {
            svc.record_transaction(
                item.id_typed(),
                TransactionDraft::new(TransactionKind::StockIn, 1, "bench"),
            )
            .unwrap();
        }

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("by_kind", size), &size, |b, _| {
            let filter = TransactionFilter {
                kind: Some(TransactionKind::StockIn),
                ..TransactionFilter::default()
            };
            b.iter(|| black_box(svc.transactions(&filter).unwrap().len()));
        });
        group.bench_with_input(BenchmarkId::new("csv_export", size), &size, |b, _| {
            let all = svc.transactions(&TransactionFilter::default()).unwrap();
            b.iter(|| black_box(transactions_csv(&all).unwrap().len()));
        });
    }

    group.finish();
}

fn bench_receive(c: &mut Criterion) {
    let mut group = c.benchmark_group("purchase_order_receive");

    for lines in [1usize, 10, 50] {
        group.throughput(Throughput::Elements(lines as u64));
        group.bench_with_input(BenchmarkId::new("full_receipt", lines), &lines, |b, &lines| {
            let publisher = EventPublisher::new(Arc::new(InMemoryEventBus::new()));
            let clock: Arc<dyn Clock> = Arc::new(SystemClock);
            let inv = Arc::new(InventoryService::in_memory(publisher.clone(), clock.clone()));
            for n in 0..lines {
                inv.create_item(new_item(&format!("RCV-{n}"), 0)).unwrap();
            }
            let purchasing = PurchasingService::in_memory(inv, "USD", publisher, clock.clone());
            let today = clock.today();

            b.iter(|| {
                let po = purchasing
                    .create(NewPurchaseOrder {
                        supplier: "Bench Supply".to_string(),
                        order_date: Some(today),
                        expected_date: today,
                        currency: None,
                        lines: (0..lines)
                            .map(|n| NewLine {
                                item_name: format!("Bench RCV-{n}"),
                                sku: format!("RCV-{n}"),
                                quantity: 10,
                                unit_price: 100,
                            })
                            .collect(),
                    })
                    .unwrap();
                let po = purchasing
                    .transition(po.id_typed(), PurchaseOrderStatus::Sent)
                    .unwrap();
                let request: HashMap<_, _> =
                    po.lines().iter().map(|l| (l.id_typed(), 10)).collect();
                black_box(purchasing.receive(po.id_typed(), &request, "bench").unwrap())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_record_transaction, bench_ledger_query, bench_receive);
criterion_main!(benches);
