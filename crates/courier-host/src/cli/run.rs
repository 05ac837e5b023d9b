//! Order worker loop.
//!
//! Every tick the worker places an order through the mediator, broadcasts
//! `OrderPlaced`, and keeps the publish handle. On shutdown (Ctrl-C or the
//! iteration limit) it joins every in-flight notification and reports how
//! far each order got.

use std::time::Duration;

use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::services::orders::{GetOrderStatus, OrderPlaced, PlaceOrder};
use crate::state::AppState;

/// Every n-th order is a bulk order shipping will refuse.
const BULK_EVERY: u64 = 5;
const BULK_QUANTITY: u32 = 250;

/// Totals reported when the worker stops.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerSummary {
    pub placed: u64,
    pub rejected: u64,
    pub notifications_delivered: usize,
    pub notifications_failed: usize,
    pub invoiced: u64,
    pub shipped: u64,
}

fn sample_order(iteration: u64) -> PlaceOrder {
    let quantity = if iteration % BULK_EVERY == 0 {
        BULK_QUANTITY
    } else {
        (iteration % 3) as u32 + 1
    };
    PlaceOrder {
        customer: format!("customer-{iteration}"),
        sku: "widget".to_string(),
        quantity,
    }
}

/// Run the worker until `cancel` fires or `iterations` orders were attempted.
pub async fn run_worker(
    state: &AppState,
    iterations: Option<u64>,
    interval: Duration,
    cancel: CancellationToken,
) -> anyhow::Result<WorkerSummary> {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut summary = WorkerSummary::default();
    let mut pending = Vec::new();
    let mut order_ids: Vec<Uuid> = Vec::new();
    let mut iteration = 0u64;

    loop {
        if iterations.is_some_and(|max| iteration >= max) {
            break;
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("shutdown requested");
                break;
            }
            _ = ticker.tick() => {}
        }
        iteration += 1;

        let order = sample_order(iteration);
        let (customer, quantity) = (order.customer.clone(), order.quantity);
        let confirmation = match state
            .mediator
            .send_with_response(order, Some(cancel.child_token()))
            .await
        {
            Ok(Some(confirmation)) => confirmation,
            Ok(None) => {
                warn!("no handler registered for PlaceOrder");
                summary.rejected += 1;
                continue;
            }
            Err(err) => {
                warn!(error = %err, %customer, "order rejected");
                summary.rejected += 1;
                continue;
            }
        };
        summary.placed += 1;
        order_ids.push(confirmation.order_id);

        let placed = OrderPlaced {
            order_id: confirmation.order_id,
            customer,
            quantity,
            total_cents: confirmation.total_cents,
        };
        pending.push(
            state
                .mediator
                .publish(placed, Some(cancel.child_token()))
                .await,
        );
    }

    info!(in_flight = pending.len(), "draining notifications");
    for handle in pending {
        let report = handle.join().await;
        summary.notifications_delivered += report.delivered;
        summary.notifications_failed += report.failed + report.panicked;
    }

    for order_id in order_ids {
        let status = state
            .mediator
            .send_with_response(GetOrderStatus { order_id }, None)
            .await?
            .flatten();
        if let Some(status) = status {
            summary.invoiced += u64::from(status.invoiced);
            summary.shipped += u64::from(status.shipped);
        }
    }

    if state.book.is_empty() {
        warn!("worker stopped before any order was placed");
    }
    info!(orders = state.book.len(), placed = summary.placed, "worker stopped");
    Ok(summary)
}

/// Print the summary as text or JSON.
pub fn print_summary(summary: &WorkerSummary, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!();
    println!("  {}", style("Worker Summary").bold());
    println!();
    println!("{}", summary_table(summary));
    if summary.notifications_failed > 0 {
        println!(
            "  {}",
            style("Failed notifications are logged at error level.").dim()
        );
    }
    println!();
    Ok(())
}

fn summary_table(summary: &WorkerSummary) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Metric").fg(Color::White),
        Cell::new("Count").fg(Color::White),
    ]);

    let failed_color = if summary.notifications_failed == 0 {
        Color::Green
    } else {
        Color::Red
    };
    let rows = [
        ("Orders placed", summary.placed, Color::Cyan),
        ("Orders rejected", summary.rejected, Color::DarkGrey),
        ("Invoiced", summary.invoiced, Color::White),
        ("Shipped", summary.shipped, Color::White),
        (
            "Notifications delivered",
            summary.notifications_delivered as u64,
            Color::Green,
        ),
        (
            "Notifications failed",
            summary.notifications_failed as u64,
            failed_color,
        ),
    ];
    for (label, count, color) in rows {
        table.add_row(vec![
            Cell::new(label).fg(Color::White),
            Cell::new(count).fg(color),
        ]);
    }
    table
}
