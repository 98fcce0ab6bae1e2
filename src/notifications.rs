//! Incoming-payment notifications.
//!
//! A background task long-polls `waitanyinvoice` on its own RPC
//! connection and broadcasts paid-invoice events. It is fully
//! independent of the aggregation engines' synchronous call path.

use crate::rpc::RpcClient;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// An invoice that was just paid.
#[derive(Debug, Clone)]
pub struct PaidInvoice {
    /// Local invoice label.
    pub label: String,
    /// Payment hash, matched by the receive page.
    pub payment_hash: String,
    /// Amount received in millisatoshi.
    pub amount_msat: u64,
    /// Monotonic settlement index.
    pub pay_index: u64,
}

/// Background `waitanyinvoice` listener.
pub struct InvoiceListener {
    client: Arc<RpcClient>,
    broadcast_tx: broadcast::Sender<PaidInvoice>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl InvoiceListener {
    /// Create a listener. `client` should be a dedicated connection: the
    /// long-poll holds it for as long as no invoice gets paid.
    pub fn new(client: Arc<RpcClient>) -> Self {
        let (broadcast_tx, _) = broadcast::channel(32);
        Self {
            client,
            broadcast_tx,
            task: None,
        }
    }

    /// Subscribe to paid-invoice events.
    pub fn subscribe(&self) -> broadcast::Receiver<PaidInvoice> {
        self.broadcast_tx.subscribe()
    }

    /// Spawn the polling task. Idempotent.
    pub fn start(&mut self) {
        if self.task.is_some() {
            return;
        }
        info!("Starting invoice listener");

        let client = self.client.clone();
        let broadcast_tx = self.broadcast_tx.clone();
        self.task = Some(tokio::spawn(async move {
            // Start at the tail so already-settled invoices are not
            // replayed as fresh events.
            let mut last_pay_index = match client.list_invoices().await {
                Ok(listing) => listing
                    .invoices
                    .iter()
                    .map(|invoice| invoice.pay_index)
                    .max()
                    .unwrap_or(0),
                Err(e) => {
                    warn!("listinvoices failed: {}; starting at index 0", e);
                    0
                }
            };

            loop {
                match client.wait_any_invoice(last_pay_index).await {
                    Ok(invoice) => {
                        debug!(
                            "Invoice paid: {} (pay_index {})",
                            invoice.label, invoice.pay_index
                        );
                        last_pay_index = last_pay_index.max(invoice.pay_index);
                        let _ = broadcast_tx.send(PaidInvoice {
                            label: invoice.label,
                            payment_hash: invoice.payment_hash,
                            amount_msat: invoice.msatoshi_received,
                            pay_index: invoice.pay_index,
                        });
                    }
                    Err(e) => {
                        warn!("waitanyinvoice failed: {}; retrying", e);
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        }));
    }

    /// Stop the polling task.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            info!("Stopping invoice listener");
            task.abort();
        }
    }
}
