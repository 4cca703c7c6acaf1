//! Actor-based concurrency for the points store
//!
//! One tokio task owns the [`PointsStore`] and handles messages one at a time.
//! A spend's read -> plan -> commit therefore runs with no other write in
//! between: two concurrent spends can never both see the same balance.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                 HTTP handlers (axum)                  │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │               PointsHandle (Clone)                    │
//! │         Sends messages to actor mailbox              │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              PointsActor (Single Task)                │
//! │     owns PointsStore: registry + ledger + index      │
//! └───────────────────────────────────────────────────────┘
//! ```

use crate::metrics::Metrics;
use crate::store::PointsStore;
use crate::types::{Payer, PayerBalance, PayerId, SpendPlan};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};

/// Message sent to the points actor
pub enum PointsMessage {
    /// Register a payer
    RegisterPayer {
        id: PayerId,
        name: String,
        response: oneshot::Sender<Result<Payer>>,
    },

    /// Record a purchase
    RecordPurchase {
        payer_id: PayerId,
        points: i64,
        timestamp: DateTime<Utc>,
        response: oneshot::Sender<Result<PayerBalance>>,
    },

    /// Spend points
    Spend {
        points: i64,
        response: oneshot::Sender<Result<SpendPlan>>,
    },

    /// Get one payer's balance
    GetBalance {
        payer_id: PayerId,
        response: oneshot::Sender<Result<PayerBalance>>,
    },

    /// Get every payer's balance
    GetAllBalances {
        response: oneshot::Sender<BTreeMap<PayerId, i64>>,
    },

    /// Get every payer's balance with payer details
    PayerBalances {
        response: oneshot::Sender<Vec<PayerBalance>>,
    },

    /// Search payers by name prefix
    SearchPayers {
        query: String,
        response: oneshot::Sender<Vec<Payer>>,
    },

    /// Check the balance index against the ledger
    Verify {
        response: oneshot::Sender<Result<()>>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that processes points messages
pub struct PointsActor {
    /// The store; only this task touches it
    store: PointsStore,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<PointsMessage>,

    /// Metrics
    metrics: Metrics,
}

impl PointsActor {
    /// Create new actor
    pub fn new(
        store: PointsStore,
        mailbox: mpsc::Receiver<PointsMessage>,
        metrics: Metrics,
    ) -> Self {
        Self {
            store,
            mailbox,
            metrics,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            if let PointsMessage::Shutdown = msg {
                tracing::info!("Points actor shutting down");
                break;
            }
            self.handle_message(msg);
        }
    }

    /// Handle a single message
    fn handle_message(&mut self, msg: PointsMessage) {
        match msg {
            PointsMessage::RegisterPayer { id, name, response } => {
                let result = self.store.register_payer(id, name);
                match &result {
                    Ok(payer) => tracing::info!(payer = %payer.id, "Registered payer"),
                    Err(e) => self.rejected("register_payer", e),
                }
                let _ = response.send(result);
            }

            PointsMessage::RecordPurchase {
                payer_id,
                points,
                timestamp,
                response,
            } => {
                let result = self.store.record_purchase(&payer_id, points, timestamp);
                match &result {
                    Ok(balance) => {
                        self.metrics.record_purchase();
                        tracing::debug!(
                            payer = %payer_id,
                            points,
                            balance = balance.points,
                            "Recorded purchase"
                        );
                    }
                    Err(e) => self.rejected("record_purchase", e),
                }
                let _ = response.send(result);
            }

            PointsMessage::Spend { points, response } => {
                let started = Instant::now();
                let result = self.store.spend(points);
                match &result {
                    Ok(plan) => {
                        self.metrics.record_spend(
                            plan.allocated,
                            plan.unfulfilled,
                            started.elapsed().as_secs_f64(),
                        );
                        tracing::info!(
                            requested = plan.requested,
                            allocated = plan.allocated,
                            unfulfilled = plan.unfulfilled,
                            payers = plan.allocations.len(),
                            "Committed spend"
                        );
                        if !plan.is_fulfilled() {
                            tracing::warn!(
                                unfulfilled = plan.unfulfilled,
                                "Spend exceeded available points"
                            );
                        }
                    }
                    Err(e) => self.rejected("spend", e),
                }
                let _ = response.send(result);
            }

            PointsMessage::GetBalance { payer_id, response } => {
                let _ = response.send(self.store.get_balance(&payer_id));
            }

            PointsMessage::GetAllBalances { response } => {
                let _ = response.send(self.store.get_all_balances());
            }

            PointsMessage::PayerBalances { response } => {
                let _ = response.send(self.store.payer_balances());
            }

            PointsMessage::SearchPayers { query, response } => {
                let _ = response.send(self.store.search_payers(&query));
            }

            PointsMessage::Verify { response } => {
                let result = self.store.verify();
                if let Err(e) = &result {
                    tracing::error!("Balance verification failed: {}", e);
                }
                let _ = response.send(result);
            }

            PointsMessage::Shutdown => {
                // Handled in run loop
            }
        }
    }

    fn rejected(&self, operation: &'static str, error: &Error) {
        self.metrics.record_rejected();
        tracing::warn!(operation, "Request rejected: {}", error);
    }
}

/// Handle for sending messages to the actor
#[derive(Clone)]
pub struct PointsHandle {
    sender: mpsc::Sender<PointsMessage>,
    metrics: Metrics,
}

impl PointsHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<PointsMessage>, metrics: Metrics) -> Self {
        Self { sender, metrics }
    }

    /// Register a payer
    pub async fn register_payer(&self, id: PayerId, name: impl Into<String>) -> Result<Payer> {
        let name = name.into();
        self.call(|response| PointsMessage::RegisterPayer { id, name, response })
            .await?
    }

    /// Record a purchase
    pub async fn record_purchase(
        &self,
        payer_id: PayerId,
        points: i64,
        timestamp: DateTime<Utc>,
    ) -> Result<PayerBalance> {
        self.call(|response| PointsMessage::RecordPurchase {
            payer_id,
            points,
            timestamp,
            response,
        })
        .await?
    }

    /// Spend points
    pub async fn spend(&self, points: i64) -> Result<SpendPlan> {
        self.call(|response| PointsMessage::Spend { points, response })
            .await?
    }

    /// Get one payer's balance
    pub async fn get_balance(&self, payer_id: PayerId) -> Result<PayerBalance> {
        self.call(|response| PointsMessage::GetBalance { payer_id, response })
            .await?
    }

    /// Get every payer's balance
    pub async fn get_all_balances(&self) -> Result<BTreeMap<PayerId, i64>> {
        self.call(|response| PointsMessage::GetAllBalances { response })
            .await
    }

    /// Get every payer's balance with payer details
    pub async fn payer_balances(&self) -> Result<Vec<PayerBalance>> {
        self.call(|response| PointsMessage::PayerBalances { response })
            .await
    }

    /// Search payers by name prefix
    pub async fn search_payers(&self, query: impl Into<String>) -> Result<Vec<Payer>> {
        let query = query.into();
        self.call(|response| PointsMessage::SearchPayers { query, response })
            .await
    }

    /// Check the balance index against the ledger
    pub async fn verify(&self) -> Result<()> {
        self.call(|response| PointsMessage::Verify { response })
            .await?
    }

    /// Metrics recorded by the actor
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(PointsMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }

    async fn call<T>(
        &self,
        message: impl FnOnce(oneshot::Sender<T>) -> PointsMessage,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(message(tx))
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }
}

/// Spawn the points actor
pub fn spawn_points_actor(
    store: PointsStore,
    metrics: Metrics,
    mailbox_capacity: usize,
) -> PointsHandle {
    let (tx, rx) = mpsc::channel(mailbox_capacity); // Bounded channel for backpressure
    let actor = PointsActor::new(store, rx, metrics.clone());

    tokio::spawn(async move {
        actor.run().await;
    });

    PointsHandle::new(tx, metrics)
}
