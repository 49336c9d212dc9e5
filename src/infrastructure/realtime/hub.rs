use super::connection::Connection;
use super::registry::ConnectionRegistry;
use crate::domain::entities::NotificationEvent;
use crate::domain::errors::AuthError;
use crate::domain::ports::token_verifier::TokenVerifier;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

pub const DEFAULT_OUTBOUND_BUFFER: usize = 64;

/// Outcome of one publish call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub attempted: usize,
    pub delivered: usize,
    pub evicted: usize,
}

/// Admits push connections and fans notification events out to them.
///
/// Lifecycle of a connection attempt: the token is verified (`admit`); on
/// failure nothing is registered and the caller closes the transport. On
/// success the connection is registered and receives pushes until `remove`
/// is called, either by the socket task when the client goes away or by
/// `publish` when a send to it fails.
#[derive(Clone)]
pub struct NotificationHub {
    registry: Arc<dyn ConnectionRegistry>,
    verifier: Arc<dyn TokenVerifier>,
    outbound_buffer: usize,
}

impl NotificationHub {
    pub fn new(registry: Arc<dyn ConnectionRegistry>, verifier: Arc<dyn TokenVerifier>) -> Self {
        Self {
            registry,
            verifier,
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
        }
    }

    pub fn with_outbound_buffer(mut self, outbound_buffer: usize) -> Self {
        self.outbound_buffer = outbound_buffer.max(1);
        self
    }

    pub fn registry(&self) -> &Arc<dyn ConnectionRegistry> {
        &self.registry
    }

    /// Verify the token and register a new connection for the resolved user.
    ///
    /// Returns the connection and the queue its socket task must drain.
    pub async fn admit(
        &self,
        token: Option<&str>,
    ) -> Result<(Connection, mpsc::Receiver<NotificationEvent>), AuthError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken);

        let user_id = match token {
            Ok(token) => self.verifier.verify(token).await,
            Err(e) => Err(e),
        };

        let user_id = match user_id {
            Ok(user_id) => user_id,
            Err(e) => {
                metrics::counter!("notification_admissions_rejected_total").increment(1);
                tracing::warn!(reason = %e, "Notification connection rejected");
                return Err(e);
            }
        };

        let (connection, outbound) = Connection::channel(user_id, self.outbound_buffer);
        if self.registry.add(connection.clone()).await {
            metrics::gauge!("notification_connections_open").increment(1.0);
        }

        tracing::info!(
            user_id = %user_id,
            connection_id = %connection.id(),
            "Notification connection opened"
        );

        Ok((connection, outbound))
    }

    /// Unregister and close a connection. Safe to call more than once.
    pub async fn remove(&self, connection: &Connection) -> bool {
        let removed = self.registry.remove(connection).await;
        if removed {
            metrics::gauge!("notification_connections_open").decrement(1.0);
            tracing::info!(
                user_id = %connection.user_id(),
                connection_id = %connection.id(),
                "Notification connection closed"
            );
        }
        connection.close();
        removed
    }

    /// Push an event to every open connection of a user.
    ///
    /// Best effort: failures are isolated per connection, failed connections
    /// are evicted after the fan-out pass, and nothing is returned as an error.
    pub async fn publish(&self, user_id: &Uuid, event: &NotificationEvent) -> DeliveryReport {
        metrics::counter!("notifications_published_total").increment(1);

        let snapshot = self.registry.connections_for(user_id).await;
        if snapshot.is_empty() {
            tracing::debug!(user_id = %user_id, "No open connections, skipping live push");
            return DeliveryReport::default();
        }

        let mut report = DeliveryReport {
            attempted: snapshot.len(),
            ..DeliveryReport::default()
        };
        let mut failed = Vec::new();

        for connection in &snapshot {
            match connection.send(event) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::debug!(
                        user_id = %user_id,
                        connection_id = %connection.id(),
                        error = %e,
                        "Live push failed"
                    );
                    failed.push(connection);
                }
            }
        }

        for connection in failed {
            self.remove(connection).await;
            report.evicted += 1;
        }

        metrics::counter!("notification_deliveries_total").increment(report.delivered as u64);
        if report.evicted > 0 {
            metrics::counter!("notification_delivery_failures_total")
                .increment(report.evicted as u64);
        }
        if report.delivered == 0 {
            tracing::debug!(
                user_id = %user_id,
                attempted = report.attempted,
                "Live push reached no connection"
            );
        }

        report
    }

    /// Close every open connection, used on process shutdown
    pub async fn shutdown(&self) {
        let connections = self.registry.drain().await;
        let count = connections.len();
        for connection in connections {
            connection.close();
        }
        metrics::gauge!("notification_connections_open").set(0.0);
        tracing::info!(connections = count, "Notification hub shut down");
    }
}
