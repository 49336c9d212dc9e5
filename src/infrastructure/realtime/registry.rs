use super::connection::{Connection, ConnectionId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Bookkeeping of which open connections belong to which user
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// Add a connection under its owning user. Returns false if it was already present.
    async fn add(&self, connection: Connection) -> bool;

    /// Remove a connection. Returns false if it was already gone.
    async fn remove(&self, connection: &Connection) -> bool;

    /// Point-in-time copy of a user's connections
    async fn connections_for(&self, user_id: &Uuid) -> Vec<Connection>;

    /// Check if a user currently has at least one connection
    async fn is_connected(&self, user_id: &Uuid) -> bool;

    /// Number of users with at least one connection
    async fn user_count(&self) -> usize;

    /// Total open connections across all users
    async fn connection_count(&self) -> usize;

    /// Remove and return every connection
    async fn drain(&self) -> Vec<Connection>;
}

/// In-memory registry guarded by a single lock.
///
/// A user key exists only while its connection set is non-empty. The lock is
/// never held across an await, so snapshots always see a whole add or remove.
pub struct InMemoryConnectionRegistry {
    connections: Arc<Mutex<HashMap<Uuid, HashMap<ConnectionId, Connection>>>>,
}

impl InMemoryConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectionRegistry for InMemoryConnectionRegistry {
    async fn add(&self, connection: Connection) -> bool {
        let mut connections = self.connections.lock().await;
        let set = connections.entry(connection.user_id()).or_default();
        if set.contains_key(&connection.id()) {
            return false;
        }
        set.insert(connection.id(), connection);
        true
    }

    async fn remove(&self, connection: &Connection) -> bool {
        let mut connections = self.connections.lock().await;
        let Some(set) = connections.get_mut(&connection.user_id()) else {
            return false;
        };
        let removed = set.remove(&connection.id()).is_some();
        if set.is_empty() {
            connections.remove(&connection.user_id());
        }
        removed
    }

    async fn connections_for(&self, user_id: &Uuid) -> Vec<Connection> {
        let connections = self.connections.lock().await;
        connections
            .get(user_id)
            .map(|set| set.values().cloned().collect())
            .unwrap_or_default()
    }

    async fn is_connected(&self, user_id: &Uuid) -> bool {
        let connections = self.connections.lock().await;
        connections.contains_key(user_id)
    }

    async fn user_count(&self) -> usize {
        self.connections.lock().await.len()
    }

    async fn connection_count(&self) -> usize {
        let connections = self.connections.lock().await;
        connections.values().map(|set| set.len()).sum()
    }

    async fn drain(&self) -> Vec<Connection> {
        let mut connections = self.connections.lock().await;
        connections
            .drain()
            .flat_map(|(_, set)| set.into_values())
            .collect()
    }
}
