//! StateManager - actor that owns the TripStore
//!
//! Processes commands via channels so every write is applied in order,
//! one at a time. Concurrent updates to the same trip are last-write-wins.

use std::path::Path;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::domain::{Filter, IndexValue, Store, Trip, User, normalize_email};

use super::messages::{StateCommand, StateError, StateResponse, TripQuery};

/// Handle to send commands to the StateManager
#[derive(Clone)]
pub struct StateManager {
    tx: mpsc::Sender<StateCommand>,
}

impl StateManager {
    /// Spawn a new StateManager actor over the store at `store_path`
    pub fn spawn(store_path: impl AsRef<Path>) -> eyre::Result<Self> {
        debug!(store_path = %store_path.as_ref().display(), "spawn: called");
        let store = Store::open(store_path.as_ref())?;
        Self::spawn_with_store(store)
    }

    /// Spawn a StateManager over a throwaway in-memory store
    pub fn spawn_in_memory() -> eyre::Result<Self> {
        debug!("spawn_in_memory: called");
        Self::spawn_with_store(Store::open_in_memory()?)
    }

    fn spawn_with_store(mut store: Store) -> eyre::Result<Self> {
        // Index layout may have changed since the records were written
        let trip_count = store.rebuild_indexes::<Trip>()?;
        let user_count = store.rebuild_indexes::<User>()?;
        info!(trip_count, user_count, "Rebuilt indexes for Trip and User records");

        let (tx, rx) = mpsc::channel(256);
        tokio::spawn(actor_loop(store, rx));

        info!("StateManager spawned");
        Ok(Self { tx })
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<StateResponse<T>>) -> StateCommand,
    ) -> StateResponse<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| StateError::ChannelError)?;
        reply_rx.await.map_err(|_| StateError::ChannelError)?
    }

    // === Trip operations ===

    /// Create a trip; returns the store-assigned id
    pub async fn create_trip(&self, trip: Trip) -> StateResponse<i64> {
        debug!(user_id = trip.user_id, destination = %trip.destination, "create_trip: called");
        self.request(|reply| StateCommand::CreateTrip { trip, reply }).await
    }

    pub async fn get_trip(&self, id: i64) -> StateResponse<Option<Trip>> {
        debug!(id, "get_trip: called");
        self.request(|reply| StateCommand::GetTrip { id, reply }).await
    }

    /// Replace a stored trip; `NotFound` if it no longer exists
    pub async fn update_trip(&self, trip: Trip) -> StateResponse<()> {
        debug!(id = trip.id, "update_trip: called");
        self.request(|reply| StateCommand::UpdateTrip { trip, reply }).await
    }

    /// Delete a trip; returns whether it existed
    pub async fn delete_trip(&self, id: i64) -> StateResponse<bool> {
        debug!(id, "delete_trip: called");
        self.request(|reply| StateCommand::DeleteTrip { id, reply }).await
    }

    /// List trips in ascending id order
    pub async fn list_trips(&self, query: TripQuery) -> StateResponse<Vec<Trip>> {
        debug!(?query, "list_trips: called");
        self.request(|reply| StateCommand::ListTrips { query, reply }).await
    }

    // === User operations ===

    /// Create a user; `Conflict` if the email is taken
    pub async fn create_user(&self, user: User) -> StateResponse<i64> {
        debug!(email = %user.email, "create_user: called");
        self.request(|reply| StateCommand::CreateUser { user, reply }).await
    }

    pub async fn get_user(&self, id: i64) -> StateResponse<Option<User>> {
        debug!(id, "get_user: called");
        self.request(|reply| StateCommand::GetUser { id, reply }).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> StateResponse<Option<User>> {
        debug!(%email, "get_user_by_email: called");
        let email = normalize_email(email);
        self.request(|reply| StateCommand::GetUserByEmail { email, reply }).await
    }

    pub async fn list_users(&self) -> StateResponse<Vec<User>> {
        debug!("list_users: called");
        self.request(|reply| StateCommand::ListUsers { reply }).await
    }

    /// Delete a user and cascade to their trips; returns the trips removed
    pub async fn delete_user(&self, id: i64) -> StateResponse<usize> {
        debug!(id, "delete_user: called");
        self.request(|reply| StateCommand::DeleteUser { id, reply }).await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> Result<(), StateError> {
        debug!("shutdown: called");
        self.tx
            .send(StateCommand::Shutdown)
            .await
            .map_err(|_| StateError::ChannelError)
    }
}

fn trip_filters(query: TripQuery) -> Vec<Filter> {
    let mut filters = Vec::new();
    if let Some(user_id) = query.user_id {
        filters.push(Filter::eq("user_id", user_id));
    }
    if let Some(status) = query.status {
        filters.push(Filter::eq("status", status.to_string()));
    }
    if let Some(destination) = query.destination {
        filters.push(Filter::eq("destination", destination));
    }
    filters
}

fn find_user_by_email(store: &Store, email: &str) -> StateResponse<Option<User>> {
    let users: Vec<User> = store.list(&[Filter::eq("email", IndexValue::String(normalize_email(email)))])?;
    Ok(users.into_iter().next())
}

fn delete_user_cascade(store: &mut Store, id: i64) -> StateResponse<usize> {
    if store.get::<User>(id)?.is_none() {
        debug!(id, "delete_user_cascade: user not found");
        return Err(StateError::NotFound(format!("users/{}", id)));
    }
    let removed = store.delete_matching::<Trip>(&[Filter::eq("user_id", id)])?;
    store.delete::<User>(id)?;
    info!(id, trips_removed = removed, "Deleted user and owned trips");
    Ok(removed)
}

/// The actor loop that processes commands
async fn actor_loop(mut store: Store, mut rx: mpsc::Receiver<StateCommand>) {
    debug!("StateManager actor started");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            StateCommand::CreateTrip { trip, reply } => {
                debug!(user_id = trip.user_id, "actor_loop: CreateTrip command");
                let result = store.create(trip).map_err(StateError::from);
                if let Ok(id) = &result {
                    info!(trip_id = id, "Created trip");
                }
                let _ = reply.send(result);
            }

            StateCommand::GetTrip { id, reply } => {
                debug!(id, "actor_loop: GetTrip command");
                let _ = reply.send(store.get::<Trip>(id).map_err(StateError::from));
            }

            StateCommand::UpdateTrip { trip, reply } => {
                debug!(id = trip.id, "actor_loop: UpdateTrip command");
                let id = trip.id;
                let result = store.update(trip).map_err(StateError::from);
                if result.is_ok() {
                    info!(trip_id = id, "Updated trip");
                }
                let _ = reply.send(result);
            }

            StateCommand::DeleteTrip { id, reply } => {
                debug!(id, "actor_loop: DeleteTrip command");
                let result = store.delete::<Trip>(id).map_err(StateError::from);
                if let Ok(true) = result {
                    info!(trip_id = id, "Deleted trip");
                }
                let _ = reply.send(result);
            }

            StateCommand::ListTrips { query, reply } => {
                debug!(?query, "actor_loop: ListTrips command");
                let filters = trip_filters(query);
                let _ = reply.send(store.list::<Trip>(&filters).map_err(StateError::from));
            }

            StateCommand::CreateUser { user, reply } => {
                debug!(email = %user.email, "actor_loop: CreateUser command");
                let result = match find_user_by_email(&store, &user.email) {
                    Ok(Some(existing)) => {
                        warn!(email = %user.email, existing_id = existing.id, "actor_loop: duplicate email");
                        Err(StateError::Conflict(format!(
                            "A user with email {} already exists (id {})",
                            user.email, existing.id
                        )))
                    }
                    Ok(None) => store.create(user).map_err(StateError::from),
                    Err(e) => Err(e),
                };
                let _ = reply.send(result);
            }

            StateCommand::GetUser { id, reply } => {
                debug!(id, "actor_loop: GetUser command");
                let _ = reply.send(store.get::<User>(id).map_err(StateError::from));
            }

            StateCommand::GetUserByEmail { email, reply } => {
                debug!(%email, "actor_loop: GetUserByEmail command");
                let _ = reply.send(find_user_by_email(&store, &email));
            }

            StateCommand::ListUsers { reply } => {
                debug!("actor_loop: ListUsers command");
                let _ = reply.send(store.list::<User>(&[]).map_err(StateError::from));
            }

            StateCommand::DeleteUser { id, reply } => {
                debug!(id, "actor_loop: DeleteUser command");
                let _ = reply.send(delete_user_cascade(&mut store, id));
            }

            StateCommand::Shutdown => {
                debug!("actor_loop: Shutdown command");
                info!("StateManager shutting down");
                break;
            }
        }
    }

    debug!("StateManager actor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TripStatus;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_state_manager_trip_crud() {
        let temp = tempdir().unwrap();
        let manager = StateManager::spawn(temp.path()).unwrap();

        let id = manager.create_trip(Trip::new(1, "Tokyo")).await.unwrap();
        assert!(id > 0);

        let mut trip = manager.get_trip(id).await.unwrap().unwrap();
        assert_eq!(trip.id, id);
        assert_eq!(trip.destination, "Tokyo");

        trip.status = TripStatus::Booked;
        manager.update_trip(trip).await.unwrap();
        let trip = manager.get_trip(id).await.unwrap().unwrap();
        assert_eq!(trip.status, TripStatus::Booked);

        assert!(manager.delete_trip(id).await.unwrap());
        assert!(!manager.delete_trip(id).await.unwrap());
        assert!(manager.get_trip(id).await.unwrap().is_none());

        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_update_missing_trip_is_not_found() {
        let manager = StateManager::spawn_in_memory().unwrap();
        let mut trip = Trip::new(1, "Oslo");
        trip.id = 999;
        let err = manager.update_trip(trip).await.unwrap_err();
        assert!(matches!(err, StateError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_trips_filters() {
        let manager = StateManager::spawn_in_memory().unwrap();
        manager.create_trip(Trip::new(1, "Tokyo")).await.unwrap();
        manager.create_trip(Trip::new(1, "Paris")).await.unwrap();
        let mut booked = Trip::new(1, "tokyo ");
        booked.status = TripStatus::Booked;
        manager.create_trip(booked).await.unwrap();
        manager.create_trip(Trip::new(2, "Tokyo")).await.unwrap();

        let all = manager.list_trips(TripQuery::default()).await.unwrap();
        assert_eq!(all.len(), 4);

        let mine = manager.list_trips(TripQuery::for_user(1)).await.unwrap();
        assert_eq!(mine.len(), 3);
        assert!(mine.windows(2).all(|w| w[0].id < w[1].id));

        let planning_tokyo = manager
            .list_trips(
                TripQuery::for_user(1)
                    .status(TripStatus::Planning)
                    .destination("  TOKYO"),
            )
            .await
            .unwrap();
        assert_eq!(planning_tokyo.len(), 1);
        assert_eq!(planning_tokyo[0].destination, "Tokyo");
    }

    #[tokio::test]
    async fn test_user_email_is_unique() {
        let manager = StateManager::spawn_in_memory().unwrap();
        let id = manager.create_user(User::new("ada@example.com", "Ada")).await.unwrap();

        let err = manager
            .create_user(User::new("ADA@example.com", "Other Ada"))
            .await
            .unwrap_err();
        assert!(matches!(err, StateError::Conflict(_)));

        let found = manager.get_user_by_email(" Ada@Example.com").await.unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(manager.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_user_cascades_to_trips() {
        let manager = StateManager::spawn_in_memory().unwrap();
        let ada = manager.create_user(User::new("ada@example.com", "Ada")).await.unwrap();
        let bob = manager.create_user(User::new("bob@example.com", "Bob")).await.unwrap();
        manager.create_trip(Trip::new(ada, "Rome")).await.unwrap();
        manager.create_trip(Trip::new(ada, "Lima")).await.unwrap();
        let bobs_trip = manager.create_trip(Trip::new(bob, "Rome")).await.unwrap();

        assert_eq!(manager.delete_user(ada).await.unwrap(), 2);
        assert!(manager.get_user(ada).await.unwrap().is_none());
        assert!(manager.list_trips(TripQuery::for_user(ada)).await.unwrap().is_empty());
        assert!(manager.get_trip(bobs_trip).await.unwrap().is_some());

        assert!(matches!(
            manager.delete_user(ada).await.unwrap_err(),
            StateError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_state_persists_across_spawns() {
        let temp = tempdir().unwrap();
        let id = {
            let manager = StateManager::spawn(temp.path()).unwrap();
            let id = manager.create_trip(Trip::new(1, "Kyoto")).await.unwrap();
            manager.shutdown().await.unwrap();
            id
        };

        let manager = StateManager::spawn(temp.path()).unwrap();
        let trip = manager.get_trip(id).await.unwrap().unwrap();
        assert_eq!(trip.destination, "Kyoto");
    }
}
