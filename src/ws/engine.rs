use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio::sync::OwnedMutexGuard;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::connctx::{ConnCtx, ConnectionState, JoinedRoom};
use super::roomdir::RoomDirectory;
use super::roomhub::{RoomHub, RoomState};
use crate::db::{retry_read, Persistence};
use crate::models::{
    MemberInfo, NearbyPin, NewPin, OptimalLocation, Pin, Reply, Room, RoomCreateRequest,
    RoomEvent, RoomView, ServerMessage, SyncError, User, UserCreateRequest,
};
use crate::services::geometry;
use crate::store::membership::{Audience, Member};
use crate::store::pin_table::PinTable;
use crate::store::voters::VoteAction;

/// Counters for the diagnostics endpoint
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EngineStats {
    pub connections: usize,
    pub joined_connections: usize,
    pub rooms: usize,
    pub members: usize,
    pub pins: usize,
    pub cached_rooms: u64,
}

/// The single authority over room membership and pins.
///
/// Each room is a [`RoomHub`] with its own lock. Every mutation runs under
/// that lock in three steps: write through to persistence, commit to the
/// in-memory state, queue the resulting event for the room members. Events
/// of one room therefore reach every member in the order they were applied,
/// and a failed write leaves nothing behind.
pub struct SyncEngine {
    persistence: Arc<dyn Persistence>,
    directory: RoomDirectory,
    hubs: DashMap<String, Arc<RoomHub>>,
    connections: DashMap<String, ConnCtx>,
    // pin id -> room id, for pins of loaded rooms
    pin_rooms: DashMap<String, String>,
}

impl SyncEngine {
    pub fn new(persistence: Arc<dyn Persistence>, room_cache_ttl: Duration, room_cache_capacity: u64) -> Self {
        Self {
            directory: RoomDirectory::new(persistence.clone(), room_cache_ttl, room_cache_capacity),
            persistence,
            hubs: DashMap::new(),
            connections: DashMap::new(),
            pin_rooms: DashMap::new(),
        }
    }

    // ---------------------------------------------------------------------
    // Rooms
    // ---------------------------------------------------------------------

    pub async fn create_room(&self, request: &RoomCreateRequest) -> Result<Room, SyncError> {
        let room = Room::new(request)?;
        if let Err(e) = self.persistence.insert_room(&room).await {
            error!("Failed to store room '{}': {}", room.name, e);
            return Err(e.into());
        }
        self.directory.remember(&room).await;
        info!("Room '{}' created by {} ({})", room.name, room.created_by, room.id);
        Ok(room)
    }

    pub async fn list_rooms(&self) -> Result<Vec<Room>, SyncError> {
        let persistence = &self.persistence;
        Ok(retry_read("list_rooms", || persistence.list_rooms()).await?)
    }

    pub async fn get_room(&self, room_id: &str) -> Result<RoomView, SyncError> {
        let room = self
            .directory
            .lookup(room_id)
            .await?
            .ok_or_else(|| SyncError::NotFound(format!("Room '{}'", room_id)))?;
        let members = self.members(room_id).await;
        Ok(RoomView { room, members })
    }

    /// Point-in-time membership of a room. Unknown or idle rooms have none.
    pub async fn members(&self, room_id: &str) -> Vec<MemberInfo> {
        let hub = self.hubs.get(room_id).map(|h| Arc::clone(h.value()));
        match hub {
            Some(hub) => hub.state.lock().await.members.snapshot(),
            None => Vec::new(),
        }
    }

    async fn hub(&self, room_id: &str) -> Result<Arc<RoomHub>, SyncError> {
        let existing = self.hubs.get(room_id).map(|h| Arc::clone(h.value()));
        if let Some(hub) = existing {
            return Ok(hub);
        }

        let room = self
            .directory
            .lookup(room_id)
            .await?
            .ok_or_else(|| SyncError::NotFound(format!("Room '{}'", room_id)))?;
        let hub = self
            .hubs
            .entry(room_id.to_string())
            .or_insert_with(|| Arc::new(RoomHub::new(room)))
            .value()
            .clone();
        Ok(hub)
    }

    /// Lock a room, loading its pins from persistence on first use. A hub
    /// retired by the idle sweep is passed over for its replacement.
    async fn lock_room(&self, room_id: &str) -> Result<OwnedMutexGuard<RoomState>, SyncError> {
        loop {
            let hub = self.hub(room_id).await?;
            let mut state = Arc::clone(&hub.state).lock_owned().await;
            if state.retired {
                continue;
            }
            if !state.loaded {
                let persistence = &self.persistence;
                let room_id = hub.room.id.as_str();
                let pins = retry_read("find_pins_in_room", || persistence.find_pins_in_room(room_id)).await?;
                for pin in &pins {
                    self.pin_rooms.insert(pin.id.clone(), pin.room_id.clone());
                }
                debug!("Loaded {} pins for room {}", pins.len(), room_id);
                state.pins = PinTable::from_pins(pins);
                state.loaded = true;
            }
            state.last_active = Instant::now();
            return Ok(state);
        }
    }

    async fn room_of_pin(&self, pin_id: &str) -> Result<String, SyncError> {
        let cached = self.pin_rooms.get(pin_id).map(|r| r.value().clone());
        if let Some(room_id) = cached {
            return Ok(room_id);
        }
        let persistence = &self.persistence;
        retry_read("find_pin_room", || persistence.find_pin_room(pin_id))
            .await?
            .ok_or_else(|| SyncError::NotFound(format!("Pin '{}'", pin_id)))
    }

    // ---------------------------------------------------------------------
    // Users
    // ---------------------------------------------------------------------

    pub async fn create_user(&self, request: &UserCreateRequest) -> Result<User, SyncError> {
        let user = User::new(request)?;
        if let Err(e) = self.persistence.insert_user(&user).await {
            error!("Failed to store user '{}': {}", user.name, e);
            return Err(e.into());
        }
        info!("User '{}' registered ({})", user.name, user.id);
        Ok(user)
    }

    /// Stored profile plus the room the user is connected to right now.
    pub async fn get_user(&self, user_id: &str) -> Result<User, SyncError> {
        let persistence = &self.persistence;
        let mut user = retry_read("find_user", || persistence.find_user(user_id))
            .await?
            .ok_or_else(|| SyncError::NotFound(format!("User '{}'", user_id)))?;
        user.current_room = self
            .connections
            .iter()
            .find_map(|c| c.joined().filter(|j| j.user_id == user_id).map(|j| j.room_id.clone()));
        Ok(user)
    }

    // ---------------------------------------------------------------------
    // Connections and membership
    // ---------------------------------------------------------------------

    /// Track a new transport connection. Everything addressed to it arrives
    /// on the returned queue in emission order.
    pub fn connect(&self, connection_id: &str) -> UnboundedReceiver<ServerMessage> {
        let (tx, rx) = unbounded_channel();
        self.connections.insert(connection_id.to_string(), ConnCtx::new(tx));
        debug!("Connection {} registered", connection_id);
        rx
    }

    pub fn connection_state(&self, connection_id: &str) -> Option<ConnectionState> {
        self.connections.get(connection_id).map(|c| c.state.clone())
    }

    /// Queue a direct reply to one connection.
    pub fn reply(&self, connection_id: &str, reply: Reply) {
        let outbox = self.connections.get(connection_id).map(|c| c.outbox.clone());
        match outbox {
            Some(outbox) => {
                if outbox.send(reply.into()).is_err() {
                    debug!("Connection {} is closing, dropped reply", connection_id);
                }
            }
            None => debug!("Reply for unknown connection {}", connection_id),
        }
    }

    fn set_state(&self, connection_id: &str, state: ConnectionState) {
        if let Some(mut ctx) = self.connections.get_mut(connection_id) {
            ctx.state = state;
        }
    }

    fn joined_room(&self, connection_id: &str) -> Result<JoinedRoom, SyncError> {
        self.connections
            .get(connection_id)
            .and_then(|c| c.joined().cloned())
            .ok_or(SyncError::NotInRoom)
    }

    /// Join `room_id`, replacing any earlier entry of this connection.
    ///
    /// A connection sits in at most one room, so joining a different room
    /// leaves the current one first. The other members get a presence event;
    /// the joining connection gets an ack followed by the full pin list.
    /// Returns the member count after the join.
    pub async fn join(
        &self,
        connection_id: &str,
        room_id: &str,
        display_name: &str,
        user_id: &str,
    ) -> Result<usize, SyncError> {
        let (outbox, previous) = match self.connections.get(connection_id) {
            Some(ctx) => (ctx.outbox.clone(), ctx.joined().map(|j| j.room_id.clone())),
            None => return Err(SyncError::NotFound(format!("Connection '{}'", connection_id))),
        };

        match self.hub(room_id).await {
            Ok(_) => {}
            Err(SyncError::NotFound(_)) => return Err(SyncError::InvalidRoom(room_id.to_string())),
            Err(e) => return Err(e),
        }

        if let Some(previous) = previous.filter(|p| p != room_id) {
            match self.leave(connection_id, &previous).await {
                Ok(()) | Err(SyncError::NotMember(_)) => {}
                Err(e) => return Err(e),
            }
        }

        let joined = JoinedRoom {
            room_id: room_id.to_string(),
            display_name: display_name.to_string(),
            user_id: user_id.to_string(),
        };
        // Recorded before the membership entry, so a disconnect from here on
        // takes the room lock to clean up after this join.
        self.set_state(connection_id, ConnectionState::JoinedRoom(joined));

        let mut state = match self.lock_room(room_id).await {
            Ok(state) => state,
            Err(e) => {
                self.set_state(connection_id, ConnectionState::Connected);
                return Err(e);
            }
        };
        // a disconnect that finished while we waited must not leave an entry
        if !self.connections.contains_key(connection_id) {
            debug!("Connection {} went away while joining room {}", connection_id, room_id);
            return Err(SyncError::NotFound(format!("Connection '{}'", connection_id)));
        }

        let rejoined = state.members.join(
            connection_id,
            Member {
                display_name: display_name.to_string(),
                user_id: user_id.to_string(),
                outbox,
            },
        );
        let member_count = state.members.len();

        state.members.deliver(
            Audience::AllExcept(connection_id),
            &RoomEvent::PresenceJoined {
                room_id: room_id.to_string(),
                connection_id: connection_id.to_string(),
                display_name: display_name.to_string(),
                message: format!("{} joined the room", display_name),
            }
            .into(),
        );
        state.members.deliver(
            Audience::Only(connection_id),
            &Reply::Joined {
                room_id: room_id.to_string(),
                connection_id: connection_id.to_string(),
                member_count,
            }
            .into(),
        );
        state.members.deliver(
            Audience::Only(connection_id),
            &RoomEvent::PinsSnapshot {
                room_id: room_id.to_string(),
                pins: state.pins.list(),
            }
            .into(),
        );
        drop(state);

        if rejoined {
            info!("{} ({}) re-joined room {}", display_name, connection_id, room_id);
        } else {
            info!("{} ({}) joined room {} ({} members)", display_name, connection_id, room_id, member_count);
        }
        Ok(member_count)
    }

    /// Remove the membership entry and tell the remaining members.
    pub async fn leave(&self, connection_id: &str, room_id: &str) -> Result<(), SyncError> {
        let hub = self
            .hubs
            .get(room_id)
            .map(|h| Arc::clone(h.value()))
            .ok_or_else(|| SyncError::NotMember(room_id.to_string()))?;

        let mut state = hub.state.lock().await;
        let member = state
            .members
            .leave(connection_id)
            .ok_or_else(|| SyncError::NotMember(room_id.to_string()))?;
        state.members.deliver(
            Audience::All,
            &RoomEvent::PresenceLeft {
                room_id: room_id.to_string(),
                connection_id: connection_id.to_string(),
                display_name: member.display_name.clone(),
                message: format!("{} left the room", member.display_name),
            }
            .into(),
        );
        let remaining = state.members.len();
        drop(state);

        if let Some(mut ctx) = self.connections.get_mut(connection_id) {
            if ctx.joined().map(|j| j.room_id == room_id).unwrap_or(false) {
                ctx.state = ConnectionState::Connected;
            }
        }
        info!("{} ({}) left room {} ({} members)", member.display_name, connection_id, room_id, remaining);
        Ok(())
    }

    /// Forget a connection that went away, leaving its room if it had one.
    pub async fn disconnect(&self, connection_id: &str) {
        let Some((_, ctx)) = self.connections.remove(connection_id) else {
            return;
        };
        if let Some(joined) = ctx.joined() {
            match self.leave(connection_id, &joined.room_id).await {
                Ok(()) | Err(SyncError::NotMember(_)) => {}
                Err(e) => warn!("Cleanup of connection {} failed: {}", connection_id, e),
            }
        }
        info!("Connection {} disconnected", connection_id);
    }

    // ---------------------------------------------------------------------
    // Pins
    // ---------------------------------------------------------------------

    pub async fn add_pin(&self, room_id: &str, new_pin: NewPin) -> Result<Pin, SyncError> {
        let mut state = self.lock_room(room_id).await?;

        let pin = Pin::new(room_id, new_pin);
        if let Err(e) = self.persistence.insert_pin(&pin).await {
            error!("Failed to store pin '{}' in room {}: {}", pin.title, room_id, e);
            return Err(e.into());
        }
        state.pins.insert(pin.clone());
        self.pin_rooms.insert(pin.id.clone(), room_id.to_string());

        let delivered = state.members.deliver(
            Audience::All,
            &RoomEvent::PinAdded {
                room_id: room_id.to_string(),
                pin: pin.clone(),
            }
            .into(),
        );
        info!("Pin '{}' ({}) added to room {}, sent to {} members", pin.title, pin.id, room_id, delivered);
        Ok(pin)
    }

    /// Toggle `user_id`'s vote on a pin.
    pub async fn vote(&self, pin_id: &str, user_id: &str) -> Result<(Pin, VoteAction), SyncError> {
        if user_id.trim().is_empty() {
            return Err(SyncError::Validation("Voter identity cannot be empty".to_string()));
        }
        let room_id = self.room_of_pin(pin_id).await?;
        let mut state = self.lock_room(&room_id).await?;

        // the pin may have been removed while we waited for the lock
        let mut updated = state
            .pins
            .get(pin_id)
            .cloned()
            .ok_or_else(|| SyncError::NotFound(format!("Pin '{}'", pin_id)))?;
        let action = updated.toggle_vote(user_id);
        if let Err(e) = self.persistence.update_pin_votes(&updated).await {
            error!("Failed to store vote on pin {}: {}", pin_id, e);
            return Err(e.into());
        }
        state.pins.replace(updated.clone());

        state.members.deliver(
            Audience::All,
            &RoomEvent::PinModified {
                room_id: room_id.clone(),
                action,
                pin: updated.clone(),
            }
            .into(),
        );
        info!("Vote {:?} by {} on pin {} ({} votes)", action, user_id, pin_id, updated.votes());
        Ok((updated, action))
    }

    /// Remove a pin, returning its title.
    pub async fn remove_pin(&self, pin_id: &str) -> Result<String, SyncError> {
        let room_id = self.room_of_pin(pin_id).await?;
        let mut state = self.lock_room(&room_id).await?;

        if !state.pins.contains(pin_id) {
            return Err(SyncError::NotFound(format!("Pin '{}'", pin_id)));
        }
        if let Err(e) = self.persistence.delete_pin(pin_id).await {
            error!("Failed to delete pin {}: {}", pin_id, e);
            return Err(e.into());
        }
        let removed = state
            .pins
            .remove(pin_id)
            .ok_or_else(|| SyncError::NotFound(format!("Pin '{}'", pin_id)))?;
        self.pin_rooms.remove(pin_id);

        state.members.deliver(
            Audience::All,
            &RoomEvent::PinRemoved {
                room_id: room_id.clone(),
                pin_id: pin_id.to_string(),
                title: removed.title.clone(),
            }
            .into(),
        );
        info!("Pin '{}' ({}) removed from room {}", removed.title, pin_id, room_id);
        Ok(removed.title)
    }

    pub async fn list_pins(&self, room_id: &str) -> Result<Vec<Pin>, SyncError> {
        let state = self.lock_room(room_id).await?;
        Ok(state.pins.list())
    }

    /// Spherical centroid of the room's pins. Read only, nothing is broadcast.
    pub async fn optimal_location(&self, room_id: &str) -> Result<OptimalLocation, SyncError> {
        let coordinates = {
            let state = self.lock_room(room_id).await?;
            state.pins.coordinates()
        };
        if coordinates.is_empty() {
            return Err(SyncError::NoPins(room_id.to_string()));
        }
        let centroid = geometry::centroid(&coordinates)?;
        debug!(
            "Optimal location for room {}: ({}, {}) from {} pins",
            room_id,
            centroid.latitude,
            centroid.longitude,
            coordinates.len()
        );
        Ok(OptimalLocation::from_centroid(centroid, coordinates.len()))
    }

    /// Pins of a room within `max_distance_m` of a point, nearest first.
    pub async fn nearby_pins(
        &self,
        room_id: &str,
        latitude: f64,
        longitude: f64,
        max_distance_m: f64,
    ) -> Result<Vec<NearbyPin>, SyncError> {
        crate::models::validate_coordinate(latitude, longitude)?;
        if !max_distance_m.is_finite() || max_distance_m < 0.0 {
            return Err(SyncError::Validation(format!(
                "max_distance {} must be a non-negative number of meters",
                max_distance_m
            )));
        }
        let pins = self.list_pins(room_id).await?;
        let mut nearby: Vec<NearbyPin> = pins
            .into_iter()
            .map(|pin| NearbyPin {
                distance_m: geometry::distance_m((latitude, longitude), (pin.latitude, pin.longitude)),
                pin,
            })
            .filter(|n| n.distance_m <= max_distance_m)
            .collect();
        nearby.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
        Ok(nearby)
    }

    // ---------------------------------------------------------------------
    // Connection scoped operations
    // ---------------------------------------------------------------------

    pub async fn conn_add_pin(
        &self,
        connection_id: &str,
        title: &str,
        description: Option<&str>,
        latitude: f64,
        longitude: f64,
    ) -> Result<Pin, SyncError> {
        let joined = self.joined_room(connection_id)?;
        let new_pin = NewPin::parse(title, description, latitude, longitude, &joined.user_id)?;
        self.add_pin(&joined.room_id, new_pin).await
    }

    pub async fn conn_vote(&self, connection_id: &str, pin_id: &str) -> Result<(Pin, VoteAction), SyncError> {
        let joined = self.joined_room(connection_id)?;
        self.ensure_pin_in_room(pin_id, &joined.room_id).await?;
        self.vote(pin_id, &joined.user_id).await
    }

    pub async fn conn_remove_pin(&self, connection_id: &str, pin_id: &str) -> Result<String, SyncError> {
        let joined = self.joined_room(connection_id)?;
        self.ensure_pin_in_room(pin_id, &joined.room_id).await?;
        self.remove_pin(pin_id).await
    }

    pub async fn conn_optimal_location(&self, connection_id: &str) -> Result<(String, OptimalLocation), SyncError> {
        let joined = self.joined_room(connection_id)?;
        let location = self.optimal_location(&joined.room_id).await?;
        Ok((joined.room_id, location))
    }

    async fn ensure_pin_in_room(&self, pin_id: &str, room_id: &str) -> Result<(), SyncError> {
        if self.room_of_pin(pin_id).await? != room_id {
            return Err(SyncError::NotFound(format!("Pin '{}'", pin_id)));
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Hub lifecycle
    // ---------------------------------------------------------------------

    /// Retire hubs without members that nobody used for `idle_for`. Their pins
    /// stay in persistence and are loaded again on the next access. Hubs that
    /// are locked right now are left for the next sweep.
    pub fn evict_idle_hubs(&self, idle_for: Duration) -> usize {
        let hubs: Vec<(String, Arc<RoomHub>)> = self
            .hubs
            .iter()
            .map(|h| (h.key().clone(), Arc::clone(h.value())))
            .collect();

        let mut evicted = 0;
        for (room_id, hub) in hubs {
            let Ok(mut state) = hub.state.try_lock() else {
                continue;
            };
            if state.retired || !state.members.is_empty() || state.last_active.elapsed() < idle_for {
                continue;
            }
            state.retired = true;
            for pin in state.pins.iter() {
                self.pin_rooms.remove(&pin.id);
            }
            self.hubs.remove_if(&room_id, |_, current| Arc::ptr_eq(current, &hub));
            debug!("Evicted idle room {} ({} pins)", room_id, state.pins.len());
            evicted += 1;
        }
        if evicted > 0 {
            info!("Evicted {} idle rooms, {} still live", evicted, self.hubs.len());
        }
        evicted
    }

    // ---------------------------------------------------------------------
    // Diagnostics
    // ---------------------------------------------------------------------

    pub async fn stats(&self) -> EngineStats {
        let hubs: Vec<Arc<RoomHub>> = self.hubs.iter().map(|h| Arc::clone(h.value())).collect();
        let mut stats = EngineStats {
            connections: self.connections.len(),
            joined_connections: self.connections.iter().filter(|c| c.joined().is_some()).count(),
            rooms: hubs.len(),
            cached_rooms: self.directory.entry_count(),
            ..EngineStats::default()
        };
        for hub in hubs {
            let state = hub.state.lock().await;
            stats.members += state.members.len();
            stats.pins += state.pins.len();
        }
        stats
    }
}

/// Periodically evict idle hubs for as long as the engine lives.
pub fn spawn_hub_sweeper(engine: Arc<SyncEngine>, idle_for: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(idle_for.max(Duration::from_secs(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            engine.evict_idle_hubs(idle_for);
        }
    })
}
