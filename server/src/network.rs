//! Authority network layer handling UDP communications and request dispatch
//!
//! One loop owns every piece of canonical state (roster, arena, lobby), so
//! requests are applied in arrival order per participant and replication
//! packets leave in the same order as the mutations that caused them.

use crate::arena::Arena;
use crate::chat::{self, Delivery, Recipients};
use crate::lobby::Lobby;
use crate::roster::Roster;
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{is_valid_name, Packet, PROTOCOL_VERSION};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::time::interval;

/// Time a reloading player spends before settling back to idle.
const RELOAD_DURATION: Duration = Duration::from_millis(1500);

/// Messages sent from network tasks to the authority loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived {
        packet: Packet,
        addr: SocketAddr,
    },
    ClientTimeout {
        participant_id: u64,
    },
    #[allow(dead_code)]
    Shutdown,
}

/// Messages sent from the authority loop to the network sender task
#[derive(Debug)]
pub enum GameMessage {
    SendPacket {
        packet: Packet,
        addr: SocketAddr,
    },
    BroadcastPacket {
        packet: Packet,
        exclude: Option<u64>,
    },
    SendToClients {
        packet: Packet,
        targets: Vec<u64>,
    },
}

/// One connected transport session.
#[derive(Debug)]
struct ClientSession {
    id: u64,
    addr: SocketAddr,
    last_seen: Instant,
}

/// Tracks transport sessions: address <-> participant id plus liveness.
pub struct ClientTable {
    sessions: HashMap<u64, ClientSession>,
    next_id: u64,
    max_clients: usize,
}

impl ClientTable {
    pub fn new(max_clients: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            next_id: 1,
            max_clients,
        }
    }

    /// Registers a new session and allocates its participant id. Ids are
    /// never reused within one server run.
    pub fn add(&mut self, addr: SocketAddr) -> Option<u64> {
        if self.sessions.len() >= self.max_clients {
            return None;
        }

        let id = self.next_id;
        self.next_id += 1;
        self.sessions.insert(
            id,
            ClientSession {
                id,
                addr,
                last_seen: Instant::now(),
            },
        );
        info!("Participant {} connected from {}", id, addr);
        Some(id)
    }

    pub fn remove(&mut self, id: u64) -> bool {
        if let Some(session) = self.sessions.remove(&id) {
            info!("Participant {} session closed", session.id);
            true
        } else {
            false
        }
    }

    pub fn find_by_addr(&self, addr: SocketAddr) -> Option<u64> {
        self.sessions
            .values()
            .find(|s| s.addr == addr)
            .map(|s| s.id)
    }

    pub fn addr_of(&self, id: u64) -> Option<SocketAddr> {
        self.sessions.get(&id).map(|s| s.addr)
    }

    pub fn touch(&mut self, id: u64) {
        if let Some(session) = self.sessions.get_mut(&id) {
            session.last_seen = Instant::now();
        }
    }

    pub fn check_timeouts(&mut self, timeout: Duration) -> Vec<u64> {
        let timed_out: Vec<u64> = self
            .sessions
            .values()
            .filter(|s| s.last_seen.elapsed() > timeout)
            .map(|s| s.id)
            .collect();

        for id in &timed_out {
            self.remove(*id);
        }
        timed_out
    }

    pub fn addrs(&self) -> Vec<(u64, SocketAddr)> {
        self.sessions.values().map(|s| (s.id, s.addr)).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// The authority process coordinating networking and canonical state
pub struct Server {
    socket: Arc<UdpSocket>,
    clients: Arc<RwLock<ClientTable>>,
    roster: Roster,
    lobby: Lobby,
    arena: Option<Arena>,
    reloading_until: HashMap<u64, Instant>,
    tick_duration: Duration,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    game_tx: mpsc::UnboundedSender<GameMessage>,
    game_rx: mpsc::UnboundedReceiver<GameMessage>,
}

impl Server {
    pub async fn new(
        addr: &str,
        tick_duration: Duration,
        max_clients: usize,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Authority listening on {}", socket.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (game_tx, game_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            clients: Arc::new(RwLock::new(ClientTable::new(max_clients))),
            roster: Roster::new(),
            lobby: Lobby::new(),
            arena: None,
            reloading_until: HashMap::new(),
            tick_duration,
            server_tx,
            server_rx,
            game_tx,
            game_rx,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.socket.local_addr()
    }

    /// Spawns task that continuously listens for incoming packets
    async fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 2048];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to authority loop: {}", e);
                                break;
                            }
                        } else {
                            warn!("Failed to deserialize packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns task that processes the outgoing packet queue
    async fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let clients = Arc::clone(&self.clients);
        let mut game_rx = std::mem::replace(&mut self.game_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(message) = game_rx.recv().await {
                match message {
                    GameMessage::SendPacket { packet, addr } => {
                        if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                        }
                    }
                    GameMessage::BroadcastPacket { packet, exclude } => {
                        let client_addrs = {
                            let clients_guard = clients.read().await;
                            clients_guard.addrs()
                        };

                        for (participant_id, addr) in client_addrs {
                            if Some(participant_id) == exclude {
                                continue;
                            }

                            if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                                error!("Failed to send to participant {}: {}", participant_id, e);
                            }
                        }
                    }
                    GameMessage::SendToClients { packet, targets } => {
                        let client_addrs = {
                            let clients_guard = clients.read().await;
                            clients_guard.addrs()
                        };

                        for (participant_id, addr) in client_addrs {
                            if !targets.contains(&participant_id) {
                                continue;
                            }

                            if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                                error!("Failed to send to participant {}: {}", participant_id, e);
                            }
                        }
                    }
                }
            }
        });
    }

    /// Spawns task that monitors client timeouts
    async fn spawn_timeout_checker(&self) {
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let timed_out = {
                    let mut clients_guard = clients.write().await;
                    clients_guard.check_timeouts(Duration::from_secs(5))
                };

                for participant_id in timed_out {
                    if let Err(e) = server_tx.send(ServerMessage::ClientTimeout { participant_id })
                    {
                        error!("Failed to send timeout message: {}", e);
                        break;
                    }
                }
            }
        });
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    fn send_packet(&self, packet: Packet, addr: SocketAddr) {
        if let Err(e) = self.game_tx.send(GameMessage::SendPacket { packet, addr }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    fn broadcast_packet(&self, packet: Packet, exclude: Option<u64>) {
        if let Err(e) = self
            .game_tx
            .send(GameMessage::BroadcastPacket { packet, exclude })
        {
            error!("Failed to queue broadcast packet: {}", e);
        }
    }

    fn send_to_clients(&self, packet: Packet, targets: Vec<u64>) {
        if let Err(e) = self
            .game_tx
            .send(GameMessage::SendToClients { packet, targets })
        {
            error!("Failed to queue targeted packet: {}", e);
        }
    }

    fn execute_delivery(&self, delivery: Delivery) {
        match delivery.recipients {
            Recipients::All => self.broadcast_packet(delivery.packet, None),
            Recipients::AllExcept(id) => self.broadcast_packet(delivery.packet, Some(id)),
            Recipients::Only(targets) => self.send_to_clients(delivery.packet, targets),
        }
    }

    /// Re-broadcast the full roster snapshot after any roster mutation.
    fn replicate_roster(&self) {
        self.broadcast_packet(
            Packet::Roster {
                records: self.roster.snapshot(),
            },
            None,
        );
    }

    async fn handle_connect(&mut self, addr: SocketAddr, requested_name: Option<String>) {
        // A second connect from a live session tears the old one down
        // and starts fresh.
        let existing = {
            let clients = self.clients.read().await;
            clients.find_by_addr(addr)
        };
        if let Some(existing_id) = existing {
            info!(
                "Connect from already-connected {} (participant {}), restarting session",
                addr, existing_id
            );
            self.remove_participant(existing_id).await;
        }

        let participant_id = {
            let mut clients = self.clients.write().await;
            clients.add(addr)
        };

        let participant_id = match participant_id {
            Some(id) => id,
            None => {
                self.send_packet(
                    Packet::Disconnected {
                        reason: "Server full".to_string(),
                    },
                    addr,
                );
                return;
            }
        };

        if self.roster.join(participant_id).is_none() {
            error!("Roster already contained participant {}", participant_id);
        }

        if let Some(name) = requested_name {
            if is_valid_name(&name) {
                self.roster.set_name(participant_id, &name);
            }
        }

        let host_id = self.roster.host_id().unwrap_or(participant_id);
        self.send_packet(
            Packet::Connected {
                participant_id,
                host_id,
            },
            addr,
        );

        self.replicate_roster();
        self.execute_delivery(chat::plan_join_notice(participant_id));

        // Late joiner during a running match gets the current transforms
        // and is dropped straight into the arena.
        if self.lobby.in_match() {
            let color = self
                .roster
                .find(participant_id)
                .map(|r| r.color)
                .unwrap_or(shared::FALLBACK_COLOR);

            let (spawned, catchup) = match self.arena.as_mut() {
                Some(arena) => {
                    let spawned = arena.spawn_player(participant_id, color).clone();
                    let catchup: Vec<Packet> = arena
                        .players()
                        .map(|player| Packet::TransformUpdate {
                            id: player.id,
                            position: player.position,
                            rotation: player.rotation,
                        })
                        .collect();
                    (spawned, catchup)
                }
                None => return,
            };

            self.send_packet(Packet::GameStarted, addr);
            for packet in catchup {
                self.send_packet(packet, addr);
            }
            self.broadcast_packet(
                Packet::TransformUpdate {
                    id: spawned.id,
                    position: spawned.position,
                    rotation: spawned.rotation,
                },
                Some(participant_id),
            );
        }
    }

    /// Full teardown for one participant: transport session, roster record
    /// (returning its color to the pool), arena state, and the snapshot and
    /// notice everyone remaining needs.
    async fn remove_participant(&mut self, participant_id: u64) {
        {
            let mut clients = self.clients.write().await;
            clients.remove(participant_id);
        }
        self.reloading_until.remove(&participant_id);

        if self.roster.leave(participant_id).is_some() {
            if let Some(arena) = self.arena.as_mut() {
                arena.remove_player(participant_id);
            }
            self.replicate_roster();
            self.execute_delivery(chat::plan_leave_notice(participant_id));
        }
    }

    fn handle_start(&mut self, sender: u64) {
        if !self.roster.is_host(sender) {
            warn!(
                "Ignoring start command from non-host participant {}",
                sender
            );
            return;
        }

        // Start is gated exactly like the host's start control: enabled
        // only while every participant is ready.
        let view = self.lobby.project(&self.roster, sender, true);
        if !view.start_enabled {
            warn!("Ignoring start command while participants are not ready");
            return;
        }

        if !self.lobby.start() {
            return;
        }

        let host_id = self.roster.host_id().unwrap_or(sender);
        let mut arena = Arena::new(host_id);
        for record in self.roster.snapshot() {
            arena.spawn_player(record.id, record.color);
        }

        self.broadcast_packet(Packet::GameStarted, None);
        for player in arena.players() {
            self.broadcast_packet(
                Packet::TransformUpdate {
                    id: player.id,
                    position: player.position,
                    rotation: player.rotation,
                },
                None,
            );
        }
        self.arena = Some(arena);
    }

    /// Processes one incoming request against the canonical state
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        if let Packet::Connect {
            client_version,
            requested_name,
        } = packet
        {
            if client_version != PROTOCOL_VERSION {
                self.send_packet(
                    Packet::Disconnected {
                        reason: "Protocol version mismatch".to_string(),
                    },
                    addr,
                );
                return;
            }
            self.handle_connect(addr, requested_name).await;
            return;
        }

        // Everything else requires an established session. Requests from
        // unknown addresses (including in-flight requests racing a
        // disconnect) are silently dropped.
        let sender = {
            let mut clients = self.clients.write().await;
            match clients.find_by_addr(addr) {
                Some(id) => {
                    clients.touch(id);
                    id
                }
                None => return,
            }
        };

        match packet {
            Packet::Disconnect => {
                self.remove_participant(sender).await;
            }

            Packet::SetReady { ready } => {
                if self.roster.set_ready(sender, ready).is_some() {
                    self.replicate_roster();
                }
            }

            Packet::SetName { name } => {
                // Rejection is silent: the requester restores its own
                // cached last-good name, no correction is pushed back.
                if self.roster.set_name(sender, &name).is_some() {
                    self.replicate_roster();
                }
            }

            Packet::Chat { text } => {
                for delivery in chat::plan_send(sender, &text, &self.roster) {
                    self.execute_delivery(delivery);
                }
            }

            Packet::Move { delta } => {
                if let Some(arena) = self.arena.as_mut() {
                    if let Some(position) = arena.apply_move(sender, delta) {
                        let rotation = arena
                            .player(sender)
                            .map(|p| p.rotation)
                            .unwrap_or_default();
                        self.broadcast_packet(
                            Packet::TransformUpdate {
                                id: sender,
                                position,
                                rotation,
                            },
                            None,
                        );
                    }
                }
            }

            Packet::Rotate { delta } => {
                if let Some(arena) = self.arena.as_mut() {
                    if let Some(rotation) = arena.apply_rotate(sender, delta) {
                        let position = arena
                            .player(sender)
                            .map(|p| p.position)
                            .unwrap_or_default();
                        self.broadcast_packet(
                            Packet::TransformUpdate {
                                id: sender,
                                position,
                                rotation,
                            },
                            None,
                        );
                    }
                }
            }

            Packet::ColorChange { color } => {
                if let Some(arena) = self.arena.as_mut() {
                    if let Some(committed) = arena.set_color(sender, color) {
                        // The actor already applied the color locally;
                        // everyone else learns it here.
                        self.broadcast_packet(
                            Packet::ColorUpdate {
                                id: sender,
                                color: committed,
                            },
                            Some(sender),
                        );
                    }
                }
            }

            Packet::ReportHit { target, amount } => {
                if let Some(arena) = self.arena.as_mut() {
                    if let Some((health, dead)) = arena.apply_damage(target, amount) {
                        // A kill awards the shooter; settle the score
                        // before queueing any replication.
                        let score = if dead { arena.add_score(sender, 1) } else { None };

                        self.broadcast_packet(
                            Packet::HealthUpdate {
                                id: target,
                                health,
                                dead,
                            },
                            None,
                        );
                        if let Some(score) = score {
                            self.broadcast_packet(Packet::ScoreUpdate { id: sender, score }, None);
                        }
                    }
                }
            }

            Packet::Reload => {
                if let Some(arena) = self.arena.as_mut() {
                    if arena.begin_reload(sender) {
                        self.reloading_until
                            .insert(sender, Instant::now() + RELOAD_DURATION);
                    }
                }
            }

            Packet::StartGame => {
                self.handle_start(sender);
            }

            Packet::Kick { target } => {
                if !self.roster.is_host(sender) || target == sender {
                    warn!(
                        "Ignoring kick of {} from participant {}",
                        target, sender
                    );
                    return;
                }

                let target_addr = {
                    let clients = self.clients.read().await;
                    clients.addr_of(target)
                };
                if let Some(addr) = target_addr {
                    self.send_packet(
                        Packet::Disconnected {
                            reason: "Kicked by the host".to_string(),
                        },
                        addr,
                    );
                    // Funnels through the normal leave path.
                    self.remove_participant(target).await;
                }
            }

            _ => {
                warn!(
                    "Unexpected packet type from participant {} at {}",
                    sender, addr
                );
            }
        }
    }

    /// Settles players whose reload duration has elapsed back to idle.
    fn expire_reloads(&mut self) {
        let now = Instant::now();
        let done: Vec<u64> = self
            .reloading_until
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(id, _)| *id)
            .collect();

        for id in done {
            self.reloading_until.remove(&id);
            if let Some(arena) = self.arena.as_mut() {
                arena.finish_reload(id);
            }
        }
    }

    /// Main authority loop coordinating all operations
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_network_receiver().await;
        self.spawn_network_sender().await;
        self.spawn_timeout_checker().await;

        let mut tick_interval = interval(self.tick_duration);
        let mut tick: u64 = 0;

        info!("Authority started successfully");

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::PacketReceived { packet, addr }) => {
                            self.handle_packet(packet, addr).await;
                        },
                        Some(ServerMessage::ClientTimeout { participant_id }) => {
                            // The session entry is already gone; clean up
                            // the rest.
                            self.remove_participant(participant_id).await;
                        },
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Authority shutting down");
                            break;
                        }
                    }
                },

                _ = tick_interval.tick() => {
                    tick += 1;
                    self.expire_reloads();

                    // Replication is change-driven; the tick surfaces
                    // reload completion and periodic stats.
                    if tick % 300 == 0 && !self.roster.is_empty() {
                        debug!(
                            "Tick {}: {} participants, all_ready={}, phase={:?}",
                            tick,
                            self.roster.len(),
                            self.roster.all_ready(),
                            self.lobby.phase()
                        );
                    }
                },
            }
        }

        Ok(())
    }
}
