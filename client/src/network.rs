//! Client network loop: UDP transport, terminal input, and frame sampling.

use crate::input::{parse_line, Command, ControlState};
use crate::mirror::{MirrorEvent, SessionMirror};
use bincode::{deserialize, serialize};
use log::{error, info, warn};
use shared::{Packet, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::UdpSocket;
use tokio::time::interval;

pub struct Client {
    socket: UdpSocket,
    server_addr: SocketAddr,
    requested_name: Option<String>,
    connected: bool,

    mirror: SessionMirror,
    controls: ControlState,
}

impl Client {
    pub async fn new(
        server_addr: &str,
        requested_name: Option<String>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        let server_addr = server_addr.parse()?;

        Ok(Client {
            socket,
            server_addr,
            requested_name,
            connected: false,
            mirror: SessionMirror::new(),
            controls: ControlState::new(),
        })
    }

    async fn connect(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        info!("Connecting to authority...");

        let packet = Packet::Connect {
            client_version: PROTOCOL_VERSION,
            requested_name: self.requested_name.clone(),
        };
        self.send_packet(&packet).await
    }

    async fn send_packet(&self, packet: &Packet) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        self.socket.send_to(&data, self.server_addr).await?;
        Ok(())
    }

    fn present_events(&self, events: &[MirrorEvent]) {
        for event in events {
            match event {
                MirrorEvent::Connected {
                    participant_id,
                    host_id,
                } => {
                    if participant_id == host_id {
                        println!("Connected as participant {} (you are the host)", participant_id);
                    } else {
                        println!("Connected as participant {}", participant_id);
                    }
                }
                MirrorEvent::Disconnected { reason } => {
                    println!("Disconnected: {}", reason);
                }
                MirrorEvent::RosterChanged => {
                    for line in self.mirror.roster_lines() {
                        println!("{}", line);
                    }
                }
                MirrorEvent::ChatReceived(entry) => {
                    println!("{}", entry.line);
                }
                MirrorEvent::MatchStarted => {
                    println!("Match started. /move and /turn to play.");
                }
                MirrorEvent::HealthChanged(id) => {
                    if let Some(player) = self.mirror.player(*id) {
                        if player.dead {
                            println!("Player {} died", id);
                        }
                    }
                }
                // Transform, color, and score changes update the mirror
                // silently; a graphical frontend would redraw here.
                _ => {}
            }
        }
    }

    fn handle_packet(&mut self, packet: Packet) {
        match &packet {
            Packet::Connected { .. } => self.connected = true,
            Packet::Disconnected { .. } => self.connected = false,
            _ => {}
        }

        let events = self.mirror.apply(packet);
        self.present_events(&events);
    }

    /// Applies one parsed terminal command. Returns false when the client
    /// should shut down.
    async fn handle_command(&mut self, command: Command) -> Result<bool, Box<dyn std::error::Error>> {
        match command {
            Command::Chat(text) => {
                self.send_packet(&Packet::Chat { text }).await?;
            }
            Command::Ready(ready) => {
                self.send_packet(&Packet::SetReady { ready }).await?;
            }
            Command::Name(name) => {
                // The authority validates; a rejected name simply never
                // comes back in the next roster snapshot.
                self.send_packet(&Packet::SetName { name }).await?;
            }
            Command::Move(step) => {
                self.controls.set_move(step);
            }
            Command::Stop => {
                self.controls.stop();
            }
            Command::Rotate(degrees) => {
                self.controls.set_turn(degrees);
            }
            Command::Color(color) => {
                self.send_packet(&Packet::ColorChange { color }).await?;
            }
            Command::Reload => {
                self.send_packet(&Packet::Reload).await?;
            }
            Command::Start => {
                if self.mirror.is_local_host() {
                    self.send_packet(&Packet::StartGame).await?;
                } else {
                    println!("Only the host can start the match.");
                }
            }
            Command::Kick(target) => {
                if self.mirror.is_local_host() {
                    self.send_packet(&Packet::Kick { target }).await?;
                } else {
                    println!("Only the host can kick.");
                }
            }
            Command::Roster => {
                for line in self.mirror.roster_lines() {
                    println!("{}", line);
                }
            }
            Command::Quit => {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.connect().await?;

        let mut frame_interval = interval(Duration::from_millis(16));
        let mut stdin_lines = BufReader::new(tokio::io::stdin()).lines();
        let mut buffer = [0u8; 2048];

        loop {
            tokio::select! {
                result = self.socket.recv_from(&mut buffer) => {
                    match result {
                        Ok((len, _)) => {
                            if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                                self.handle_packet(packet);
                            } else {
                                warn!("Failed to deserialize packet");
                            }
                        },
                        Err(e) => error!("Error receiving packet: {}", e),
                    }
                },

                line = stdin_lines.next_line() => {
                    match line? {
                        Some(line) => {
                            match parse_line(&line) {
                                Ok(Some(command)) => {
                                    if !self.handle_command(command).await? {
                                        break;
                                    }
                                }
                                Ok(None) => {}
                                Err(message) => println!("{}", message),
                            }
                        }
                        None => break,
                    }
                },

                _ = frame_interval.tick() => {
                    // At most one movement and one rotation request leave
                    // per frame, and only while the match is running.
                    if self.connected && self.mirror.in_match() {
                        let (move_delta, turn_delta) = self.controls.frame_sample();

                        if let Some(delta) = move_delta {
                            self.send_packet(&Packet::Move { delta }).await?;
                        }
                        if let Some(delta) = turn_delta {
                            self.send_packet(&Packet::Rotate { delta }).await?;
                        }
                    }
                },
            }
        }

        if self.connected {
            let _ = self.send_packet(&Packet::Disconnect).await;
        }

        Ok(())
    }
}
