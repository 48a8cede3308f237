//! Server network layer: UDP socket tasks and the broadcast loop

use crate::config::ServerConfig;
use crate::game::GamePhase;
use crate::ingress::route_datagram;
use crate::session::{Outbound, Session};
use log::{debug, error, info, warn};
use shared::{get_timestamp, Packet, MAX_DATAGRAM_SIZE};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};

/// Upper bound on a single receive wait, so the ingress loop notices shutdown
const RECV_TIMEOUT: Duration = Duration::from_millis(50);

/// Lobby status is re-announced every this many ticks
const LOBBY_ANNOUNCE_TICKS: u64 = 20;

/// Messages sent from the game side to the sender task
#[derive(Debug)]
pub enum GameMessage {
    SendPacket { packet: Packet, addr: SocketAddr },
}

/// Authoritative grid clash server
pub struct Server {
    socket: Arc<UdpSocket>,
    session: Arc<Mutex<Session>>,
    tick_duration: Duration,

    game_tx: mpsc::UnboundedSender<GameMessage>,
    game_rx: Option<mpsc::UnboundedReceiver<GameMessage>>,
}

impl Server {
    /// Binds the UDP socket. This is the only fatal error the server has.
    pub async fn new(config: ServerConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(&config.bind_addr).await?);
        info!("Server listening on {}", socket.local_addr()?);

        let (game_tx, game_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            session: Arc::new(Mutex::new(Session::new(&config))),
            tick_duration: config.tick_interval,
            game_tx,
            game_rx: Some(game_rx),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Shared game state, mainly for inspection after a finished game
    pub fn session(&self) -> Arc<Mutex<Session>> {
        Arc::clone(&self.session)
    }

    /// Spawns the ingress task: bounded-wait receives routed through the session
    fn spawn_network_receiver(&self) -> JoinHandle<()> {
        let socket = Arc::clone(&self.socket);
        let session = Arc::clone(&self.session);
        let game_tx = self.game_tx.clone();

        tokio::spawn(async move {
            let mut buffer = vec![0u8; MAX_DATAGRAM_SIZE];

            while !game_tx.is_closed() {
                let (len, addr) = match timeout(RECV_TIMEOUT, socket.recv_from(&mut buffer)).await
                {
                    Err(_) => continue,
                    Ok(Ok(received)) => received,
                    Ok(Err(e)) => {
                        // ICMP port unreachable from a vanished client lands here on some platforms
                        debug!("Error receiving packet: {}", e);
                        continue;
                    }
                };

                let replies = {
                    let mut session = session.lock().await;
                    route_datagram(&mut session, &buffer[..len], addr)
                };

                if queue_packets(&game_tx, replies).is_err() {
                    break;
                }
            }
        })
    }

    /// Spawns the sender task. It owns the sequence counter and stamps every
    /// packet right before it goes out.
    fn spawn_network_sender(&mut self) -> JoinHandle<()> {
        let socket = Arc::clone(&self.socket);
        let mut game_rx = self
            .game_rx
            .take()
            .unwrap_or_else(|| mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            let mut seq_num: u32 = 0;

            while let Some(message) = game_rx.recv().await {
                match message {
                    GameMessage::SendPacket { mut packet, addr } => {
                        packet.stamp(seq_num, get_timestamp());
                        seq_num = seq_num.wrapping_add(1);
                        if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                            error!("Failed to send {} to {}: {}", packet.msg_type(), addr, e);
                        }
                    }
                }
            }
        })
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let data = packet.encode()?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    /// Runs the lobby and the game until the terminal broadcast has been sent
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let sender = self.spawn_network_sender();
        let receiver = self.spawn_network_receiver();

        let mut tick_interval = interval(self.tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut lobby_ticks: u64 = 0;

        info!("Waiting for players...");

        loop {
            tick_interval.tick().await;

            let mut session = self.session.lock().await;

            if session.phase() == GamePhase::Lobby {
                lobby_ticks += 1;
                if lobby_ticks % LOBBY_ANNOUNCE_TICKS == 0 {
                    let announcements = session.lobby_announcements();
                    drop(session);
                    queue_packets(&self.game_tx, announcements)?;
                }
                continue;
            }

            let plan = session.plan_tick();
            let client_count = session.clients.len();
            drop(session);

            let snapshot_id = plan.snapshot_id;
            let game_over = !plan.game_ongoing;
            queue_packets(&self.game_tx, plan.into_packets())?;

            if snapshot_id % 100 == 0 {
                debug!("Tick {}: {} clients", snapshot_id, client_count);
            }

            if game_over {
                info!("Terminal snapshot {} broadcast, shutting down", snapshot_id);
                break;
            }
        }

        // Let the sender drain everything queued so far before returning.
        receiver.abort();
        let _ = receiver.await;
        let (closed_tx, _) = mpsc::unbounded_channel();
        drop(std::mem::replace(&mut self.game_tx, closed_tx));
        if let Err(e) = sender.await {
            warn!("Sender task ended abnormally: {}", e);
        }

        Ok(())
    }
}

fn queue_packets(
    game_tx: &mpsc::UnboundedSender<GameMessage>,
    packets: Vec<Outbound>,
) -> Result<(), mpsc::error::SendError<GameMessage>> {
    for (addr, packet) in packets {
        game_tx.send(GameMessage::SendPacket { packet, addr })?;
    }
    Ok(())
}
