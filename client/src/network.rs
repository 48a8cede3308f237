use crate::autoplay::AutoPlayer;
use crate::latency::LatencyTracker;
use crate::reconstructor::Reconstructor;
use crate::view::{render_board, LogView};
use log::{debug, error, info, warn};
use shared::{get_timestamp, Packet, Payload, SnapshotId, DEFAULT_PORT, MAX_DATAGRAM_SIZE};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::time::{interval, interval_at, sleep, MissedTickBehavior};

/// How often an unassigned client repeats its hello
const HELLO_RETRY_INTERVAL: Duration = Duration::from_millis(500);

/// Give up once a running game has been silent this long
const SERVER_SILENCE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_addr: String,
    /// Cadence of automatic moves
    pub move_interval: Duration,
    /// Pick and send moves automatically; otherwise only observe
    pub autoplay: bool,
    /// Artificial latency, half applied on send and half on receive
    pub fake_ping_ms: u64,
    /// Seed for reproducible automatic moves
    pub seed: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: format!("127.0.0.1:{}", DEFAULT_PORT),
            move_interval: Duration::from_millis(250),
            autoplay: true,
            fake_ping_ms: 0,
            seed: None,
        }
    }
}

pub struct Client {
    socket: UdpSocket,
    server_addr: SocketAddr,

    reconstructor: Reconstructor,
    view: LogView,
    latency: LatencyTracker,
    autoplayer: Option<AutoPlayer>,

    seq_num: u32,
    fake_ping_ms: u64,
    move_interval: Duration,
    last_heard: Instant,
}

impl Client {
    /// Binds an ephemeral local port. Fails if `server_addr` is not an `ip:port` address.
    pub async fn new(config: ClientConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        let server_addr = config.server_addr.parse()?;

        Ok(Client {
            socket,
            server_addr,
            reconstructor: Reconstructor::default(),
            view: LogView::new(),
            latency: LatencyTracker::default(),
            autoplayer: config.autoplay.then(|| AutoPlayer::new(config.seed)),
            seq_num: 0,
            fake_ping_ms: config.fake_ping_ms,
            move_interval: config.move_interval,
            last_heard: Instant::now(),
        })
    }

    pub fn reconstructor(&self) -> &Reconstructor {
        &self.reconstructor
    }

    pub fn latency(&self) -> &LatencyTracker {
        &self.latency
    }

    async fn connect(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        debug!("Sending hello to {}", self.server_addr);
        self.send_packet(Packet::new(None, Payload::Hello)).await
    }

    async fn send_packet(
        &mut self,
        mut packet: Packet,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if self.fake_ping_ms > 0 {
            sleep(Duration::from_millis(self.fake_ping_ms / 2)).await;
        }

        packet.stamp(self.seq_num, get_timestamp());
        self.seq_num = self.seq_num.wrapping_add(1);

        let data = packet.encode()?;
        self.socket.send_to(&data, self.server_addr).await?;
        Ok(())
    }

    async fn send_ack(&mut self, snapshot_id: SnapshotId) {
        if let Err(e) = self.send_packet(Packet::ack(snapshot_id)).await {
            error!("Error sending ACK {}: {}", snapshot_id, e);
        }
    }

    /// Requests a claim on `(row, col)`. Does nothing before a player id is assigned.
    pub async fn send_move(
        &mut self,
        row: usize,
        col: usize,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let Some(player_id) = self.reconstructor.my_id() else {
            return Ok(());
        };
        let packet = Packet::new(
            None,
            Payload::Event {
                row: row as u16,
                col: col as u16,
                player_id,
            },
        );
        self.send_packet(packet).await
    }

    async fn handle_datagram(&mut self, bytes: &[u8], received_ms: u64) {
        let packet = match Packet::decode(bytes) {
            Ok(packet) => packet,
            Err(e) => {
                warn!("Discarding datagram from server: {}", e);
                return;
            }
        };

        self.last_heard = Instant::now();
        let sample = self.latency.record(packet.server_timestamp, received_ms);
        debug!(
            "{} seq {} snapshot {:?}: latency {:.0} ms, jitter {:.0} ms",
            packet.msg_type(),
            packet.seq_num,
            packet.snapshot_id,
            sample.latency_ms,
            sample.jitter_ms
        );

        match self.reconstructor.apply(packet, &mut self.view) {
            Ok(Some(snapshot_id)) => self.send_ack(snapshot_id).await,
            Ok(None) => {}
            Err(e) => warn!("Discarding malformed update: {}", e),
        }
    }

    async fn play_turn(&mut self) {
        let Some(player) = self.autoplayer.as_mut() else {
            return;
        };
        if let Some((row, col)) = player.pick_cell(self.reconstructor.grid()) {
            if let Err(e) = self.send_move(row, col).await {
                error!("Error sending move: {}", e);
            }
        }
    }

    /// Runs until the server announces the end of the game or goes silent
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.connect().await?;

        // the first hello went out above
        let mut hello_interval = interval_at(
            tokio::time::Instant::now() + HELLO_RETRY_INTERVAL,
            HELLO_RETRY_INTERVAL,
        );
        let mut move_interval = interval(self.move_interval);
        move_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut buffer = vec![0u8; MAX_DATAGRAM_SIZE];

        while !self.reconstructor.game_over() {
            // moves are picked from the mirror, so wait for the first tick
            let can_move = self.autoplayer.is_some()
                && self.reconstructor.my_id().is_some()
                && self.reconstructor.last_applied().is_some();

            tokio::select! {
                result = self.socket.recv_from(&mut buffer) => {
                    let received_ms = get_timestamp();
                    match result {
                        Ok((len, from)) if from == self.server_addr => {
                            if self.fake_ping_ms > 0 {
                                sleep(Duration::from_millis(self.fake_ping_ms / 2)).await;
                            }
                            self.handle_datagram(&buffer[..len], received_ms).await;
                        }
                        Ok((_, from)) => debug!("Ignoring datagram from {}", from),
                        Err(e) => error!("Error receiving packet: {}", e),
                    }
                },

                _ = hello_interval.tick() => {
                    if self.reconstructor.my_id().is_none() {
                        if let Err(e) = self.connect().await {
                            error!("Error sending hello: {}", e);
                        }
                    } else if self.reconstructor.game_started()
                        && self.last_heard.elapsed() > SERVER_SILENCE_TIMEOUT
                    {
                        warn!(
                            "No word from the server for {:?}, giving up",
                            SERVER_SILENCE_TIMEOUT
                        );
                        break;
                    }
                },

                _ = move_interval.tick(), if can_move => {
                    self.play_turn().await;
                },
            }
        }

        info!("Final board:\n{}", render_board(self.reconstructor.grid()));
        info!("{}", self.reconstructor.status());
        if let (Some(latency), Some(jitter)) =
            (self.latency.average_latency(), self.latency.average_jitter())
        {
            info!(
                "Average latency {:.1} ms, jitter {:.1} ms, {} cells changed by deltas",
                latency,
                jitter,
                self.view.cells_changed()
            );
        }

        Ok(())
    }
}
