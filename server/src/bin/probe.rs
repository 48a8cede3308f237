//! Raw protocol probe: joins a server as a passive player and prints what
//! every tick delivers. Acknowledging only every Nth tick exercises the
//! rebased-delta and full-snapshot paths.

use clap::Parser;
use shared::{get_timestamp, Packet, Payload, MAX_DATAGRAM_SIZE};
use std::net::SocketAddr;
use tokio::net::UdpSocket;

#[derive(Parser, Debug)]
#[command(about = "Print the replication traffic a client receives")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:12000")]
    server: SocketAddr,

    /// Acknowledge one tick out of every N (1 = every tick, 0 = never)
    #[arg(short, long, default_value_t = 1)]
    ack_every: u32,

    /// Stop after this many tick packets
    #[arg(short, long, default_value_t = 200)]
    ticks: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    println!("Probe bound to {}", socket.local_addr()?);

    let hello = Packet::new(None, Payload::Hello);
    socket.send_to(&hello.encode()?, args.server).await?;
    println!("Sent hello to {}", args.server);

    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
    let mut seq_num: u32 = 0;
    let mut ticks_seen = 0;
    let mut tick_bytes = 0usize;

    while ticks_seen < args.ticks {
        let (len, _) = socket.recv_from(&mut buf).await?;
        let packet = match Packet::decode(&buf[..len]) {
            Ok(packet) => packet,
            Err(e) => {
                println!("Undecodable datagram ({} bytes): {}", len, e);
                continue;
            }
        };
        let latency = get_timestamp().saturating_sub(packet.server_timestamp);

        let Some(snapshot_id) = packet.snapshot_id else {
            match &packet.payload {
                Payload::Lobby { message, player_id, .. } => {
                    println!("[lobby] player {}: {}", player_id + 1, message)
                }
                Payload::Info { message, .. } => println!("[info] {}", message),
                _ => println!("[{}] seq {}", packet.msg_type(), packet.seq_num),
            }
            continue;
        };

        ticks_seen += 1;
        tick_bytes += len;
        let detail = match &packet.payload {
            Payload::Delta { changes, .. } => format!("{} changes", changes.len()),
            Payload::Snapshot { grid, message, .. } => {
                format!("{} claimed, \"{}\"", grid.claimed_count(), message)
            }
            _ => String::new(),
        };
        println!(
            "tick {:>5} {:<8} {:>5} bytes {:>4} ms  {}",
            snapshot_id,
            packet.msg_type(),
            len,
            latency,
            detail
        );

        if args.ack_every > 0 && snapshot_id % args.ack_every == 0 {
            let mut ack = Packet::ack(snapshot_id);
            ack.stamp(seq_num, get_timestamp());
            seq_num = seq_num.wrapping_add(1);
            socket.send_to(&ack.encode()?, args.server).await?;
        }

        if matches!(packet.payload, Payload::Snapshot { game_ongoing: false, .. }) {
            println!("Game over");
            break;
        }
    }

    if ticks_seen > 0 {
        println!(
            "{} tick packets, {} bytes total, {:.1} bytes/tick",
            ticks_seen,
            tick_bytes,
            tick_bytes as f64 / ticks_seen as f64
        );
    }

    Ok(())
}
