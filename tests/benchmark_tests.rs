//! Performance benchmarks for the replication path

use assert_approx_eq::assert_approx_eq;
use server::config::ServerConfig;
use server::history::SnapshotHistory;
use server::session::Session;
use shared::{diff, Grid, Packet, Payload, PlayerId, GRID_SIZE, HISTORY_LEN, MAX_DATAGRAM_SIZE};
use std::net::SocketAddr;
use std::time::Instant;

fn addr(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

fn half_claimed(size: usize) -> Grid {
    let mut grid = Grid::new(size);
    for row in 0..size {
        for col in 0..size {
            if (row + col) % 2 == 0 {
                grid.set(row, col, ((row + col) % 4 + 1) as u8);
            }
        }
    }
    grid
}

/// Benchmarks diffing two default-sized grids
#[test]
fn benchmark_grid_diff() {
    let old = Grid::new(GRID_SIZE);
    let new = half_claimed(GRID_SIZE);

    let iterations = 10_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let changes = diff(&old, &new);
        assert_eq!(changes.len(), GRID_SIZE * GRID_SIZE / 2);
    }

    let duration = start.elapsed();
    println!(
        "Grid diff: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_secs() < 5);
}

/// Benchmarks archiving a snapshot every tick with a full history
#[test]
fn benchmark_history_record() {
    let mut history = SnapshotHistory::new(HISTORY_LEN);
    let grid = half_claimed(GRID_SIZE);

    let iterations = 10_000u32;
    let start = Instant::now();

    for id in 0..iterations {
        history.record(id, &grid);
    }

    let duration = start.elapsed();
    println!(
        "History record: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert_eq!(history.len(), HISTORY_LEN);
    assert_eq!(history.oldest_id(), Some(iterations - HISTORY_LEN as u32));
    assert!(duration.as_secs() < 5);
}

/// Benchmarks full tick planning and packet building for four caught-up clients
#[test]
fn benchmark_tick_planning() {
    let mut session = Session::new(&ServerConfig::default());
    for port in 0..4 {
        session.register_contact(addr(9000 + port));
    }

    let cells = GRID_SIZE * GRID_SIZE;
    let ticks = cells - 1;
    let mut delta_bytes = 0usize;
    let start = Instant::now();

    for tick in 0..ticks {
        session
            .game
            .apply_move((tick % 4) as PlayerId, tick / GRID_SIZE, tick % GRID_SIZE)
            .unwrap();

        let plan = session.plan_tick();
        let snapshot_id = plan.snapshot_id;
        for (to, packet) in plan.into_packets() {
            if tick > 0 {
                assert!(matches!(packet.payload, Payload::Delta { .. }));
                delta_bytes += packet.encode().unwrap().len();
            }
            session.clients.record_ack(to, snapshot_id);
        }
    }

    let duration = start.elapsed();
    println!(
        "Tick planning: {} ticks in {:?} ({:.2} μs/tick)",
        ticks,
        duration,
        duration.as_micros() as f64 / ticks as f64
    );

    // every steady-state delta carries exactly one change
    let single_change = Packet::new(
        Some(1),
        Payload::Delta {
            changes: vec![shared::Change::new(0, 0, 1)],
            game_ongoing: true,
        },
    )
    .encode()
    .unwrap()
    .len();
    let per_packet = delta_bytes as f64 / ((ticks - 1) * 4) as f64;
    assert_approx_eq!(per_packet, single_change as f64);
    assert!(duration.as_secs() < 5);
}

/// Compares encoded sizes of the two tick payloads
#[test]
fn benchmark_payload_sizes() {
    let grid = half_claimed(GRID_SIZE);
    let snapshot = Packet::new(
        Some(10),
        Payload::Snapshot {
            grid: grid.clone(),
            message: "Live Update".to_string(),
            game_ongoing: true,
        },
    )
    .encode()
    .unwrap();

    let mut next = grid.clone();
    next.set(0, 1, 2);
    let delta = Packet::new(
        Some(11),
        Payload::Delta {
            changes: diff(&grid, &next),
            game_ongoing: true,
        },
    )
    .encode()
    .unwrap();

    println!(
        "Snapshot: {} bytes, one-cell delta: {} bytes ({:.1}x smaller)",
        snapshot.len(),
        delta.len(),
        snapshot.len() as f64 / delta.len() as f64
    );
    assert!(delta.len() * 10 < snapshot.len());
}

/// The largest board the server accepts must fit one datagram either way
#[test]
fn benchmark_worst_case_fits_datagram() {
    let size = 100;
    let empty = Grid::new(size);
    let mut full = Grid::new(size);
    for row in 0..size {
        for col in 0..size {
            full.set(row, col, 254);
        }
    }

    let start = Instant::now();
    let changes = diff(&empty, &full);
    let duration = start.elapsed();
    assert_eq!(changes.len(), size * size);

    let delta = Packet::new(
        Some(u32::MAX),
        Payload::Delta {
            changes,
            game_ongoing: false,
        },
    )
    .encode()
    .unwrap();
    let snapshot = Packet::new(
        Some(u32::MAX),
        Payload::Snapshot {
            grid: full,
            message: "Player 254 WON!".to_string(),
            game_ongoing: false,
        },
    )
    .encode()
    .unwrap();

    println!(
        "Worst case: diff in {:?}, delta {} bytes, snapshot {} bytes",
        duration,
        delta.len(),
        snapshot.len()
    );
    assert!(delta.len() <= MAX_DATAGRAM_SIZE);
    assert!(snapshot.len() <= MAX_DATAGRAM_SIZE);
}
