//! Dispatch of inbound datagrams.
//!
//! Moves go to the game authority and get a lightweight INFO reply to the
//! mover only; the grid itself reaches the mover with the next broadcast
//! tick. ACKs go to the client directory. Anything that fails to decode is
//! logged and dropped.

use crate::game::{GamePhase, MoveRejection, ACCEPTED_MESSAGE};
use crate::session::{Outbound, Session};
use log::{debug, info, warn};
use shared::{Packet, Payload};
use std::net::SocketAddr;

/// Routes one datagram from `addr` and returns the replies it produced.
pub fn route_datagram(session: &mut Session, bytes: &[u8], addr: SocketAddr) -> Vec<Outbound> {
    // any datagram counts as contact while the lobby is open
    if session.phase() == GamePhase::Lobby {
        return session.register_contact(addr);
    }

    let packet = match Packet::decode(bytes) {
        Ok(packet) => packet,
        Err(e) => {
            warn!("Discarding datagram from {}: {}", addr, e);
            return Vec::new();
        }
    };

    let Some(seat) = session.clients.find_client_by_addr(addr) else {
        debug!(
            "Ignoring {} from unregistered address {}",
            packet.msg_type(),
            addr
        );
        return Vec::new();
    };

    match packet.payload {
        Payload::Event {
            row,
            col,
            player_id,
        } => {
            // a seat may only claim cells for itself
            let outcome = if player_id == seat {
                session
                    .game
                    .apply_move(player_id, usize::from(row), usize::from(col))
            } else {
                Err(MoveRejection::UnknownPlayer)
            };
            let message = match outcome {
                Ok(()) => {
                    debug!("Player {} claimed ({}, {})", player_id, row, col);
                    if session.game.is_finished() {
                        if let Some(winner) = session.game.winner_message() {
                            info!("GAME OVER. {}", winner);
                        }
                    }
                    ACCEPTED_MESSAGE.to_string()
                }
                Err(rejection) => {
                    debug!(
                        "Rejected move ({}, {}) from player {}: {}",
                        row, col, player_id, rejection
                    );
                    rejection.to_string()
                }
            };
            let reply = Packet::new(
                None,
                Payload::Info {
                    message,
                    player_id,
                    game_ongoing: !session.game.is_finished(),
                },
            );
            vec![(addr, reply)]
        }

        Payload::Ack => {
            match packet.snapshot_id {
                Some(id) => {
                    session.clients.record_ack(addr, id);
                }
                None => debug!("ACK without snapshot id from {}", addr),
            }
            Vec::new()
        }

        // the client may have missed its seat assignment
        Payload::Hello => session.lobby_status_for(addr).into_iter().collect(),

        other => {
            warn!("Unexpected {} packet from {}", other.msg_type(), addr);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use shared::{MsgType, PlayerId, PROTOCOL_VERSION};

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    fn started_session() -> Session {
        let config = ServerConfig {
            grid_size: 20,
            max_players: 2,
            ..ServerConfig::default()
        };
        let mut session = Session::new(&config);
        route_datagram(&mut session, b"Hello", addr(7000));
        route_datagram(&mut session, b"Hello", addr(7001));
        assert_eq!(session.phase(), GamePhase::Playing);
        session
    }

    fn event(row: u16, col: u16, player_id: PlayerId) -> Vec<u8> {
        Packet::new(
            None,
            Payload::Event {
                row,
                col,
                player_id,
            },
        )
        .encode()
        .unwrap()
    }

    fn info_message(out: &[Outbound]) -> &str {
        assert_eq!(out.len(), 1);
        match &out[0].1.payload {
            Payload::Info { message, .. } => message,
            _ => panic!("expected INFO reply"),
        }
    }

    #[test]
    fn test_lobby_registers_raw_datagrams() {
        let config = ServerConfig {
            max_players: 2,
            ..ServerConfig::default()
        };
        let mut session = Session::new(&config);
        let out = route_datagram(&mut session, &[0xde, 0xad], addr(7000));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].1.msg_type(), MsgType::Lobby);
        assert_eq!(session.clients.len(), 1);
    }

    #[test]
    fn test_event_accepted_replies_info_only_to_mover() {
        let mut session = started_session();
        let out = route_datagram(&mut session, &event(3, 4, 1), addr(7001));

        assert_eq!(out[0].0, addr(7001));
        assert_eq!(out[0].1.snapshot_id, None);
        assert_eq!(info_message(&out), "Nice move!");
        assert_eq!(session.game.grid().get(3, 4), Some(2));
    }

    #[test]
    fn test_event_race_one_winner() {
        let mut session = started_session();
        let first = route_datagram(&mut session, &event(0, 0, 1), addr(7001));
        let second = route_datagram(&mut session, &event(0, 0, 0), addr(7000));

        assert_eq!(info_message(&first), "Nice move!");
        assert_eq!(info_message(&second), "Cell already taken!");
        assert_eq!(session.game.grid().get(0, 0), Some(2));
        assert_eq!(session.game.scores(), &[0, 1]);
    }

    #[test]
    fn test_event_out_of_bounds() {
        let mut session = started_session();
        let out = route_datagram(&mut session, &event(20, 0, 0), addr(7000));
        assert_eq!(info_message(&out), "Cell out of bounds!");
        assert_eq!(session.game.grid().claimed_count(), 0);
    }

    #[test]
    fn test_ack_updates_directory() {
        let mut session = started_session();
        let ack = |id| Packet::ack(id).encode().unwrap();

        assert!(route_datagram(&mut session, &ack(4), addr(7000)).is_empty());
        assert_eq!(session.clients.last_acked(addr(7000)), Some(4));

        route_datagram(&mut session, &ack(2), addr(7000));
        assert_eq!(session.clients.last_acked(addr(7000)), Some(4));
    }

    #[test]
    fn test_malformed_datagrams_are_dropped() {
        let mut session = started_session();
        assert!(route_datagram(&mut session, b"1,2,0", addr(7000)).is_empty());
        assert!(route_datagram(&mut session, &[], addr(7000)).is_empty());

        let mut wrong_version = Packet::ack(1);
        wrong_version.version = PROTOCOL_VERSION + 1;
        let bytes = bincode::serialize(&wrong_version).unwrap();
        assert!(route_datagram(&mut session, &bytes, addr(7000)).is_empty());
        assert_eq!(session.clients.last_acked(addr(7000)), None);

        // still serving afterwards
        let out = route_datagram(&mut session, &event(1, 1, 0), addr(7000));
        assert_eq!(info_message(&out), "Nice move!");
    }

    #[test]
    fn test_unregistered_sender_is_ignored() {
        let mut session = started_session();
        assert!(route_datagram(&mut session, &event(1, 1, 0), addr(7999)).is_empty());
        assert_eq!(session.game.grid().claimed_count(), 0);
    }

    #[test]
    fn test_hello_after_start_resends_seat() {
        let mut session = started_session();
        let hello = Packet::new(None, Payload::Hello).encode().unwrap();
        let out = route_datagram(&mut session, &hello, addr(7001));
        assert_eq!(out.len(), 1);
        match &out[0].1.payload {
            Payload::Lobby {
                game_ready,
                player_id,
                ..
            } => {
                assert!(*game_ready);
                assert_eq!(*player_id, 1);
            }
            _ => panic!("expected lobby packet"),
        }
    }

    #[test]
    fn test_event_for_another_seat_is_rejected() {
        let mut session = started_session();
        let out = route_datagram(&mut session, &event(0, 0, 1), addr(7000));

        assert_eq!(info_message(&out), "Unknown player!");
        assert_eq!(session.game.grid().get(0, 0), Some(0));
        assert_eq!(session.game.scores(), &[0, 0]);
    }

    #[test]
    fn test_winning_move_reports_game_over() {
        let config = ServerConfig {
            grid_size: 1,
            max_players: 1,
            ..ServerConfig::default()
        };
        let mut session = Session::new(&config);
        route_datagram(&mut session, b"hi", addr(7000));

        let out = route_datagram(&mut session, &event(0, 0, 0), addr(7000));
        match &out[0].1.payload {
            Payload::Info { game_ongoing, .. } => assert!(!game_ongoing),
            _ => panic!("expected INFO reply"),
        }
        assert!(session.game.is_finished());
    }
}
