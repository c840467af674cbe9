//! Integration tests for the networked game
//!
//! These run a real server on an ephemeral TCP port and talk to it the way
//! a client would.

use client::game::SharedGame;
use server::config::ServerConfig;
use server::game::SharedGameState;
use server::network::Server;
use shared::{Action, InitData, Message, MessageReader, MessageWriter, PlayerId, Vec2, MAX_HEALTH};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};

struct TestServer {
    addr: SocketAddr,
    state: SharedGameState,
}

async fn start_server(max_bots: usize, bot_spawn_delay: Duration) -> TestServer {
    let config = ServerConfig {
        addr: "127.0.0.1:0".to_string(),
        tick_rate: 60,
        max_bots,
        bot_spawn_delay,
    };
    let server = Server::bind(config).await.expect("failed to bind");
    let addr = server.local_addr().unwrap();
    let state = server.shared_state();
    tokio::spawn(server.run());

    TestServer { addr, state }
}

async fn start_quiet_server() -> TestServer {
    start_server(0, Duration::from_secs(3600)).await
}

struct TestClient {
    reader: MessageReader<OwnedReadHalf>,
    writer: MessageWriter<OwnedWriteHalf>,
}

impl TestClient {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.expect("failed to connect");
        let (reader, writer) = stream.into_split();
        Self {
            reader: MessageReader::new(reader),
            writer: MessageWriter::new(writer),
        }
    }

    async fn next(&mut self) -> Message {
        timeout(Duration::from_secs(3), self.reader.next_message())
            .await
            .expect("timed out")
            .expect("decode failed")
    }

    /// Completes the init/state handshake and returns the assigned id.
    async fn join(addr: SocketAddr) -> (Self, InitData) {
        let mut client = Self::connect(addr).await;
        let Message::Init(init) = client.next().await else {
            panic!("first message must be init");
        };
        let Message::State(world) = client.next().await else {
            panic!("second message must be state");
        };
        assert!(world.get(init.player_id).is_some());
        (client, init)
    }

    async fn send(&mut self, action: Action) {
        self.writer.send(&Message::Action(action)).await.unwrap();
    }
}

async fn wait_until<F>(state: &SharedGameState, mut check: F)
where
    F: FnMut(&server::game::GameState) -> bool,
{
    for _ in 0..400 {
        if check(&*state.lock().await) {
            return;
        }
        sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

/// CONNECTION LIFECYCLE TESTS
mod lifecycle_tests {
    use super::*;

    #[tokio::test]
    async fn handshake_is_init_then_state() {
        let server = start_quiet_server().await;
        let (_client, init) = TestClient::join(server.addr).await;

        assert!(init.server_mode);
        assert!(init.player_id > 0);
    }

    #[tokio::test]
    async fn player_ids_increase_with_each_connection() {
        let server = start_quiet_server().await;

        let mut last: PlayerId = 0;
        let mut clients = Vec::new();
        for _ in 0..4 {
            let (client, init) = TestClient::join(server.addr).await;
            assert!(init.player_id > last);
            last = init.player_id;
            clients.push(client);
        }
    }

    #[tokio::test]
    async fn disconnect_removes_player_and_targets() {
        let server = start_quiet_server().await;
        let (mut hunter, hunter_init) = TestClient::join(server.addr).await;
        let (prey, prey_init) = TestClient::join(server.addr).await;
        let (hunter_id, prey_id) = (hunter_init.player_id, prey_init.player_id);

        hunter
            .send(Action::Attack {
                target: Some(prey_id),
            })
            .await;
        wait_until(&server.state, |game| {
            game.world.get(hunter_id).and_then(|p| p.target) == Some(prey_id)
        })
        .await;

        drop(prey);

        wait_until(&server.state, |game| {
            !game.world.contains(prey_id)
                && !game.clients.contains(prey_id)
                && game.world.get(hunter_id).map(|p| p.target) == Some(None)
        })
        .await;
    }

    #[tokio::test]
    async fn many_concurrent_connections() {
        let server = start_quiet_server().await;

        let joins: Vec<_> = (0..16)
            .map(|_| tokio::spawn(TestClient::join(server.addr)))
            .collect();
        let mut clients = Vec::new();
        for join in joins {
            clients.push(join.await.unwrap());
        }

        let mut ids: Vec<_> = clients.iter().map(|(_, init)| init.player_id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 16);
        wait_until(&server.state, |game| game.clients.len() == 16).await;

        drop(clients);
        wait_until(&server.state, |game| game.world.is_empty() && game.clients.is_empty()).await;
    }
}

/// ACTION ROUTING TESTS
mod action_tests {
    use super::*;

    #[tokio::test]
    async fn move_action_sets_direction() {
        let server = start_quiet_server().await;
        let (mut client, init) = TestClient::join(server.addr).await;

        let direction = Vec2::new(0.0, 1.0);
        client.send(Action::Move { direction }).await;

        wait_until(&server.state, |game| {
            game.world.get(init.player_id).map(|p| p.moving_direction) == Some(direction)
        })
        .await;
    }

    #[tokio::test]
    async fn attack_on_unknown_player_stores_none() {
        let server = start_quiet_server().await;
        let (mut client, init) = TestClient::join(server.addr).await;
        let (_other, other_init) = TestClient::join(server.addr).await;

        client
            .send(Action::Attack {
                target: Some(other_init.player_id),
            })
            .await;
        wait_until(&server.state, |game| {
            game.world.get(init.player_id).and_then(|p| p.target) == Some(other_init.player_id)
        })
        .await;

        client.send(Action::Attack { target: Some(9_999) }).await;

        wait_until(&server.state, |game| {
            game.world.get(init.player_id).map(|p| p.target) == Some(None)
        })
        .await;
    }

    #[tokio::test]
    async fn malformed_action_keeps_connection_open() {
        let server = start_quiet_server().await;
        let (mut client, init) = TestClient::join(server.addr).await;

        client
            .writer
            .send_encoded(b"{\"message_type\":\"action\",\"data\":{\"action_type\":\"teleport\"}}\n")
            .await
            .unwrap();
        client
            .writer
            .send_encoded(b"{\"message_type\":\"emote\",\"data\":{}}\n")
            .await
            .unwrap();
        let direction = Vec2::new(-1.0, 0.0);
        client.send(Action::Move { direction }).await;

        wait_until(&server.state, |game| {
            game.world.get(init.player_id).map(|p| p.moving_direction) == Some(direction)
        })
        .await;
        assert!(server.state.lock().await.clients.contains(init.player_id));
    }

    #[tokio::test]
    async fn concurrent_actions_keep_world_consistent() {
        let server = start_server(3, Duration::from_millis(10)).await;
        wait_until(&server.state, |game| game.world.bot_count() == 3).await;

        let mut joined = Vec::new();
        for _ in 0..8 {
            joined.push(TestClient::join(server.addr).await);
        }
        let ids = server.state.lock().await.world.player_ids();
        assert_eq!(ids.len(), 11);

        let tasks: Vec<_> = joined
            .into_iter()
            .enumerate()
            .map(|(n, (mut client, init))| {
                let ids = ids.clone();
                tokio::spawn(async move {
                    for round in 0..25 {
                        let action = if (n + round) % 2 == 0 {
                            Action::Move {
                                direction: Vec2::from_angle((n * 7 + round) as f32),
                            }
                        } else {
                            let target = ids[(n + round) % ids.len()];
                            Action::Attack {
                                target: (target != init.player_id).then_some(target),
                            }
                        };
                        client.send(action).await;

                        let Message::State(world) = client.next().await else {
                            panic!("expected state");
                        };
                        let mut seen: Vec<PlayerId> = Vec::new();
                        for (id, player) in &world.players {
                            assert_eq!(*id, player.id);
                            assert!(player.position.in_field(), "{:?}", player.position);
                            assert!((0.0..=MAX_HEALTH).contains(&player.health));
                            if let Some(target) = player.target {
                                assert!(world.get(target).is_some());
                                assert_ne!(target, player.id);
                            }
                            seen.push(player.id);
                        }
                        seen.sort_unstable();
                        seen.dedup();
                        assert_eq!(seen.len(), world.len());
                        assert!(world.get(init.player_id).is_some());
                    }
                    client
                })
            })
            .collect();

        let mut clients = Vec::new();
        for task in tasks {
            clients.push(task.await.unwrap());
        }
        assert_eq!(server.state.lock().await.world.len(), 11);

        drop(clients);
        wait_until(&server.state, |game| {
            game.clients.is_empty() && game.world.len() == game.world.bot_count()
        })
        .await;
    }

    #[tokio::test]
    async fn garbage_closes_only_that_connection() {
        let server = start_quiet_server().await;
        let (mut bad, bad_init) = TestClient::join(server.addr).await;
        let (_good, good_init) = TestClient::join(server.addr).await;

        bad.writer.send_encoded(b"}}}{{{\n").await.unwrap();

        wait_until(&server.state, |game| {
            !game.world.contains(bad_init.player_id) && game.world.contains(good_init.player_id)
        })
        .await;
    }
}

/// SIMULATION OVER THE WIRE
mod broadcast_tests {
    use super::*;

    #[tokio::test]
    async fn snapshots_keep_arriving() {
        let server = start_quiet_server().await;
        let (mut client, init) = TestClient::join(server.addr).await;

        for _ in 0..5 {
            let Message::State(world) = client.next().await else {
                panic!("server only sends state after the handshake");
            };
            assert!(world.get(init.player_id).is_some());
        }
    }

    #[tokio::test]
    async fn movement_shows_up_in_snapshots() {
        let server = start_quiet_server().await;
        let (mut client, init) = TestClient::join(server.addr).await;
        let start = server
            .state
            .lock()
            .await
            .world
            .get(init.player_id)
            .unwrap()
            .position;

        // Head towards the far side of the field so clamping cannot hide it.
        let direction = if start.x < 400.0 {
            Vec2::new(1.0, 0.0)
        } else {
            Vec2::new(-1.0, 0.0)
        };
        client.send(Action::Move { direction }).await;

        let moved = timeout(Duration::from_secs(3), async {
            loop {
                if let Message::State(world) = client.next().await {
                    let now = world.get(init.player_id).unwrap().position;
                    if (now.x - start.x).abs() > 10.0 {
                        return now;
                    }
                }
            }
        })
        .await
        .expect("player never moved");
        assert_eq!(moved.y, start.y);
    }

    #[tokio::test]
    async fn attacks_lower_health() {
        let server = start_quiet_server().await;
        let (mut attacker, _) = TestClient::join(server.addr).await;
        let (_victim, victim_init) = TestClient::join(server.addr).await;
        let victim_id = victim_init.player_id;

        attacker
            .send(Action::Attack {
                target: Some(victim_id),
            })
            .await;

        let hurt = timeout(Duration::from_secs(4), async {
            loop {
                if let Message::State(world) = attacker.next().await {
                    if let Some(victim) = world.get(victim_id) {
                        if victim.health < MAX_HEALTH {
                            return victim.health;
                        }
                    }
                }
            }
        })
        .await
        .expect("no damage dealt");
        assert!(hurt > 0.0);
    }

    #[tokio::test]
    async fn bots_join_after_delay() {
        let server = start_server(3, Duration::from_millis(50)).await;
        let (mut client, _) = TestClient::join(server.addr).await;

        let bots = timeout(Duration::from_secs(3), async {
            loop {
                if let Message::State(world) = client.next().await {
                    if world.len() == 4 {
                        return world.len();
                    }
                }
            }
        })
        .await
        .expect("bots never appeared");
        assert_eq!(bots, 4);
        assert_eq!(server.state.lock().await.world.bot_count(), 3);
    }

    #[tokio::test]
    async fn client_receive_loop_follows_server() {
        let server = start_quiet_server().await;
        let mut connection = client::network::connect(&server.addr.to_string())
            .await
            .unwrap();
        let mut game = SharedGame::new();
        let view = game.clone();

        let _ = timeout(
            Duration::from_millis(300),
            client::network::receive_loop(&mut connection.reader, &mut game),
        )
        .await;

        let (player_id, states) = view
            .with(|game| (game.player_id, game.states_received))
            .unwrap();
        assert!(player_id.is_some());
        assert!(states > 1);
    }
}
