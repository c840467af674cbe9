//! Connection to the server: dialing, the receive loop that feeds a
//! [`WorldConsumer`], and the loop that forwards local actions.

use log::{debug, info, warn};
use shared::{Action, CodecError, Message, MessageReader, MessageWriter, WorldConsumer};
use std::error::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

pub type ClientResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

pub struct Connection {
    pub reader: MessageReader<OwnedReadHalf>,
    pub writer: MessageWriter<OwnedWriteHalf>,
}

pub async fn connect(addr: &str) -> ClientResult<Connection> {
    info!("Connecting to {}", addr);
    let stream = TcpStream::connect(addr).await?;
    stream.set_nodelay(true)?;
    let (reader, writer) = stream.into_split();

    Ok(Connection {
        reader: MessageReader::new(reader),
        writer: MessageWriter::new(writer),
    })
}

async fn expect_message<R>(reader: &mut MessageReader<R>, kind: &str) -> ClientResult<Message>
where
    R: AsyncRead + Unpin,
{
    let message = reader.next_message().await?;
    if message.kind() != kind {
        return Err(format!("expected {} message, got {}", kind, message.kind()).into());
    }
    Ok(message)
}

/// Reads the `init` and first `state` the server sends on connect, then
/// hands every following snapshot to `consumer` until the server hangs up.
pub async fn receive_loop<R, C>(reader: &mut MessageReader<R>, consumer: &mut C) -> ClientResult<()>
where
    R: AsyncRead + Unpin,
    C: WorldConsumer,
{
    if let Message::Init(init) = expect_message(reader, "init").await? {
        consumer.on_init(init);
    }
    if let Message::State(state) = expect_message(reader, "state").await? {
        consumer.on_state(state);
    }

    loop {
        match reader.next_message().await {
            Ok(Message::State(state)) => consumer.on_state(state),
            Ok(other) => warn!("Ignoring unexpected {} message", other.kind()),
            Err(CodecError::Closed) => {
                info!("Server closed the connection");
                return Ok(());
            }
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => warn!("Ignoring malformed message: {}", e),
        }
    }
}

/// Forwards queued actions until the queue closes or a write fails.
pub async fn send_loop<W>(
    mut writer: MessageWriter<W>,
    mut actions: mpsc::UnboundedReceiver<Action>,
) -> ClientResult<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(action) = actions.recv().await {
        debug!("Sending {:?}", action);
        writer.send(&Message::Action(action)).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::ClientGame;
    use shared::{encode_message, InitData, Player, PlayerClass, Vec2, WorldState};
    use tokio_test::io::Builder;

    fn record(message: &Message) -> Vec<u8> {
        encode_message(message).unwrap()
    }

    fn init(player_id: u32) -> Message {
        Message::Init(InitData {
            player_id,
            server_mode: true,
        })
    }

    #[tokio::test]
    async fn test_receive_loop_mirrors_states() {
        let stream = Builder::new()
            .read(&record(&init(3)))
            .read(&record(&Message::State(WorldState::new())))
            .read(&record(&Message::State(WorldState::new())))
            .build();
        let mut reader = MessageReader::new(stream);
        let mut game = ClientGame::new();

        receive_loop(&mut reader, &mut game).await.unwrap();

        assert_eq!(game.player_id, Some(3));
        assert_eq!(game.states_received, 2);
    }

    fn populated(health: f32) -> Message {
        let mut world = WorldState::new();
        let mut me = Player::new(3, PlayerClass::Mage, Vec2::new(100.0, 120.0), 0);
        me.health = health;
        world.players.insert(3, me);
        world
            .players
            .insert(4, Player::new(4, PlayerClass::Warrior, Vec2::new(400.0, 300.0), 0));
        Message::State(world)
    }

    #[tokio::test]
    async fn test_receive_loop_mirrors_populated_states() {
        let stream = Builder::new()
            .read(&record(&init(3)))
            .read(&record(&populated(100.0)))
            .read(&record(&populated(55.0)))
            .build();
        let mut reader = MessageReader::new(stream);
        let mut game = ClientGame::new();

        receive_loop(&mut reader, &mut game).await.unwrap();

        assert_eq!(game.states_received, 2);
        assert_eq!(game.world.len(), 2);
        assert_eq!(game.local_player().map(|p| p.health), Some(55.0));
    }

    #[tokio::test]
    async fn test_state_before_init_aborts() {
        let stream = Builder::new()
            .read(&record(&Message::State(WorldState::new())))
            .build();
        let mut reader = MessageReader::new(stream);
        let mut game = ClientGame::new();

        assert!(receive_loop(&mut reader, &mut game).await.is_err());
        assert_eq!(game.player_id, None);
    }

    #[tokio::test]
    async fn test_missing_first_state_aborts() {
        let stream = Builder::new().read(&record(&init(1))).read(&record(&init(2))).build();
        let mut reader = MessageReader::new(stream);
        let mut game = ClientGame::new();

        assert!(receive_loop(&mut reader, &mut game).await.is_err());
        assert_eq!(game.states_received, 0);
    }

    #[tokio::test]
    async fn test_unknown_message_is_skipped() {
        let stream = Builder::new()
            .read(&record(&init(1)))
            .read(&record(&Message::State(WorldState::new())))
            .read(b"{\"message_type\":\"chat\",\"data\":{}}\n")
            .read(&record(&Message::State(WorldState::new())))
            .build();
        let mut reader = MessageReader::new(stream);
        let mut game = ClientGame::new();

        receive_loop(&mut reader, &mut game).await.unwrap();
        assert_eq!(game.states_received, 2);
    }

    #[tokio::test]
    async fn test_send_loop_writes_actions() {
        let action = Action::Move {
            direction: Vec2::new(1.0, 0.0),
        };
        let stream = Builder::new().write(&record(&Message::Action(action))).build();
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(action).unwrap();
        drop(tx);

        send_loop(MessageWriter::new(stream), rx).await.unwrap();
    }
}
