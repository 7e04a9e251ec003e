use anyhow::Context as _;
use chrono::Utc;
use serde_json::json;
use tokio::sync::mpsc;
use uuid::Uuid;

use potluck_domain::pagination::PageRequest;

use crate::domain::permission::require_owner;
use crate::domain::repository::GameRepository;
use crate::domain::types::{Drink, DrinkChange, GamePlayer, GameSession, GameTeam, User};
use crate::error::ApiError;
use crate::realtime::{BroadcastMessage, Connection, ConnectionBroadcaster, MessageKind};

fn non_empty(field: &str, value: &str) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(value.to_owned())
}

/// Load the current session state and fan it out as an `update`.
async fn publish_snapshot<G: GameRepository>(
    games: &G,
    broadcaster: &ConnectionBroadcaster,
    session_id: Uuid,
) -> Result<(), ApiError> {
    let Some(session) = games.find_session(session_id).await? else {
        return Ok(());
    };
    let payload = serde_json::to_value(&session).context("serialize game session")?;
    broadcaster.schedule_broadcast(session_id, BroadcastMessage::new(MessageKind::Update, payload));
    Ok(())
}

async fn player_in_session<G: GameRepository>(
    games: &G,
    session_id: Uuid,
    player_id: Uuid,
) -> Result<GamePlayer, ApiError> {
    games
        .find_player(player_id)
        .await?
        .filter(|p| p.game_session_id == session_id)
        .ok_or(ApiError::PlayerNotFound)
}

// ── Sessions ─────────────────────────────────────────────────────────────────

pub struct CreateGameSessionUseCase<G: GameRepository> {
    pub games: G,
}

impl<G: GameRepository> CreateGameSessionUseCase<G> {
    /// `team_names` become the session's initial teams, in order.
    pub async fn execute(
        &self,
        owner_id: Uuid,
        title: &str,
        team_names: &[String],
    ) -> Result<GameSession, ApiError> {
        let id = Uuid::now_v7();
        let created_at = Utc::now();
        let teams = team_names
            .iter()
            .map(|name| {
                Ok(GameTeam {
                    id: Uuid::now_v7(),
                    game_session_id: id,
                    name: non_empty("team name", name)?,
                    created_at,
                })
            })
            .collect::<Result<Vec<_>, ApiError>>()?;
        let session = GameSession {
            id,
            title: non_empty("title", title)?,
            owner_id,
            teams,
            players: Vec::new(),
            created_at,
        };
        self.games.create_session(&session).await?;
        Ok(session)
    }
}

pub struct ListGameSessionsUseCase<G: GameRepository> {
    pub games: G,
}

impl<G: GameRepository> ListGameSessionsUseCase<G> {
    pub async fn execute(&self, page: PageRequest) -> Result<Vec<GameSession>, ApiError> {
        self.games.list_sessions(page.clamped()).await
    }
}

pub struct GetGameSessionUseCase<G: GameRepository> {
    pub games: G,
}

impl<G: GameRepository> GetGameSessionUseCase<G> {
    pub async fn execute(&self, session_id: Uuid) -> Result<GameSession, ApiError> {
        self.games
            .find_session(session_id)
            .await?
            .ok_or(ApiError::GameSessionNotFound)
    }
}

pub struct DeleteGameSessionUseCase<G: GameRepository> {
    pub games: G,
    pub broadcaster: ConnectionBroadcaster,
}

impl<G: GameRepository> DeleteGameSessionUseCase<G> {
    /// Only the owner (or a superuser) may delete a session.
    pub async fn execute(&self, user: &User, session_id: Uuid) -> Result<GameSession, ApiError> {
        let session = self
            .games
            .find_session(session_id)
            .await?
            .ok_or(ApiError::GameSessionNotFound)?;
        require_owner(user, session.owner_id)?;
        if !self.games.delete_session(session_id).await? {
            return Err(ApiError::GameSessionNotFound);
        }
        self.broadcaster.schedule_broadcast(
            session_id,
            BroadcastMessage::new(MessageKind::Update, json!({ "id": session_id, "deleted": true })),
        );
        tracing::info!(%session_id, user_id = %user.id, "game session deleted");
        Ok(session)
    }
}

// ── Teams ────────────────────────────────────────────────────────────────────

pub struct CreateTeamUseCase<G: GameRepository> {
    pub games: G,
    pub broadcaster: ConnectionBroadcaster,
}

impl<G: GameRepository> CreateTeamUseCase<G> {
    pub async fn execute(&self, session_id: Uuid, name: &str) -> Result<GameTeam, ApiError> {
        let team = GameTeam {
            id: Uuid::now_v7(),
            game_session_id: session_id,
            name: non_empty("name", name)?,
            created_at: Utc::now(),
        };
        self.games.create_team(&team).await?;
        publish_snapshot(&self.games, &self.broadcaster, session_id).await?;
        Ok(team)
    }
}

pub struct DeleteTeamUseCase<G: GameRepository> {
    pub games: G,
    pub broadcaster: ConnectionBroadcaster,
}

impl<G: GameRepository> DeleteTeamUseCase<G> {
    /// Members stay in the session without a team.
    pub async fn execute(&self, session_id: Uuid, team_id: Uuid) -> Result<GameTeam, ApiError> {
        let team = self
            .games
            .find_team(team_id)
            .await?
            .filter(|t| t.game_session_id == session_id)
            .ok_or(ApiError::TeamNotFound)?;
        if !self.games.delete_team(team_id).await? {
            return Err(ApiError::TeamNotFound);
        }
        publish_snapshot(&self.games, &self.broadcaster, session_id).await?;
        Ok(team)
    }
}

// ── Players ──────────────────────────────────────────────────────────────────

pub struct AddPlayerUseCase<G: GameRepository> {
    pub games: G,
    pub broadcaster: ConnectionBroadcaster,
}

impl<G: GameRepository> AddPlayerUseCase<G> {
    pub async fn execute(
        &self,
        session_id: Uuid,
        name: &str,
        team_id: Option<Uuid>,
    ) -> Result<GamePlayer, ApiError> {
        let player = GamePlayer {
            id: Uuid::now_v7(),
            game_session_id: session_id,
            team_id,
            name: non_empty("name", name)?,
            drinks: Vec::new(),
            created_at: Utc::now(),
        };
        self.games.add_player(&player).await?;
        publish_snapshot(&self.games, &self.broadcaster, session_id).await?;
        Ok(player)
    }
}

pub struct RemovePlayerUseCase<G: GameRepository> {
    pub games: G,
    pub broadcaster: ConnectionBroadcaster,
}

impl<G: GameRepository> RemovePlayerUseCase<G> {
    pub async fn execute(&self, session_id: Uuid, player_id: Uuid) -> Result<GamePlayer, ApiError> {
        let player = player_in_session(&self.games, session_id, player_id).await?;
        if !self.games.delete_player(player_id).await? {
            return Err(ApiError::PlayerNotFound);
        }
        publish_snapshot(&self.games, &self.broadcaster, session_id).await?;
        Ok(player)
    }
}

// ── Drinks ───────────────────────────────────────────────────────────────────

pub struct ListDrinksUseCase<G: GameRepository> {
    pub games: G,
}

impl<G: GameRepository> ListDrinksUseCase<G> {
    pub async fn execute(&self) -> Result<Vec<Drink>, ApiError> {
        self.games.list_drinks().await
    }
}

pub struct CreateDrinkUseCase<G: GameRepository> {
    pub games: G,
}

impl<G: GameRepository> CreateDrinkUseCase<G> {
    pub async fn execute(&self, name: &str, description: Option<String>) -> Result<Drink, ApiError> {
        let drink = Drink {
            id: Uuid::now_v7(),
            name: non_empty("name", name)?,
            description,
            created_at: Utc::now(),
        };
        self.games.create_drink(&drink).await?;
        Ok(drink)
    }
}

pub struct SetPlayerDrinkInput {
    pub session_id: Uuid,
    pub player_id: Uuid,
    pub drink_id: Uuid,
    /// `<= 0` removes the drink from the player.
    pub amount: i32,
}

pub struct SetPlayerDrinkUseCase<G: GameRepository> {
    pub games: G,
    pub broadcaster: ConnectionBroadcaster,
}

impl<G: GameRepository> SetPlayerDrinkUseCase<G> {
    pub async fn execute(&self, input: SetPlayerDrinkInput) -> Result<DrinkChange, ApiError> {
        player_in_session(&self.games, input.session_id, input.player_id).await?;
        let change = self
            .games
            .set_player_drink(input.player_id, input.drink_id, input.amount)
            .await?;
        if change == DrinkChange::Unchanged {
            return Ok(change);
        }
        if change == DrinkChange::Added {
            self.broadcaster.schedule_broadcast(
                input.session_id,
                BroadcastMessage::new(
                    MessageKind::DrinkAdded,
                    json!({
                        "player_id": input.player_id,
                        "drink_id": input.drink_id,
                        "amount": input.amount,
                    }),
                ),
            );
        }
        publish_snapshot(&self.games, &self.broadcaster, input.session_id).await?;
        Ok(change)
    }
}

// ── Subscribe ────────────────────────────────────────────────────────────────

/// A live feed of one session. Dropping `receiver` ends the subscription;
/// the broadcaster drops the connection on its next send.
pub struct Subscription {
    pub session_id: Uuid,
    pub connection_id: Uuid,
    pub receiver: mpsc::UnboundedReceiver<BroadcastMessage>,
}

/// Entry point for a push transport (WebSocket, SSE): attach one connection
/// to a session and forward `Subscription::receiver` to the client.
pub struct SubscribeGameSessionUseCase<G: GameRepository> {
    pub games: G,
    pub broadcaster: ConnectionBroadcaster,
}

impl<G: GameRepository> SubscribeGameSessionUseCase<G> {
    /// The snapshot is queued before the connection is registered, so it is
    /// always the first message on the receiver.
    pub async fn execute(&self, session_id: Uuid) -> Result<Subscription, ApiError> {
        let session = self
            .games
            .find_session(session_id)
            .await?
            .ok_or(ApiError::GameSessionNotFound)?;
        let payload = serde_json::to_value(&session).context("serialize game session")?;

        let (connection, receiver) = Connection::new();
        let connection_id = connection.id;
        connection.send(BroadcastMessage::new(MessageKind::Snapshot, payload));
        self.broadcaster.register(session_id, connection).await;

        Ok(Subscription {
            session_id,
            connection_id,
            receiver,
        })
    }
}
