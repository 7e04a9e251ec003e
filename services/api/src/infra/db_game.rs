use std::collections::HashMap;

use anyhow::Context as _;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, IntoActiveModel as _, ModelTrait as _, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
};
use uuid::Uuid;

use potluck_api_schema::{drinks, game_player_drinks, game_players, game_sessions, game_teams};
use potluck_domain::pagination::PageRequest;

use crate::domain::repository::GameRepository;
use crate::domain::types::{Drink, DrinkChange, GamePlayer, GameSession, GameTeam, PlayerDrink};
use crate::error::{ApiError, from_txn, on_unique_violation};

// ── Game repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbGameRepository {
    pub db: DatabaseConnection,
}

impl GameRepository for DbGameRepository {
    async fn list_sessions(&self, page: PageRequest) -> Result<Vec<GameSession>, ApiError> {
        let page = page.clamped();
        let models = game_sessions::Entity::find()
            .order_by_desc(game_sessions::Column::CreatedAt)
            .order_by_asc(game_sessions::Column::Id)
            .offset(page.skip)
            .limit(page.limit)
            .all(&self.db)
            .await
            .context("list game sessions")?;
        let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
        let mut teams = teams_by_session(&self.db, &ids).await?;
        let mut players = players_by_session(&self.db, &ids).await?;
        Ok(models
            .into_iter()
            .map(|m| {
                let teams = teams.remove(&m.id).unwrap_or_default();
                let players = players.remove(&m.id).unwrap_or_default();
                session_from_model(m, teams, players)
            })
            .collect())
    }

    async fn find_session(&self, id: Uuid) -> Result<Option<GameSession>, ApiError> {
        let Some(model) = game_sessions::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find game session")?
        else {
            return Ok(None);
        };
        let teams = teams_by_session(&self.db, &[id])
            .await?
            .remove(&id)
            .unwrap_or_default();
        let players = players_by_session(&self.db, &[id])
            .await?
            .remove(&id)
            .unwrap_or_default();
        Ok(Some(session_from_model(model, teams, players)))
    }

    async fn create_session(&self, session: &GameSession) -> Result<(), ApiError> {
        self.db
            .transaction::<_, (), ApiError>(|txn| {
                let session = session.clone();
                Box::pin(async move {
                    game_sessions::ActiveModel {
                        id: Set(session.id),
                        title: Set(session.title.clone()),
                        owner_id: Set(session.owner_id),
                        created_at: Set(session.created_at),
                    }
                    .insert(txn)
                    .await
                    .context("create game session")?;
                    for team in &session.teams {
                        team_active_model(team)
                            .insert(txn)
                            .await
                            .context("create game session team")?;
                    }
                    Ok(())
                })
            })
            .await
            .map_err(from_txn)
    }

    async fn delete_session(&self, id: Uuid) -> Result<bool, ApiError> {
        let result = game_sessions::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete game session")?;
        Ok(result.rows_affected > 0)
    }

    async fn find_team(&self, id: Uuid) -> Result<Option<GameTeam>, ApiError> {
        let model = game_teams::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find game team")?;
        Ok(model.map(team_from_model))
    }

    async fn create_team(&self, team: &GameTeam) -> Result<(), ApiError> {
        let session_exists = game_sessions::Entity::find_by_id(team.game_session_id)
            .one(&self.db)
            .await
            .context("check game session")?
            .is_some();
        if !session_exists {
            return Err(ApiError::GameSessionNotFound);
        }
        team_active_model(team)
            .insert(&self.db)
            .await
            .context("create game team")?;
        Ok(())
    }

    async fn delete_team(&self, id: Uuid) -> Result<bool, ApiError> {
        let result = game_teams::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete game team")?;
        Ok(result.rows_affected > 0)
    }

    async fn find_player(&self, id: Uuid) -> Result<Option<GamePlayer>, ApiError> {
        let Some(model) = game_players::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find game player")?
        else {
            return Ok(None);
        };
        let mut drinks = drinks_by_player(&self.db, &[id]).await?;
        let drinks = drinks.remove(&id).unwrap_or_default();
        Ok(Some(player_from_model(model, drinks)))
    }

    async fn add_player(&self, player: &GamePlayer) -> Result<(), ApiError> {
        let session_exists = game_sessions::Entity::find_by_id(player.game_session_id)
            .one(&self.db)
            .await
            .context("check game session")?
            .is_some();
        if !session_exists {
            return Err(ApiError::GameSessionNotFound);
        }
        if let Some(team_id) = player.team_id {
            game_teams::Entity::find_by_id(team_id)
                .one(&self.db)
                .await
                .context("check game team")?
                .filter(|t| t.game_session_id == player.game_session_id)
                .ok_or(ApiError::TeamNotFound)?;
        }
        game_players::ActiveModel {
            id: Set(player.id),
            game_session_id: Set(player.game_session_id),
            team_id: Set(player.team_id),
            name: Set(player.name.clone()),
            created_at: Set(player.created_at),
        }
        .insert(&self.db)
        .await
        .context("add game player")?;
        Ok(())
    }

    async fn delete_player(&self, id: Uuid) -> Result<bool, ApiError> {
        let result = game_players::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete game player")?;
        Ok(result.rows_affected > 0)
    }

    async fn list_drinks(&self) -> Result<Vec<Drink>, ApiError> {
        let models = drinks::Entity::find()
            .order_by_asc(drinks::Column::Name)
            .all(&self.db)
            .await
            .context("list drinks")?;
        Ok(models.into_iter().map(drink_from_model).collect())
    }

    async fn find_drink(&self, id: Uuid) -> Result<Option<Drink>, ApiError> {
        let model = drinks::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find drink")?;
        Ok(model.map(drink_from_model))
    }

    async fn create_drink(&self, drink: &Drink) -> Result<(), ApiError> {
        drinks::ActiveModel {
            id: Set(drink.id),
            name: Set(drink.name.clone()),
            description: Set(drink.description.clone()),
            created_at: Set(drink.created_at),
        }
        .insert(&self.db)
        .await
        .map_err(|e| on_unique_violation(e, ApiError::DrinkAlreadyExists, "create drink"))?;
        Ok(())
    }

    async fn set_player_drink(
        &self,
        player_id: Uuid,
        drink_id: Uuid,
        amount: i32,
    ) -> Result<DrinkChange, ApiError> {
        self.db
            .transaction::<_, DrinkChange, ApiError>(|txn| {
                Box::pin(async move {
                    game_players::Entity::find_by_id(player_id)
                        .lock_exclusive()
                        .one(txn)
                        .await
                        .context("lock game player")?
                        .ok_or(ApiError::PlayerNotFound)?;
                    drinks::Entity::find_by_id(drink_id)
                        .one(txn)
                        .await
                        .context("find drink for player")?
                        .ok_or(ApiError::DrinkNotFound)?;

                    let current = game_player_drinks::Entity::find_by_id((player_id, drink_id))
                        .one(txn)
                        .await
                        .context("find player drink")?;

                    let change = match current {
                        None if amount <= 0 => DrinkChange::Unchanged,
                        None => {
                            game_player_drinks::ActiveModel {
                                game_player_id: Set(player_id),
                                drink_id: Set(drink_id),
                                amount: Set(amount),
                            }
                            .insert(txn)
                            .await
                            .context("add player drink")?;
                            DrinkChange::Added
                        }
                        Some(link) if amount <= 0 => {
                            link.delete(txn).await.context("remove player drink")?;
                            DrinkChange::Removed
                        }
                        Some(link) if link.amount == amount => DrinkChange::Unchanged,
                        Some(link) => {
                            let mut am = link.into_active_model();
                            am.amount = Set(amount);
                            am.update(txn).await.context("update player drink")?;
                            DrinkChange::Updated
                        }
                    };
                    Ok(change)
                })
            })
            .await
            .map_err(from_txn)
    }
}

// ── Loading ──────────────────────────────────────────────────────────────────

async fn teams_by_session<C: ConnectionTrait>(
    conn: &C,
    session_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<GameTeam>>, ApiError> {
    if session_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let models = game_teams::Entity::find()
        .filter(game_teams::Column::GameSessionId.is_in(session_ids.iter().copied()))
        .order_by_asc(game_teams::Column::CreatedAt)
        .order_by_asc(game_teams::Column::Id)
        .all(conn)
        .await
        .context("list game teams")?;
    let mut out: HashMap<Uuid, Vec<GameTeam>> = HashMap::new();
    for model in models {
        out.entry(model.game_session_id)
            .or_default()
            .push(team_from_model(model));
    }
    Ok(out)
}

async fn players_by_session<C: ConnectionTrait>(
    conn: &C,
    session_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<GamePlayer>>, ApiError> {
    if session_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let models = game_players::Entity::find()
        .filter(game_players::Column::GameSessionId.is_in(session_ids.iter().copied()))
        .order_by_asc(game_players::Column::CreatedAt)
        .order_by_asc(game_players::Column::Id)
        .all(conn)
        .await
        .context("list game players")?;
    let player_ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
    let mut drinks = drinks_by_player(conn, &player_ids).await?;

    let mut out: HashMap<Uuid, Vec<GamePlayer>> = HashMap::new();
    for model in models {
        let player_drinks = drinks.remove(&model.id).unwrap_or_default();
        out.entry(model.game_session_id)
            .or_default()
            .push(player_from_model(model, player_drinks));
    }
    Ok(out)
}

/// Each player's drinks, sorted by drink name.
async fn drinks_by_player<C: ConnectionTrait>(
    conn: &C,
    player_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<PlayerDrink>>, ApiError> {
    if player_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = game_player_drinks::Entity::find()
        .filter(game_player_drinks::Column::GamePlayerId.is_in(player_ids.iter().copied()))
        .find_also_related(drinks::Entity)
        .order_by_asc(drinks::Column::Name)
        .all(conn)
        .await
        .context("list player drinks")?;

    let mut out: HashMap<Uuid, Vec<PlayerDrink>> = HashMap::new();
    for (link, drink) in rows {
        let Some(drink) = drink else { continue };
        out.entry(link.game_player_id).or_default().push(PlayerDrink {
            drink_id: link.drink_id,
            name: drink.name,
            amount: link.amount,
        });
    }
    Ok(out)
}

fn session_from_model(
    model: game_sessions::Model,
    teams: Vec<GameTeam>,
    players: Vec<GamePlayer>,
) -> GameSession {
    GameSession {
        id: model.id,
        title: model.title,
        owner_id: model.owner_id,
        teams,
        players,
        created_at: model.created_at,
    }
}

fn player_from_model(model: game_players::Model, drinks: Vec<PlayerDrink>) -> GamePlayer {
    GamePlayer {
        id: model.id,
        game_session_id: model.game_session_id,
        team_id: model.team_id,
        name: model.name,
        drinks,
        created_at: model.created_at,
    }
}

fn team_active_model(team: &GameTeam) -> game_teams::ActiveModel {
    game_teams::ActiveModel {
        id: Set(team.id),
        game_session_id: Set(team.game_session_id),
        name: Set(team.name.clone()),
        created_at: Set(team.created_at),
    }
}

fn team_from_model(model: game_teams::Model) -> GameTeam {
    GameTeam {
        id: model.id,
        game_session_id: model.game_session_id,
        name: model.name,
        created_at: model.created_at,
    }
}

fn drink_from_model(model: drinks::Model) -> Drink {
    Drink {
        id: model.id,
        name: model.name,
        description: model.description,
        created_at: model.created_at,
    }
}
