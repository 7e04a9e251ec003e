use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use potluck_domain::pagination::PageRequest;

use crate::domain::types::{Drink, DrinkChange, GamePlayer, GameSession, GameTeam};
use crate::error::ApiError;
use crate::handlers::auth::CurrentUser;
use crate::handlers::scopes::Operation;
use crate::state::AppState;
use crate::usecase::game::{
    AddPlayerUseCase, CreateDrinkUseCase, CreateGameSessionUseCase, CreateTeamUseCase,
    DeleteGameSessionUseCase, DeleteTeamUseCase, GetGameSessionUseCase, ListDrinksUseCase,
    ListGameSessionsUseCase, RemovePlayerUseCase, SetPlayerDrinkInput, SetPlayerDrinkUseCase,
};

// ── Sessions ─────────────────────────────────────────────────────────────────

pub async fn list_sessions(
    current: CurrentUser,
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Vec<GameSession>>, ApiError> {
    current.require(Operation::ListGameSessions)?;
    let usecase = ListGameSessionsUseCase {
        games: state.game_repo(),
    };
    Ok(Json(usecase.execute(page).await?))
}

pub async fn get_session(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<GameSession>, ApiError> {
    current.require(Operation::GetGameSession)?;
    let usecase = GetGameSessionUseCase {
        games: state.game_repo(),
    };
    Ok(Json(usecase.execute(session_id).await?))
}

#[derive(Deserialize)]
pub struct CreateSessionRequest {
    pub title: String,
    /// Names of the teams to create with the session.
    #[serde(default)]
    pub teams: Vec<String>,
}

pub async fn create_session(
    current: CurrentUser,
    State(state): State<AppState>,
    Json(body): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<GameSession>), ApiError> {
    current.require(Operation::CreateGameSession)?;
    let usecase = CreateGameSessionUseCase {
        games: state.game_repo(),
    };
    let session = usecase
        .execute(current.0.id, &body.title, &body.teams)
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn delete_session(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<GameSession>, ApiError> {
    current.require(Operation::DeleteGameSession)?;
    let usecase = DeleteGameSessionUseCase {
        games: state.game_repo(),
        broadcaster: state.broadcaster.clone(),
    };
    Ok(Json(usecase.execute(&current.0, session_id).await?))
}

// ── Teams ────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateTeamRequest {
    pub name: String,
}

pub async fn create_team(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(body): Json<CreateTeamRequest>,
) -> Result<(StatusCode, Json<GameTeam>), ApiError> {
    current.require(Operation::CreateTeam)?;
    let usecase = CreateTeamUseCase {
        games: state.game_repo(),
        broadcaster: state.broadcaster.clone(),
    };
    let team = usecase.execute(session_id, &body.name).await?;
    Ok((StatusCode::CREATED, Json(team)))
}

pub async fn delete_team(
    current: CurrentUser,
    State(state): State<AppState>,
    Path((session_id, team_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<GameTeam>, ApiError> {
    current.require(Operation::DeleteTeam)?;
    let usecase = DeleteTeamUseCase {
        games: state.game_repo(),
        broadcaster: state.broadcaster.clone(),
    };
    Ok(Json(usecase.execute(session_id, team_id).await?))
}

// ── Players ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct AddPlayerRequest {
    pub name: String,
    pub team_id: Option<Uuid>,
}

pub async fn add_player(
    current: CurrentUser,
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(body): Json<AddPlayerRequest>,
) -> Result<(StatusCode, Json<GamePlayer>), ApiError> {
    current.require(Operation::AddPlayer)?;
    let usecase = AddPlayerUseCase {
        games: state.game_repo(),
        broadcaster: state.broadcaster.clone(),
    };
    let player = usecase
        .execute(session_id, &body.name, body.team_id)
        .await?;
    Ok((StatusCode::CREATED, Json(player)))
}

pub async fn remove_player(
    current: CurrentUser,
    State(state): State<AppState>,
    Path((session_id, player_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<GamePlayer>, ApiError> {
    current.require(Operation::RemovePlayer)?;
    let usecase = RemovePlayerUseCase {
        games: state.game_repo(),
        broadcaster: state.broadcaster.clone(),
    };
    Ok(Json(usecase.execute(session_id, player_id).await?))
}

#[derive(Deserialize)]
pub struct SetPlayerDrinkRequest {
    pub amount: i32,
}

#[derive(Serialize)]
pub struct SetPlayerDrinkResponse {
    pub change: &'static str,
}

pub async fn set_player_drink(
    current: CurrentUser,
    State(state): State<AppState>,
    Path((session_id, player_id, drink_id)): Path<(Uuid, Uuid, Uuid)>,
    Json(body): Json<SetPlayerDrinkRequest>,
) -> Result<Json<SetPlayerDrinkResponse>, ApiError> {
    current.require(Operation::SetPlayerDrink)?;
    let usecase = SetPlayerDrinkUseCase {
        games: state.game_repo(),
        broadcaster: state.broadcaster.clone(),
    };
    let change = usecase
        .execute(SetPlayerDrinkInput {
            session_id,
            player_id,
            drink_id,
            amount: body.amount,
        })
        .await?;
    let change = match change {
        DrinkChange::Added => "added",
        DrinkChange::Updated => "updated",
        DrinkChange::Removed => "removed",
        DrinkChange::Unchanged => "unchanged",
    };
    Ok(Json(SetPlayerDrinkResponse { change }))
}

// ── Drinks ───────────────────────────────────────────────────────────────────

pub async fn list_drinks(
    current: CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Drink>>, ApiError> {
    current.require(Operation::ListDrinks)?;
    let usecase = ListDrinksUseCase {
        games: state.game_repo(),
    };
    Ok(Json(usecase.execute().await?))
}

#[derive(Deserialize)]
pub struct CreateDrinkRequest {
    pub name: String,
    pub description: Option<String>,
}

pub async fn create_drink(
    current: CurrentUser,
    State(state): State<AppState>,
    Json(body): Json<CreateDrinkRequest>,
) -> Result<(StatusCode, Json<Drink>), ApiError> {
    current.require(Operation::CreateDrink)?;
    let usecase = CreateDrinkUseCase {
        games: state.game_repo(),
    };
    let drink = usecase.execute(&body.name, body.description).await?;
    Ok((StatusCode::CREATED, Json(drink)))
}
