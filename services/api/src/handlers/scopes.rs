//! Which scope each HTTP operation requires.

use potluck_domain::scope::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateUser,
    UpdateUser,
    DeleteUser,
    ListRoles,
    GetRole,
    CreateRole,
    UpdateRole,
    DeleteRole,
    ListRoleTemplates,
    CreateRoleFromTemplate,
    ListAvailableScopes,
    AssignRole,
    RemoveRole,
    GrantScope,
    RevokeScope,
    GetUserPermissions,
    ListIngredients,
    GetIngredient,
    CreateIngredient,
    UpdateIngredient,
    DeleteIngredient,
    ListRecipes,
    GetRecipe,
    CreateRecipe,
    UpdateRecipe,
    DeleteRecipe,
    ListGameSessions,
    GetGameSession,
    CreateGameSession,
    DeleteGameSession,
    CreateTeam,
    DeleteTeam,
    AddPlayer,
    RemovePlayer,
    ListDrinks,
    CreateDrink,
    SetPlayerDrink,
}

impl Operation {
    pub fn scope(self) -> &'static str {
        match self {
            Self::CreateUser => USERS_CREATE,
            Self::UpdateUser => USERS_UPDATE,
            Self::DeleteUser => USERS_DELETE,
            Self::ListRoles
            | Self::GetRole
            | Self::ListRoleTemplates
            | Self::ListAvailableScopes => ROLES_READ,
            Self::CreateRole | Self::CreateRoleFromTemplate => ROLES_CREATE,
            Self::UpdateRole => ROLES_UPDATE,
            Self::DeleteRole => ROLES_DELETE,
            Self::AssignRole | Self::RemoveRole | Self::GrantScope | Self::RevokeScope => {
                USERS_UPDATE
            }
            Self::GetUserPermissions => USERS_READ,
            Self::ListIngredients | Self::GetIngredient => INGREDIENTS_READ,
            Self::CreateIngredient => INGREDIENTS_CREATE,
            Self::UpdateIngredient => INGREDIENTS_UPDATE,
            Self::DeleteIngredient => INGREDIENTS_DELETE,
            Self::ListRecipes | Self::GetRecipe => RECIPES_READ,
            Self::CreateRecipe => RECIPES_CREATE,
            Self::UpdateRecipe => RECIPES_UPDATE,
            Self::DeleteRecipe => RECIPES_DELETE,
            Self::ListGameSessions | Self::GetGameSession => GAMES_READ,
            Self::CreateGameSession => GAMES_CREATE,
            Self::DeleteGameSession => GAMES_DELETE,
            Self::CreateTeam => TEAMS_CREATE,
            Self::DeleteTeam => TEAMS_DELETE,
            Self::AddPlayer => PLAYERS_CREATE,
            Self::RemovePlayer => PLAYERS_DELETE,
            Self::SetPlayerDrink => PLAYERS_UPDATE,
            Self::ListDrinks => DRINKS_READ,
            Self::CreateDrink => DRINKS_CREATE,
        }
    }
}
