//! Drink endpoints
//!
//! `GET /drinks` is public; every other route is guarded by a drink
//! permission through the [`Authorized`] extractor.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Json, Path, State,
    },
    response::IntoResponse,
    routing::{get, patch},
    Router,
};
use serde::Deserialize;
use tracing::debug;

use crate::auth::{DeleteDrinks, GetDrinkDetails, PatchDrinks, PostDrinks};
use crate::drinks::{DrinkUpdate, Ingredient, NewDrink};
use crate::server::{error::ApiError, middleware::Authorized, state::ServerState};

/// Create drinks router
pub fn create_router() -> Router<ServerState> {
    Router::new()
        .route("/drinks", get(list_drinks).post(create_drink))
        .route("/drinks-detail", get(drink_details))
        .route("/drinks/:id", patch(update_drink).delete(delete_drink))
}

/// A recipe may be posted as a single ingredient or a list
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecipeInput {
    One(Ingredient),
    Many(Vec<Ingredient>),
}

impl From<RecipeInput> for Vec<Ingredient> {
    fn from(input: RecipeInput) -> Self {
        match input {
            RecipeInput::One(ingredient) => vec![ingredient],
            RecipeInput::Many(ingredients) => ingredients,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateDrinkRequest {
    title: String,
    recipe: RecipeInput,
}

#[derive(Debug, Deserialize)]
struct UpdateDrinkRequest {
    title: Option<String>,
    recipe: Option<RecipeInput>,
}

/// List drinks in short form
async fn list_drinks(State(state): State<ServerState>) -> Result<impl IntoResponse, ApiError> {
    let drinks = state.drinks.list().await?;
    let short: Vec<_> = drinks.iter().map(|d| d.short()).collect();

    Ok(Json(serde_json::json!({
        "success": true,
        "drinks": short,
    })))
}

/// List drinks with full recipes
async fn drink_details(
    State(state): State<ServerState>,
    auth: Authorized<GetDrinkDetails>,
) -> Result<impl IntoResponse, ApiError> {
    debug!("drink details for {:?}", auth.claims.sub);
    let drinks = state.drinks.list().await?;
    let long: Vec<_> = drinks.iter().map(|d| d.long()).collect();

    Ok(Json(serde_json::json!({
        "success": true,
        "drinks": long,
    })))
}

/// Create a drink
async fn create_drink(
    State(state): State<ServerState>,
    auth: Authorized<PostDrinks>,
    body: Result<Json<CreateDrinkRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body?;
    let created = state
        .drinks
        .insert(NewDrink {
            title: request.title,
            recipe: request.recipe.into(),
        })
        .await?;
    debug!("drink {} created by {:?}", created.id, auth.claims.sub);

    Ok(Json(serde_json::json!({
        "success": true,
        "drinks": [created.long()],
    })))
}

/// Update a drink's title and/or recipe
async fn update_drink(
    State(state): State<ServerState>,
    auth: Authorized<PatchDrinks>,
    id: Result<Path<u64>, PathRejection>,
    body: Result<Json<UpdateDrinkRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    let Json(request) = body?;
    let updated = state
        .drinks
        .update(
            id,
            DrinkUpdate {
                title: request.title,
                recipe: request.recipe.map(Into::into),
            },
        )
        .await?;
    debug!("drink {} updated by {:?}", id, auth.claims.sub);

    Ok(Json(serde_json::json!({
        "success": true,
        "drinks": [updated.long()],
    })))
}

/// Delete a drink
async fn delete_drink(
    State(state): State<ServerState>,
    auth: Authorized<DeleteDrinks>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    state.drinks.delete(id).await?;
    debug!("drink {} deleted by {:?}", id, auth.claims.sub);

    Ok(Json(serde_json::json!({
        "success": true,
        "delete": id,
    })))
}
