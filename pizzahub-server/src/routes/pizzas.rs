//! Menu endpoints: public reads and admin management

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use pizzahub_core::catalog::normalize_toppings;
use pizzahub_core::{Category, Price, SizePrices};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{parse_id, ValidJson};
use crate::email::EmailSender;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{
    CatalogStore, NewPizza, OrderStore, Pizza, PizzaChanges, PizzaId, UserStore,
};

const PIZZA_NOT_FOUND: &str = "Pizza not found";

/// Public view of a menu item with its display price
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: PizzaId,
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    /// Medium price, or the base price when there is no medium
    pub price: Price,
    pub category: Category,
    pub popular: bool,
    pub sizes: SizePrices,
    pub toppings: Vec<String>,
}

impl From<Pizza> for MenuItem {
    fn from(pizza: Pizza) -> Self {
        Self {
            price: pizza.display_price(),
            id: pizza.id,
            name: pizza.name,
            description: pizza.description,
            image: pizza.image,
            category: pizza.category,
            popular: pizza.popular,
            sizes: pizza.sizes,
            toppings: pizza.toppings,
        }
    }
}

/// Admin view of a menu item, including stock and timestamps
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PizzaDetails {
    #[serde(flatten)]
    pub item: MenuItem,
    pub base_price: Price,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Pizza> for PizzaDetails {
    fn from(pizza: Pizza) -> Self {
        let (base_price, available) = (pizza.base_price, pizza.available);
        let (created_at, updated_at) = (pizza.created_at, pizza.updated_at);
        Self {
            item: MenuItem::from(pizza),
            base_price,
            available,
            created_at,
            updated_at,
        }
    }
}

#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePizzaRequest {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub base_price: Option<Price>,
    #[serde(default)]
    pub sizes: Option<SizePrices>,
    #[serde(default)]
    pub toppings: Option<Vec<String>>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub popular: Option<bool>,
    #[serde(default)]
    pub available: Option<bool>,
}

/// Partial update. An explicit `"image": null` clears the image.
#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePizzaRequest {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub image: Option<Option<String>>,
    #[serde(default)]
    pub base_price: Option<Price>,
    #[serde(default)]
    pub sizes: Option<SizePrices>,
    #[serde(default)]
    pub toppings: Option<Vec<String>>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub popular: Option<bool>,
    #[serde(default)]
    pub available: Option<bool>,
}

/// Distinguish a missing field (`None`) from an explicit null (`Some(None)`)
fn explicit_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl From<UpdatePizzaRequest> for PizzaChanges {
    fn from(req: UpdatePizzaRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            image: req.image.map(|image| image.filter(|s| !s.is_empty())),
            base_price: req.base_price,
            sizes: req.sizes,
            toppings: req.toppings.map(normalize_toppings),
            category: req.category,
            popular: req.popular,
            available: req.available,
        }
    }
}

#[derive(Serialize)]
pub struct DeletedResponse {
    pub message: &'static str,
}

/// GET /api/pizzas
pub async fn list_menu<U, C, O, E>(
    State(state): State<Arc<AppState<U, C, O, E>>>,
) -> Result<Json<Vec<MenuItem>>, ApiError>
where
    U: UserStore,
    C: CatalogStore,
    O: OrderStore,
    E: EmailSender,
{
    let pizzas = state.catalog_store.list_pizzas(true)?;
    Ok(Json(pizzas.into_iter().map(MenuItem::from).collect()))
}

/// GET /api/pizzas/:id
pub async fn get_pizza<U, C, O, E>(
    State(state): State<Arc<AppState<U, C, O, E>>>,
    Path(id): Path<String>,
) -> Result<Json<MenuItem>, ApiError>
where
    U: UserStore,
    C: CatalogStore,
    O: OrderStore,
    E: EmailSender,
{
    let pizza_id: PizzaId = parse_id(&id, PIZZA_NOT_FOUND)?;
    let pizza = state
        .catalog_store
        .get_pizza(pizza_id)?
        .ok_or(ApiError::NotFound(PIZZA_NOT_FOUND))?;

    Ok(Json(MenuItem::from(pizza)))
}

/// GET /api/admin/pizzas
pub async fn list_all_pizzas<U, C, O, E>(
    State(state): State<Arc<AppState<U, C, O, E>>>,
) -> Result<Json<Vec<PizzaDetails>>, ApiError>
where
    U: UserStore,
    C: CatalogStore,
    O: OrderStore,
    E: EmailSender,
{
    let pizzas = state.catalog_store.list_pizzas(false)?;
    Ok(Json(pizzas.into_iter().map(PizzaDetails::from).collect()))
}

/// POST /api/admin/pizzas
pub async fn create_pizza<U, C, O, E>(
    State(state): State<Arc<AppState<U, C, O, E>>>,
    ValidJson(req): ValidJson<CreatePizzaRequest>,
) -> Result<Json<PizzaDetails>, ApiError>
where
    U: UserStore,
    C: CatalogStore,
    O: OrderStore,
    E: EmailSender,
{
    let pizza = state.catalog_store.create_pizza(
        NewPizza {
            name: req.name,
            description: req.description.unwrap_or_default(),
            image: req.image.filter(|s| !s.is_empty()),
            base_price: req.base_price.unwrap_or_default(),
            sizes: req.sizes.unwrap_or_default(),
            toppings: normalize_toppings(req.toppings.unwrap_or_default()),
            category: req.category.unwrap_or_default(),
            popular: req.popular.unwrap_or(false),
            available: req.available.unwrap_or(true),
        }
        .with_complete_sizes(),
    )?;

    tracing::info!(pizza_id = %pizza.id, name = %pizza.name, "Pizza created");

    Ok(Json(PizzaDetails::from(pizza)))
}

/// PUT /api/admin/pizzas/:id
pub async fn update_pizza<U, C, O, E>(
    State(state): State<Arc<AppState<U, C, O, E>>>,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<UpdatePizzaRequest>,
) -> Result<Json<PizzaDetails>, ApiError>
where
    U: UserStore,
    C: CatalogStore,
    O: OrderStore,
    E: EmailSender,
{
    let pizza_id: PizzaId = parse_id(&id, PIZZA_NOT_FOUND)?;
    let pizza = state
        .catalog_store
        .update_pizza(pizza_id, req.into())?
        .ok_or(ApiError::NotFound(PIZZA_NOT_FOUND))?;

    tracing::info!(pizza_id = %pizza.id, "Pizza updated");

    Ok(Json(PizzaDetails::from(pizza)))
}

/// DELETE /api/admin/pizzas/:id
pub async fn delete_pizza<U, C, O, E>(
    State(state): State<Arc<AppState<U, C, O, E>>>,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError>
where
    U: UserStore,
    C: CatalogStore,
    O: OrderStore,
    E: EmailSender,
{
    let pizza_id: PizzaId = parse_id(&id, PIZZA_NOT_FOUND)?;

    if !state.catalog_store.delete_pizza(pizza_id)? {
        return Err(ApiError::NotFound(PIZZA_NOT_FOUND));
    }

    tracing::info!(pizza_id = %pizza_id, "Pizza deleted");

    Ok(Json(DeletedResponse { message: "Deleted" }))
}
