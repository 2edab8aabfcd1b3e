//! Drink records and the store the HTTP handlers read and write.
//!
//! The store is the record-keeping collaborator behind the guarded
//! endpoints; the in-memory implementation is what the server runs with.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::error;

/// One ingredient of a recipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub color: String,
    pub parts: u32,
}

/// Ingredient without its name, for the public drink listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortIngredient {
    pub color: String,
    pub parts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drink {
    pub id: u64,
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

/// Public representation: colors and proportions only
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortDrink {
    pub id: u64,
    pub title: String,
    pub recipe: Vec<ShortIngredient>,
}

impl Drink {
    pub fn short(&self) -> ShortDrink {
        ShortDrink {
            id: self.id,
            title: self.title.clone(),
            recipe: self
                .recipe
                .iter()
                .map(|i| ShortIngredient {
                    color: i.color.clone(),
                    parts: i.parts,
                })
                .collect(),
        }
    }

    /// Full representation including ingredient names
    pub fn long(&self) -> &Self {
        self
    }
}

/// Fields for a new drink
#[derive(Debug, Clone)]
pub struct NewDrink {
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

/// Partial update; `None` leaves the field unchanged
#[derive(Debug, Clone, Default)]
pub struct DrinkUpdate {
    pub title: Option<String>,
    pub recipe: Option<Vec<Ingredient>>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Drink {0} not found")]
    NotFound(u64),

    #[error("A drink titled '{0}' already exists")]
    DuplicateTitle(String),

    #[error("Invalid drink: {0}")]
    Invalid(String),
}

/// Record storage for drinks
#[async_trait]
pub trait DrinkStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Drink>, StoreError>;

    async fn insert(&self, drink: NewDrink) -> Result<Drink, StoreError>;

    async fn update(&self, id: u64, update: DrinkUpdate) -> Result<Drink, StoreError>;

    async fn delete(&self, id: u64) -> Result<(), StoreError>;
}

fn validate(title: Option<&str>, recipe: Option<&[Ingredient]>) -> Result<(), StoreError> {
    if title.is_some_and(|t| t.trim().is_empty()) {
        return Err(StoreError::Invalid("title must not be empty".to_owned()));
    }
    if recipe.is_some_and(|r| r.is_empty()) {
        return Err(StoreError::Invalid("recipe must not be empty".to_owned()));
    }
    Ok(())
}

#[derive(Default)]
struct Inner {
    drinks: BTreeMap<u64, Drink>,
    next_id: u64,
}

/// Drink store held in process memory
#[derive(Default)]
pub struct InMemoryDrinkStore {
    inner: RwLock<Inner>,
}

impl InMemoryDrinkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with a single water drink
    pub async fn seeded() -> Self {
        let store = Self::new();
        let seeded = store
            .insert(NewDrink {
                title: "water".to_owned(),
                recipe: vec![Ingredient {
                    name: "water".to_owned(),
                    color: "blue".to_owned(),
                    parts: 1,
                }],
            })
            .await;
        if let Err(e) = seeded {
            error!("Failed to seed drink store: {}", e);
        }
        store
    }
}

#[async_trait]
impl DrinkStore for InMemoryDrinkStore {
    async fn list(&self) -> Result<Vec<Drink>, StoreError> {
        Ok(self.inner.read().await.drinks.values().cloned().collect())
    }

    async fn insert(&self, drink: NewDrink) -> Result<Drink, StoreError> {
        validate(Some(drink.title.as_str()), Some(drink.recipe.as_slice()))?;

        let mut inner = self.inner.write().await;
        if inner.drinks.values().any(|d| d.title == drink.title) {
            return Err(StoreError::DuplicateTitle(drink.title));
        }

        inner.next_id += 1;
        let created = Drink {
            id: inner.next_id,
            title: drink.title,
            recipe: drink.recipe,
        };
        inner.drinks.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, id: u64, update: DrinkUpdate) -> Result<Drink, StoreError> {
        validate(update.title.as_deref(), update.recipe.as_deref())?;

        let mut inner = self.inner.write().await;
        if let Some(title) = update.title.as_deref() {
            if inner.drinks.values().any(|d| d.title == title && d.id != id) {
                return Err(StoreError::DuplicateTitle(title.to_owned()));
            }
        }

        let drink = inner.drinks.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if let Some(title) = update.title {
            drink.title = title;
        }
        if let Some(recipe) = update.recipe {
            drink.recipe = recipe;
        }
        Ok(drink.clone())
    }

    async fn delete(&self, id: u64) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .drinks
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }
}
