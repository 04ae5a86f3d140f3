use std::sync::Arc;

use tracing::{info, warn};

use crate::config::AppConfig;
use crate::db;
use crate::meals::repo::{MealRepo, PgMealRepo};
use crate::memory::MemoryDb;
use crate::pantry::repo::{PantryRepo, PgPantryRepo};
use crate::shopping::repo::{PgShoppingRepo, ShoppingRepo};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub meals: Arc<dyn MealRepo>,
    pub pantry: Arc<dyn PantryRepo>,
    pub shopping: Arc<dyn ShoppingRepo>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let Some(url) = config.database_url.clone() else {
            warn!("DATABASE_URL not set; using in-memory store");
            return Ok(Self::in_memory(config, MemoryDb::new()));
        };

        let pool = db::connect(&config, &url).await?;
        db::migrate(&pool).await;
        info!("connected to postgres");

        Ok(Self {
            config,
            meals: Arc::new(PgMealRepo::new(pool.clone())),
            pantry: Arc::new(PgPantryRepo::new(pool.clone())),
            shopping: Arc::new(PgShoppingRepo::new(pool)),
        })
    }

    pub fn in_memory(config: Arc<AppConfig>, mem: MemoryDb) -> Self {
        Self {
            config,
            meals: Arc::new(mem.clone()) as Arc<dyn MealRepo>,
            pantry: Arc::new(mem.clone()) as Arc<dyn PantryRepo>,
            shopping: Arc::new(mem) as Arc<dyn ShoppingRepo>,
        }
    }

    pub fn fake() -> Self {
        Self::in_memory(Arc::new(AppConfig::in_memory()), MemoryDb::new())
    }
}
