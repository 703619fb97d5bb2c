use async_trait::async_trait;
use auditoria_core_db::repository::{LedgerStore, LedgerTx, StoreResult};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use super::ledger_tx::PgLedgerTx;

/// PostgreSQL-backed ledger store. One `LedgerTx` maps to one database
/// transaction; serialization of conflicting engine operations comes from
/// row-level locks on the touched entities.
#[derive(Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn begin(&self) -> StoreResult<Box<dyn LedgerTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgLedgerTx::new(tx)))
    }
}
