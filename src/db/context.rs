//! Database context: a pool handle plus per-entity operation groups.

use sqlx::PgPool;

use crate::db::alerts::AlertOps;
use crate::db::jobs::JobOps;
use crate::db::observations::ObservationOps;
use crate::db::targets::TargetOps;

#[derive(Clone)]
pub struct DbContext {
    pool: PgPool,
}

impl DbContext {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn targets(&self) -> TargetOps<'_> {
        TargetOps::new(self)
    }

    pub fn jobs(&self) -> JobOps<'_> {
        JobOps::new(self)
    }

    pub fn observations(&self) -> ObservationOps<'_> {
        ObservationOps::new(self)
    }

    pub fn alerts(&self) -> AlertOps<'_> {
        AlertOps::new(self)
    }
}
