pub use sea_orm_migration::prelude::*;

mod m20260901_000001_initial;
mod m20260915_000001_unique_session_and_allocation;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260901_000001_initial::Migration),
            Box::new(m20260915_000001_unique_session_and_allocation::Migration),
        ]
    }
}
