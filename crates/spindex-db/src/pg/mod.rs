//! PostgreSQL repository implementations

mod company;
mod person;
mod subscription;
mod template;
mod university;

pub use company::PgCompanyRepository;
pub use person::PgPersonRepository;
pub use subscription::PgSubscriptionRepository;
pub use template::PgTemplateRepository;
pub use university::PgUniversityRepository;

use crate::DbPool;

/// All repositories bundled together
#[derive(Clone)]
pub struct Repositories {
    pub subscriptions: PgSubscriptionRepository,
    pub universities: PgUniversityRepository,
    pub companies: PgCompanyRepository,
    pub people: PgPersonRepository,
    pub templates: PgTemplateRepository,
}

impl Repositories {
    /// Create all repositories from a database pool
    pub fn new(pool: DbPool) -> Self {
        Self {
            subscriptions: PgSubscriptionRepository::new(pool.clone()),
            universities: PgUniversityRepository::new(pool.clone()),
            companies: PgCompanyRepository::new(pool.clone()),
            people: PgPersonRepository::new(pool.clone()),
            templates: PgTemplateRepository::new(pool),
        }
    }
}
