use std::sync::Arc;

use thiserror::Error;

use adminpanel_auth::{AuthError, PanelUser};

use crate::StoreError;
use crate::store::UserStore;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Created,
    AlreadyPresent,
}

/// Inserts the default panel account.
pub struct Seeder<U: PanelUser> {
    users: Arc<dyn UserStore<U>>,
}

impl<U: PanelUser> Seeder<U> {
    pub fn new(users: Arc<dyn UserStore<U>>) -> Self {
        Self { users }
    }

    /// Create the seeded user unless a live user already owns its email.
    pub async fn run(&self) -> Result<SeedOutcome, SeedError> {
        tracing::info!("started the seeder");
        let user = U::make_seeded_user()?;

        if self.users.find_by_email(user.email()).await?.is_some() {
            tracing::info!(email = user.email(), "seeded user already present");
            return Ok(SeedOutcome::AlreadyPresent);
        }

        self.users.save(&user).await?;
        tracing::info!(email = user.email(), "finished the seeder");
        Ok(SeedOutcome::Created)
    }
}
