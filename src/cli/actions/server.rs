use crate::api;
use crate::auth::MemoryAccountStore;
use crate::cli::actions::Action;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            accounts,
            frontend_url,
            session_ttl,
        } => {
            let store = MemoryAccountStore::from_path(&accounts)
                .with_context(|| format!("failed to load accounts from {}", accounts.display()))?;

            info!("Loaded accounts from {}", accounts.display());

            let config =
                api::AuthConfig::new(frontend_url).with_session_ttl_seconds(session_ttl);

            api::new(port, Arc::new(store), config).await?;
        }
    }

    Ok(())
}
