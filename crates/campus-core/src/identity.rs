use anyhow::anyhow;
use tracing::debug;

use crate::config::Config;
use crate::model::OwnerId;

const OWNER_ENV_VAR: &str = "CAMPUS_USER";

/// Answers "who is signed in", or nobody.
pub trait IdentityProvider {
    fn current_owner(&self) -> Option<OwnerId>;

    fn require_owner(&self) -> anyhow::Result<OwnerId> {
        self.current_owner().ok_or_else(|| {
            anyhow!("not signed in: set {OWNER_ENV_VAR} or `owner = <id>` in your campusrc")
        })
    }
}

/// Resolves the owner from `CAMPUS_USER`, then the `owner` config key.
#[derive(Debug, Clone)]
pub struct ConfigIdentity {
    env_owner: Option<String>,
    cfg_owner: Option<String>,
}

impl ConfigIdentity {
    pub fn new(cfg: &Config) -> Self {
        Self {
            env_owner: std::env::var(OWNER_ENV_VAR).ok(),
            cfg_owner: cfg.get("owner"),
        }
    }

    pub fn from_parts(env_owner: Option<String>, cfg_owner: Option<String>) -> Self {
        Self { env_owner, cfg_owner }
    }
}

impl IdentityProvider for ConfigIdentity {
    fn current_owner(&self) -> Option<OwnerId> {
        let owner = [self.env_owner.as_deref(), self.cfg_owner.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|raw| !raw.is_empty())
            .map(OwnerId::new);
        debug!(owner = ?owner, "resolved current owner");
        owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_wins_over_config() {
        let identity = ConfigIdentity::from_parts(Some("env-user".to_string()), Some("cfg-user".to_string()));
        assert_eq!(identity.current_owner(), Some(OwnerId::new("env-user")));
    }

    #[test]
    fn blank_values_mean_unauthenticated() {
        let identity = ConfigIdentity::from_parts(Some("  ".to_string()), None);
        assert_eq!(identity.current_owner(), None);
        assert!(identity.require_owner().is_err());

        let identity = ConfigIdentity::from_parts(Some(String::new()), Some("cfg-user".to_string()));
        assert_eq!(identity.current_owner(), Some(OwnerId::new("cfg-user")));
    }
}
