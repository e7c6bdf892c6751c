// ─── Credentials ───
// The installer never authenticates on its own: a provider hands over an
// opaque token plus the player identity, which launch passes through.

use async_trait::async_trait;
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::error::{LauncherError, LauncherResult};

const DEFAULT_USERNAME: &str = "Player";
const OFFLINE_ACCESS_TOKEN: &str = "offline_access_token";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessCredentials {
    pub username: String,
    pub uuid: String,
    pub access_token: String,
    pub user_type: String,
}

#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn credentials(&self) -> LauncherResult<AccessCredentials>;
}

/// Offline play: the UUID is derived from the name alone, so the same name
/// always maps to the same player.
pub struct OfflineCredentials {
    username: String,
}

impl OfflineCredentials {
    pub fn new(username: &str) -> Self {
        let username = username.trim();
        Self {
            username: if username.is_empty() {
                DEFAULT_USERNAME.to_string()
            } else {
                username.to_string()
            },
        }
    }
}

#[async_trait]
impl CredentialProvider for OfflineCredentials {
    async fn credentials(&self) -> LauncherResult<AccessCredentials> {
        Ok(AccessCredentials {
            username: self.username.clone(),
            uuid: offline_uuid(&self.username).simple().to_string(),
            access_token: OFFLINE_ACCESS_TOKEN.into(),
            user_type: "legacy".into(),
        })
    }
}

/// A token obtained elsewhere (e.g. a Microsoft sign-in), used as given.
pub struct StaticCredentials {
    credentials: AccessCredentials,
}

impl StaticCredentials {
    pub fn new(username: &str, uuid: &str, access_token: &str) -> LauncherResult<Self> {
        if username.trim().is_empty() || access_token.trim().is_empty() {
            return Err(LauncherError::Config(
                "username and access token are both required".into(),
            ));
        }
        let uuid = Uuid::parse_str(uuid.trim())
            .map_err(|e| LauncherError::Config(format!("invalid uuid {uuid:?}: {e}")))?;

        Ok(Self {
            credentials: AccessCredentials {
                username: username.trim().to_string(),
                uuid: uuid.simple().to_string(),
                access_token: access_token.trim().to_string(),
                user_type: "msa".into(),
            },
        })
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn credentials(&self) -> LauncherResult<AccessCredentials> {
        Ok(self.credentials.clone())
    }
}

/// Name-based (version 3) UUID of `OfflinePlayer:<name>`, as the game
/// server computes it for offline-mode players.
pub fn offline_uuid(username: &str) -> Uuid {
    let digest = Md5::digest(format!("OfflinePlayer:{username}").as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest);
    bytes[6] = (bytes[6] & 0x0f) | 0x30;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;
    Uuid::from_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_uuid_is_stable_version_three() {
        let a = offline_uuid("Steve");
        assert_eq!(a, offline_uuid("Steve"));
        assert_ne!(a, offline_uuid("Alex"));
        assert_eq!(a.get_version_num(), 3);
        assert_eq!(a.get_variant(), uuid::Variant::RFC4122);
    }

    #[tokio::test]
    async fn offline_provider_defaults_blank_names() {
        let creds = OfflineCredentials::new("  ").credentials().await.unwrap();
        assert_eq!(creds.username, "Player");
        assert_eq!(creds.uuid, offline_uuid("Player").simple().to_string());
        assert_eq!(creds.user_type, "legacy");
    }

    #[tokio::test]
    async fn static_credentials_validate_their_input() {
        assert!(StaticCredentials::new("Steve", "not-a-uuid", "token").is_err());
        assert!(StaticCredentials::new("Steve", "069a79f444e94726a5befca90e38aaf5", " ").is_err());

        let creds = StaticCredentials::new("Steve", "069a79f4-44e9-4726-a5be-fca90e38aaf5", "token")
            .unwrap()
            .credentials()
            .await
            .unwrap();
        assert_eq!(creds.uuid, "069a79f444e94726a5befca90e38aaf5");
        assert_eq!(creds.user_type, "msa");
    }
}
