use async_trait::async_trait;

use super::models::Identity;

pub const ADMIN_ROLE: &str = "admin";

/// The single admin account, taken from configuration rather than storage.
#[derive(Clone, Debug)]
pub struct AdminCredentials {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Default for AdminCredentials {
    fn default() -> Self {
        Self { id: "admin_001".to_string(), name: "Admin".to_string(), email: None, password: None }
    }
}

/// Checks a credential pair and says who it belongs to.
#[async_trait]
pub trait AuthProvider: Send + Sync + 'static {
    async fn authenticate(&self, email: &str, password: &str) -> Option<Identity>;
}

pub struct StaticAdminProvider {
    credentials: AdminCredentials,
}

impl StaticAdminProvider {
    pub fn new(credentials: AdminCredentials) -> Self {
        if credentials.email.is_none() || credentials.password.is_none() {
            tracing::warn!("ADMIN_EMAIL or ADMIN_PASSWORD not set, every login will be rejected");
        }
        Self { credentials }
    }
}

#[async_trait]
impl AuthProvider for StaticAdminProvider {
    async fn authenticate(&self, email: &str, password: &str) -> Option<Identity> {
        let creds = &self.credentials;
        let (Some(admin_email), Some(admin_password)) = (creds.email.as_deref(), creds.password.as_deref()) else {
            return None;
        };
        if email != admin_email || password != admin_password {
            return None;
        }
        Some(Identity {
            id: creds.id.clone(),
            name: creds.name.clone(),
            email: admin_email.to_string(),
            role: ADMIN_ROLE.to_string(),
        })
    }
}
