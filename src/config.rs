use anyhow::{bail, Context};
use std::env;

use crate::media::{CloudinaryConfig, SignatureAlgorithm};
use crate::plugins::auth::provider::AdminCredentials;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";

/// Process configuration, read once at startup after `.env` is loaded.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub environment: String,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub admin: AdminCredentials,
    /// Empty means any origin is accepted.
    pub cors_origins: Vec<String>,
    pub cloudinary: Option<CloudinaryConfig>,
    /// Public site origin, used for the sitemap link in `robots.txt`.
    pub frontend_url: String,
    /// `ads.txt` answers 404 without it.
    pub adsense_publisher_id: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = match env::var("PORT") {
            Ok(raw) => raw.parse().with_context(|| format!("PORT is not a valid port: {raw}"))?,
            Err(_) => DEFAULT_PORT,
        };

        let jwt_secret = non_empty("JWT_SECRET").context("JWT_SECRET must be set")?;

        let admin = AdminCredentials {
            id: non_empty("ADMIN_ID").unwrap_or_else(|| "admin_001".to_string()),
            name: non_empty("ADMIN_NAME").unwrap_or_else(|| "Admin".to_string()),
            email: non_empty("ADMIN_EMAIL"),
            password: non_empty("ADMIN_PASSWORD"),
        };

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cloudinary = match (
            non_empty("CLOUDINARY_CLOUD_NAME"),
            non_empty("CLOUDINARY_API_KEY"),
            non_empty("CLOUDINARY_API_SECRET"),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Some(CloudinaryConfig {
                cloud_name,
                api_key,
                api_secret,
                folder: non_empty("CLOUDINARY_FOLDER"),
                signature_algorithm: match non_empty("CLOUDINARY_SIGNATURE_ALGORITHM") {
                    Some(raw) => SignatureAlgorithm::parse(&raw)
                        .with_context(|| format!("CLOUDINARY_SIGNATURE_ALGORITHM must be sha1 or sha256, got {raw}"))?,
                    None => SignatureAlgorithm::default(),
                },
            }),
            (None, None, None) => None,
            _ => bail!("CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY and CLOUDINARY_API_SECRET must be set together"),
        };

        Ok(Self {
            port,
            environment: non_empty("APP_ENV").unwrap_or_else(|| "development".to_string()),
            database_url: non_empty("DATABASE_URL"),
            jwt_secret,
            admin,
            cors_origins,
            cloudinary,
            frontend_url: non_empty("FRONTEND_URL").unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string()),
            adsense_publisher_id: non_empty("ADSENSE_PUBLISHER_ID"),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            environment: "development".to_string(),
            database_url: None,
            jwt_secret: String::new(),
            admin: AdminCredentials::default(),
            cors_origins: Vec::new(),
            cloudinary: None,
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            adsense_publisher_id: None,
        }
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
