use std::env;

#[derive(Clone, Default)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl CloudinaryConfig {
    pub fn is_configured(&self) -> bool {
        !self.cloud_name.is_empty() && !self.api_key.is_empty() && !self.api_secret.is_empty()
    }
}

// Secrets stay out of the startup log line
impl std::fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub mongo_url: String,
    pub mongo_db: String,
    pub cloudinary: CloudinaryConfig,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub admin_usernames: Vec<String>,
    pub max_file_size: usize,
    pub request_timeout_seconds: u64,
    pub bcrypt_cost: u32,
}

pub const DEFAULT_JWT_SECRET: &str = "dev-only-insecure-secret";

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            mongo_url: "mongodb://localhost:27017".to_string(),
            mongo_db: "blog".to_string(),
            cloudinary: CloudinaryConfig::default(),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            jwt_expiry_hours: 24,
            admin_usernames: Vec::new(),
            max_file_size: 10 * 1024 * 1024, // 10MB
            request_timeout_seconds: 30,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("mongo_db", &self.mongo_db)
            .field("cloudinary", &self.cloudinary)
            .field("jwt_expiry_hours", &self.jwt_expiry_hours)
            .field("admin_usernames", &self.admin_usernames)
            .field("max_file_size", &self.max_file_size)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = env::var("HOST") {
            config.host = host;
        }

        if let Ok(port) = env::var("PORT") {
            if let Ok(port_num) = port.parse::<u16>() {
                config.port = port_num;
            }
        }

        if let Ok(url) = env::var("MONGO_URL") {
            config.mongo_url = url;
        }

        if let Ok(db) = env::var("MONGO_DB") {
            config.mongo_db = db;
        }

        if let Ok(name) = env::var("CLOUDINARY_CLOUD_NAME") {
            config.cloudinary.cloud_name = name;
        }

        if let Ok(key) = env::var("CLOUDINARY_API_KEY") {
            config.cloudinary.api_key = key;
        }

        if let Ok(secret) = env::var("CLOUDINARY_API_SECRET") {
            config.cloudinary.api_secret = secret;
        }

        if let Ok(secret) = env::var("JWT_SECRET") {
            if !secret.is_empty() {
                config.jwt_secret = secret;
            }
        }

        if let Ok(hours) = env::var("JWT_EXPIRY_HOURS") {
            if let Ok(hours_num) = hours.parse::<i64>() {
                if hours_num > 0 {
                    config.jwt_expiry_hours = hours_num;
                }
            }
        }

        if let Ok(admins) = env::var("ADMIN_USERNAMES") {
            config.admin_usernames = parse_list(&admins);
        }

        if let Ok(max_size) = env::var("MAX_FILE_SIZE") {
            if let Ok(size) = max_size.parse::<usize>() {
                config.max_file_size = size;
            }
        }

        if let Ok(timeout) = env::var("REQUEST_TIMEOUT_SECONDS") {
            if let Ok(timeout_num) = timeout.parse::<u64>() {
                config.request_timeout_seconds = timeout_num;
            }
        }

        if let Ok(cost) = env::var("BCRYPT_COST") {
            if let Ok(cost_num) = cost.parse::<u32>() {
                // bcrypt accepts 4..=31
                config.bcrypt_cost = cost_num.clamp(4, 31);
            }
        }

        config
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_admin_username(&self, username: &str) -> bool {
        self.admin_usernames.iter().any(|name| name == username)
    }

    pub fn uses_default_jwt_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
