use std::env;

/// Environment-driven process configuration, parsed once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mysql_host: String,
    pub mysql_user: String,
    pub mysql_password: String,
    pub mysql_db: String,
    pub bind_addr: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(AppConfig {
            mysql_host: env::var("MYSQL_HOST").map_err(|_| "MYSQL_HOST not set".to_string())?,
            mysql_user: env::var("MYSQL_USER").map_err(|_| "MYSQL_USER not set".to_string())?,
            mysql_password: env::var("MYSQL_PASSWORD").unwrap_or_default(),
            mysql_db: env::var("MYSQL_DB").map_err(|_| "MYSQL_DB not set".to_string())?,
            bind_addr: env::var("NORMFORM_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".to_string()),
        })
    }

    pub fn database_url(&self) -> String {
        format!(
            "mysql://{}:{}@{}/{}",
            self.mysql_user, self.mysql_password, self.mysql_host, self.mysql_db
        )
    }
}
