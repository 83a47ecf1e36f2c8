use std::env;

/// Runtime configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub mongodb_uri: String,
    pub api_secret: String,
    pub bind_addr: String,
    pub allowed_origin: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            mongodb_uri: env::var("MONGODB_URI")
                .expect("You need to add the MONGODB_URI to the env"),
            api_secret: env::var("API_SECRET")
                .expect("You need to add the API_SECRET to the env"),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            allowed_origin: env::var("ALLOWED_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
        }
    }
}
