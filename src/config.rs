use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub stripe: StripeConfig,
    #[serde(default)]
    pub brevo: BrevoConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub http: HttpClientConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub expires_in: i64, // seconds
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeConfig {
    pub secret_key: String,
    #[serde(default)]
    pub publishable_key: String,
    pub webhook_secret: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_success_url")]
    pub success_url: String,
    #[serde(default = "default_cancel_url")]
    pub cancel_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrevoConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub sender_name: String,
    pub sender_email: String,
}

impl Default for BrevoConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.brevo.com/v3".to_string(),
            sender_name: "FREAK".to_string(),
            sender_email: "no-reply@freak.local".to_string(),
        }
    }
}

/// 启动时确保存在的管理员账号（两者都配置时才生效）
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AdminConfig {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpClientConfig {
    /// 外部服务 (Stripe / Brevo) 调用超时
    pub timeout_secs: u64,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_success_url() -> String {
    "http://localhost:3000/success.html".to_string()
}

fn default_cancel_url() -> String {
    "http://localhost:3000/cancel.html".to_string()
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 尝试读取配置文件，如果不存在则完全依赖环境变量
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => {
                toml::from_str(&config_str).map_err(|e| format!("Failed to parse config file: {e}"))?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Self::from_env()?,
            Err(e) => {
                return Err(format!("Cannot read config file {config_path}: {e}").into());
            }
        };

        // 环境变量覆盖（即便文件存在时也覆盖）
        config.apply_env_overrides();

        Ok(config)
    }

    fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        // 无配置文件时数据库 URL 可以省略，默认本地文件
        let brevo_defaults = BrevoConfig::default();
        Ok(Config {
            server: ServerConfig {
                host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: get_env_parse("PORT", 3000u16),
            },
            database: DatabaseConfig {
                url: get_env("DATABASE_URL")
                    .unwrap_or_else(|| "sqlite://data.sqlite?mode=rwc".to_string()),
                max_connections: get_env_parse("DB_MAX_CONNECTIONS", 5u32),
            },
            jwt: JwtConfig {
                secret: get_env("JWT_SECRET").ok_or("JWT_SECRET is required")?,
                expires_in: get_env_parse("JWT_EXPIRES_IN", 86_400i64),
            },
            stripe: StripeConfig {
                secret_key: get_env("STRIPE_SECRET_KEY").unwrap_or_default(),
                publishable_key: get_env("STRIPE_PUBLISHABLE_KEY").unwrap_or_default(),
                webhook_secret: get_env("STRIPE_WEBHOOK_SECRET").unwrap_or_default(),
                currency: get_env("STRIPE_CURRENCY").unwrap_or_else(default_currency),
                success_url: get_env("STRIPE_SUCCESS_URL").unwrap_or_else(default_success_url),
                cancel_url: get_env("STRIPE_CANCEL_URL").unwrap_or_else(default_cancel_url),
            },
            brevo: BrevoConfig {
                api_key: get_env("BREVO_API_KEY"),
                base_url: get_env("BREVO_BASE_URL").unwrap_or(brevo_defaults.base_url),
                sender_name: get_env("BREVO_SENDER_NAME").unwrap_or(brevo_defaults.sender_name),
                sender_email: get_env("BREVO_SENDER_EMAIL").unwrap_or(brevo_defaults.sender_email),
            },
            admin: AdminConfig {
                email: get_env("ADMIN_EMAIL"),
                password: get_env("ADMIN_PASSWORD"),
            },
            http: HttpClientConfig {
                timeout_secs: get_env_parse("HTTP_TIMEOUT_SECS", 10u64),
            },
        })
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("PORT")
            && let Ok(p) = v.parse()
        {
            self.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            self.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            self.jwt.expires_in = n;
        }
        if let Ok(v) = env::var("STRIPE_SECRET_KEY") {
            self.stripe.secret_key = v;
        }
        if let Ok(v) = env::var("STRIPE_PUBLISHABLE_KEY") {
            self.stripe.publishable_key = v;
        }
        if let Ok(v) = env::var("STRIPE_WEBHOOK_SECRET") {
            self.stripe.webhook_secret = v;
        }
        if let Ok(v) = env::var("STRIPE_CURRENCY") {
            self.stripe.currency = v;
        }
        if let Ok(v) = env::var("STRIPE_SUCCESS_URL") {
            self.stripe.success_url = v;
        }
        if let Ok(v) = env::var("STRIPE_CANCEL_URL") {
            self.stripe.cancel_url = v;
        }
        if let Ok(v) = env::var("BREVO_API_KEY") {
            self.brevo.api_key = Some(v);
        }
        if let Ok(v) = env::var("BREVO_BASE_URL") {
            self.brevo.base_url = v;
        }
        if let Ok(v) = env::var("BREVO_SENDER_NAME") {
            self.brevo.sender_name = v;
        }
        if let Ok(v) = env::var("BREVO_SENDER_EMAIL") {
            self.brevo.sender_email = v;
        }
        if let Ok(v) = env::var("ADMIN_EMAIL") {
            self.admin.email = Some(v);
        }
        if let Ok(v) = env::var("ADMIN_PASSWORD") {
            self.admin.password = Some(v);
        }
        if let Ok(v) = env::var("HTTP_TIMEOUT_SECS")
            && let Ok(n) = v.parse()
        {
            self.http.timeout_secs = n;
        }
    }
}

fn get_env(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
