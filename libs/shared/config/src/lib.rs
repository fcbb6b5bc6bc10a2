use std::env;
use std::str::FromStr;
use tracing::warn;

/// Where durable clinic data lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Supabase,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "supabase" | "postgrest" => Ok(StoreBackend::Supabase),
            "memory" | "in-memory" => Ok(StoreBackend::Memory),
            other => Err(format!("Unknown store backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub store_backend: StoreBackend,
    pub redis_url: Option<String>,
    pub session_ttl_seconds: u64,
    pub slot_stride_minutes: u32,
    pub port: u16,
}

impl AppConfig {
    pub const DEFAULT_SESSION_TTL_SECONDS: u64 = 24 * 60 * 60;
    pub const DEFAULT_SLOT_STRIDE_MINUTES: u32 = 60;
    pub const DEFAULT_PORT: u16 = 3000;

    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            store_backend: parse_or_default("STORE_BACKEND", StoreBackend::Supabase),
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
            session_ttl_seconds: parse_or_default(
                "SESSION_TTL_SECONDS",
                Self::DEFAULT_SESSION_TTL_SECONDS,
            ),
            slot_stride_minutes: parse_or_default(
                "SLOT_STRIDE_MINUTES",
                Self::DEFAULT_SLOT_STRIDE_MINUTES,
            ),
            port: parse_or_default("PORT", Self::DEFAULT_PORT),
        };

        if config.store_backend == StoreBackend::Supabase && !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        if config.slot_stride_minutes == 0 {
            warn!("SLOT_STRIDE_MINUTES must be positive, falling back to default");
            return Self {
                slot_stride_minutes: Self::DEFAULT_SLOT_STRIDE_MINUTES,
                ..config
            };
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }

    pub fn uses_redis_sessions(&self) -> bool {
        self.redis_url.is_some()
    }
}

fn parse_or_default<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has invalid value {:?}, using default {:?}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
