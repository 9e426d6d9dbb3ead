use std::env;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use tracing::warn;
use uuid::Uuid;

/// Which slot store backs the running service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Process-local store. Data is lost on restart.
    Memory,
    /// Supabase (PostgREST + PL/pgSQL functions).
    Supabase,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" | "in_memory" => Ok(StorageBackend::Memory),
            "supabase" | "postgrest" => Ok(StorageBackend::Supabase),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Memory => write!(f, "memory"),
            StorageBackend::Supabase => write!(f, "supabase"),
        }
    }
}

/// Slot grid used when professionals publish whole blocks or fill a day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulingConfig {
    pub slot_minutes: u32,
    pub day_start: NaiveTime,
    pub day_end: NaiveTime,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            slot_minutes: 30,
            day_start: NaiveTime::from_hms_opt(6, 0, 0).unwrap_or(NaiveTime::MIN),
            day_end: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub supabase_jwt_secret: String,
    pub storage_backend: StorageBackend,
    pub server_port: u16,
    pub scheduling: SchedulingConfig,
    /// Professionals loaded into the in-memory store at startup.
    pub seed_professionals: Vec<(Uuid, Option<f64>)>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let supabase_url = env::var("SUPABASE_URL").unwrap_or_else(|_| {
            warn!("SUPABASE_URL not set, using empty value");
            String::new()
        });
        let supabase_service_key = env::var("SUPABASE_SERVICE_KEY").unwrap_or_else(|_| {
            warn!("SUPABASE_SERVICE_KEY not set, using empty value");
            String::new()
        });
        let supabase_jwt_secret = env::var("SUPABASE_JWT_SECRET").unwrap_or_else(|_| {
            warn!("SUPABASE_JWT_SECRET not set, using empty value");
            String::new()
        });

        let supabase_ready = !supabase_url.is_empty() && !supabase_service_key.is_empty();
        let default_backend = if supabase_ready {
            StorageBackend::Supabase
        } else {
            StorageBackend::Memory
        };

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                warn!("{}, falling back to {}", e, default_backend);
                default_backend
            }),
            Err(_) => default_backend,
        };

        let defaults = SchedulingConfig::default();
        let scheduling = SchedulingConfig {
            slot_minutes: env_or("SLOT_MINUTES", defaults.slot_minutes, |raw| {
                raw.parse::<u32>().ok().filter(|minutes| *minutes > 0)
            }),
            day_start: env_or("DAY_START", defaults.day_start, parse_clock),
            day_end: env_or("DAY_END", defaults.day_end, parse_clock),
        };

        let config = Self {
            supabase_url,
            supabase_service_key,
            supabase_jwt_secret,
            storage_backend,
            server_port: env_or("SERVER_PORT", 3000, |raw| raw.parse().ok()),
            scheduling,
            seed_professionals: env::var("SEED_PROFESSIONALS")
                .map(|raw| parse_seed(&raw))
                .unwrap_or_default(),
        };

        if config.supabase_jwt_secret.is_empty() {
            warn!("Application not fully configured - authenticated routes will reject every token");
        }
        if config.storage_backend == StorageBackend::Supabase && !config.is_supabase_configured() {
            warn!("Supabase storage selected but SUPABASE_URL / SUPABASE_SERVICE_KEY are missing");
        }

        config
    }

    pub fn is_supabase_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_service_key.is_empty()
    }
}

fn env_or<T, F>(key: &str, default: T, parse: F) -> T
where
    T: fmt::Debug,
    F: Fn(&str) -> Option<T>,
{
    match env::var(key) {
        Ok(raw) => parse(&raw).unwrap_or_else(|| {
            warn!("{} has invalid value '{}', using default {:?}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

fn parse_clock(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

/// Parses `uuid=fee,uuid,...`. An entry without `=fee` seeds a professional
/// with no fee configured.
fn parse_seed(raw: &str) -> Vec<(Uuid, Option<f64>)> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| {
            let (id, fee) = match entry.split_once('=') {
                Some((id, fee)) => (id, Some(fee)),
                None => (entry, None),
            };
            let id = match Uuid::parse_str(id.trim()) {
                Ok(id) => id,
                Err(_) => {
                    warn!("Ignoring SEED_PROFESSIONALS entry '{}'", entry);
                    return None;
                }
            };
            let fee = match fee.map(|f| f.trim().parse::<f64>()) {
                None => None,
                Some(Ok(fee)) => Some(fee),
                Some(Err(_)) => {
                    warn!("SEED_PROFESSIONALS entry '{}' has an invalid fee; seeding without one", entry);
                    None
                }
            };
            Some((id, fee))
        })
        .collect()
}
