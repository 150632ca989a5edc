use anyhow::{bail, Context, Result};
use chrono::FixedOffset;

use crate::store::sheets::DEFAULT_API_BASE;

/// Which `TableStore` implementation backs the service.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    /// In-process tables, optionally seeded from a JSON file.
    Memory { seed_path: Option<String> },
    /// Google Sheets v4 over HTTPS.
    Sheets {
        api_base: String,
        spreadsheet_id: String,
        access_token: String,
    },
}

/// Table names and the fixed time zone shared by every reader and writer.
#[derive(Debug, Clone)]
pub struct WorkbookConfig {
    pub contracts_table: String,
    pub links_table: String,
    pub templates_table: String,
    pub utc_offset: FixedOffset,
}

impl Default for WorkbookConfig {
    fn default() -> Self {
        Self {
            contracts_table: "Contracts".to_string(),
            links_table: "Links".to_string(),
            templates_table: "Templates".to_string(),
            utc_offset: FixedOffset::east_opt(9 * 3600).expect("+09:00 is a valid offset"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Startup fails if a variable required by the chosen backend is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub backend: StoreBackend,
    pub workbook: WorkbookConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let backend = match optional_env("STORE_BACKEND")
            .unwrap_or_else(|| "memory".to_string())
            .to_lowercase()
            .as_str()
        {
            "memory" => StoreBackend::Memory {
                seed_path: optional_env("MEMORY_SEED_PATH"),
            },
            "sheets" => StoreBackend::Sheets {
                api_base: optional_env("SHEETS_API_BASE")
                    .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
                spreadsheet_id: require_env("SPREADSHEET_ID")?,
                access_token: require_env("GOOGLE_SHEETS_ACCESS_TOKEN")?,
            },
            other => bail!("STORE_BACKEND must be 'memory' or 'sheets', got '{other}'"),
        };

        let defaults = WorkbookConfig::default();
        let utc_offset = match optional_env("SHEET_UTC_OFFSET") {
            Some(raw) => parse_utc_offset(&raw)
                .with_context(|| format!("SHEET_UTC_OFFSET '{raw}' must look like +09:00"))?,
            None => defaults.utc_offset,
        };

        Ok(Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            backend,
            workbook: WorkbookConfig {
                contracts_table: optional_env("SHEET_CONTRACTS").unwrap_or(defaults.contracts_table),
                links_table: optional_env("SHEET_LINKS").unwrap_or(defaults.links_table),
                templates_table: optional_env("SHEET_TEMPLATES").unwrap_or(defaults.templates_table),
                utc_offset,
            },
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parses `+09:00`, `-05:30`, `+0900` or `Z`.
pub fn parse_utc_offset(raw: &str) -> Result<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).context("zero offset");
    }

    let (sign, rest) = if let Some(rest) = raw.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = raw.strip_prefix('-') {
        (-1, rest)
    } else {
        bail!("offset must start with '+' or '-'");
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        bail!("offset must have the form ±HH:MM");
    }
    let hours: i32 = digits[..2].parse()?;
    let minutes: i32 = digits[2..].parse()?;
    if hours > 23 || minutes > 59 {
        bail!("offset out of range");
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).context("offset out of range")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_utc_offset_forms() {
        assert_eq!(parse_utc_offset("+09:00").unwrap().local_minus_utc(), 9 * 3600);
        assert_eq!(parse_utc_offset("-0530").unwrap().local_minus_utc(), -(5 * 3600 + 1800));
        assert_eq!(parse_utc_offset("Z").unwrap().local_minus_utc(), 0);
    }

    #[test]
    fn test_parse_utc_offset_rejects_garbage() {
        assert!(parse_utc_offset("09:00").is_err());
        assert!(parse_utc_offset("+9").is_err());
        assert!(parse_utc_offset("+25:00").is_err());
    }

    #[test]
    fn test_workbook_defaults() {
        let wb = WorkbookConfig::default();
        assert_eq!(wb.contracts_table, "Contracts");
        assert_eq!(wb.links_table, "Links");
        assert_eq!(wb.templates_table, "Templates");
        assert_eq!(wb.utc_offset.local_minus_utc(), 9 * 3600);
    }
}
