use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: Option<String>,
    pub lifetime: Option<Duration>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub mail: MailConfig,
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    /// Missing JWT settings are not an error here; token issuance reports them.
    pub fn from_env() -> anyhow::Result<Self> {
        let lifetime = non_empty_var("JWT_LIFETIME")
            .map(|v| parse_lifetime(&v))
            .transpose()
            .context("parse JWT_LIFETIME")?;

        let jwt = JwtConfig {
            secret: non_empty_var("JWT_SECRET"),
            lifetime,
        };

        let mail = MailConfig {
            smtp_host: non_empty_var("SMTP_HOST"),
            smtp_port: non_empty_var("SMTP_PORT")
                .map(|v| v.parse::<u16>())
                .transpose()
                .context("parse SMTP_PORT")?
                .unwrap_or(587),
            smtp_username: non_empty_var("SMTP_USERNAME"),
            smtp_password: non_empty_var("SMTP_PASSWORD"),
            from: non_empty_var("MAIL_FROM").unwrap_or_else(|| "no-reply@localhost".into()),
        };

        Ok(Self {
            host: non_empty_var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: non_empty_var("APP_PORT")
                .map(|v| v.parse::<u16>())
                .transpose()
                .context("parse APP_PORT")?
                .unwrap_or(8080),
            database_url: non_empty_var("DATABASE_URL"),
            jwt,
            mail,
        })
    }
}

/// Upper bound on token lifetimes: ten years.
const MAX_LIFETIME_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Parses token lifetimes like `30d`, `12h`, `15m`, `45s` or bare seconds.
pub fn parse_lifetime(raw: &str) -> anyhow::Result<Duration> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);
    let value: u64 = digits
        .parse()
        .with_context(|| format!("invalid lifetime {raw:?}"))?;

    let secs_per_unit = match unit.trim() {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 60 * 60 * 24,
        "w" => 60 * 60 * 24 * 7,
        other => anyhow::bail!("unknown lifetime unit {other:?} in {raw:?}"),
    };

    if value == 0 {
        anyhow::bail!("lifetime must be positive");
    }
    let secs = value
        .checked_mul(secs_per_unit)
        .filter(|secs| *secs <= MAX_LIFETIME_SECS)
        .with_context(|| format!("lifetime {raw:?} exceeds ten years"))?;
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_suffixed_lifetimes() {
        assert_eq!(parse_lifetime("30d").unwrap(), Duration::from_secs(30 * 86_400));
        assert_eq!(parse_lifetime("12h").unwrap(), Duration::from_secs(12 * 3_600));
        assert_eq!(parse_lifetime("15m").unwrap(), Duration::from_secs(900));
        assert_eq!(parse_lifetime("45s").unwrap(), Duration::from_secs(45));
        assert_eq!(parse_lifetime("1w").unwrap(), Duration::from_secs(604_800));
    }

    #[test]
    fn bare_number_is_seconds() {
        assert_eq!(parse_lifetime("3600").unwrap(), Duration::from_secs(3_600));
        assert_eq!(parse_lifetime(" 60 ").unwrap(), Duration::from_secs(60));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_lifetime("").is_err());
        assert!(parse_lifetime("d").is_err());
        assert!(parse_lifetime("10y").is_err());
        assert!(parse_lifetime("0h").is_err());
    }

    #[test]
    fn rejects_oversized_lifetimes() {
        assert!(parse_lifetime("100000000000000s").is_err());
        assert!(parse_lifetime("18446744073709551615d").is_err());
        assert!(parse_lifetime("3651d").is_err());
        assert_eq!(
            parse_lifetime("3650d").unwrap(),
            Duration::from_secs(MAX_LIFETIME_SECS)
        );
    }
}
