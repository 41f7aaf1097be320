use common::errors::AppError;
use std::env;
use std::str::FromStr;

pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub qweather_key: String,
    pub qweather_api_url: String,
    pub qweather_geo_url: String,
    pub lang: String,
    pub cache_ttl_seconds: u64,
    pub http_timeout_secs: u64,
    pub http_max_retries: u32,
    pub connectivity_probe: String,
    pub top_city_number: u32,
    pub top_city_range: String,
    pub log_format: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let string = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let qweather_key = lookup("QWEATHER_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AppError::validation("QWEATHER_KEY must be set"))?;

        Ok(Self {
            port: parsed(&lookup, "PORT").unwrap_or(3002),
            database_url: string("DATABASE_URL", "sqlite://weather.db?mode=rwc"),
            qweather_key,
            qweather_api_url: string("QWEATHER_API_URL", "https://devapi.qweather.com"),
            qweather_geo_url: string("QWEATHER_GEO_URL", "https://geoapi.qweather.com"),
            lang: string("WEATHER_LANG", "zh"),
            cache_ttl_seconds: parsed(&lookup, "CACHE_TTL_SECONDS").unwrap_or(15 * 60),
            http_timeout_secs: parsed(&lookup, "HTTP_TIMEOUT_SECS").unwrap_or(10),
            http_max_retries: parsed(&lookup, "HTTP_MAX_RETRIES").unwrap_or(0),
            connectivity_probe: string("CONNECTIVITY_PROBE", "devapi.qweather.com:443"),
            top_city_number: parsed(&lookup, "TOP_CITY_NUMBER").unwrap_or(20),
            top_city_range: string("TOP_CITY_RANGE", "cn"),
            log_format: string("LOG_FORMAT", "pretty"),
        })
    }
}

fn parsed<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("QWEATHER_KEY", "abc")])).unwrap();
        assert_eq!(config.port, 3002);
        assert_eq!(config.cache_ttl_seconds, 900);
        assert_eq!(config.http_max_retries, 0);
        assert_eq!(config.lang, "zh");
        assert_eq!(config.top_city_range, "cn");
    }

    #[test]
    fn test_overrides_and_bad_numbers() {
        let config = Config::from_lookup(lookup(&[
            ("QWEATHER_KEY", "abc"),
            ("PORT", "8080"),
            ("CACHE_TTL_SECONDS", "not-a-number"),
            ("WEATHER_LANG", "en"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.cache_ttl_seconds, 900);
        assert_eq!(config.lang, "en");
    }

    #[test]
    fn test_missing_key_is_rejected() {
        let err = Config::from_lookup(lookup(&[("QWEATHER_KEY", "  ")])).err();
        assert!(matches!(err, Some(AppError::ValidationError(_))));
    }
}
