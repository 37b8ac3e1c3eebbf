use super::*;
use rust_decimal_macros::dec;

fn default_server() -> ServerConfig {
    ServerConfig {
        host: default_host(),
        port: default_port(),
        request_timeout_seconds: default_timeout(),
        max_request_size: default_max_request_size(),
    }
}

fn default_database() -> DatabaseConfig {
    DatabaseConfig {
        database_url: default_database_url(),
        max_connections: default_max_connections(),
    }
}

fn default_pricing() -> PricingConfig {
    PricingConfig {
        exchange_rate: default_exchange_rate(),
        currency_symbol: default_currency_symbol(),
    }
}

fn default_observability() -> ObservabilityConfig {
    ObservabilityConfig {
        service_name: default_service_name(),
        service_version: default_service_version(),
        otlp_endpoint: String::new(),
        log_level: default_log_level(),
        enable_json_logging: false,
    }
}

fn default_config() -> Config {
    Config {
        server: default_server(),
        database: default_database(),
        pricing: default_pricing(),
        observability: default_observability(),
    }
}

#[test]
fn test_default_values() {
    let config = default_config();

    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.request_timeout_seconds, 30);
    assert_eq!(config.database.max_connections, 5);
    assert_eq!(config.pricing.exchange_rate, 90.0);
    assert_eq!(config.pricing.currency_symbol, "₹");
    assert_eq!(config.observability.service_name, "foodcosta-rs");
}

#[test]
fn test_default_config_is_valid() {
    assert!(default_config().validate().is_ok());
}

#[test]
fn test_zero_port_is_rejected() {
    let mut config = default_config();
    config.server.port = 0;

    assert!(config.validate().is_err());
}

#[test]
fn test_zero_timeout_is_rejected() {
    let mut config = default_config();
    config.server.request_timeout_seconds = 0;

    assert!(config.validate().is_err());
}

#[test]
fn test_empty_database_url_is_rejected() {
    let mut config = default_config();
    config.database.database_url = String::new();

    assert!(config.validate().is_err());
}

#[test]
fn test_exchange_rate_conversion() {
    let pricing = default_pricing();

    assert_eq!(pricing.exchange_rate_decimal().unwrap(), dec!(90));
}

#[test]
fn test_non_positive_exchange_rate_is_rejected() {
    let mut pricing = default_pricing();

    pricing.exchange_rate = 0.0;
    assert!(pricing.exchange_rate_decimal().is_err());

    pricing.exchange_rate = -1.5;
    assert!(pricing.exchange_rate_decimal().is_err());

    pricing.exchange_rate = f64::NAN;
    assert!(pricing.exchange_rate_decimal().is_err());
}

#[test]
fn test_request_timeout_duration() {
    let server = default_server();

    assert_eq!(server.request_timeout(), Duration::from_secs(30));
}
