use anyhow::{Context, Result};
use dotenvy::dotenv;
use secrecy::Secret;
use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Invoice list the checkout flow writes to when none is configured.
pub const DEFAULT_LIST_ID: &str = "c2402b9b-a65b-490a-9bca-b0a4ce953c7d";

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub sharepoint: SharePointConfig,
    pub graph: GraphConfig,
    pub rapyd: RapydConfig,
    pub invoice: InvoiceConfig,
    pub logging: LoggingConfig,
    pub service_name: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Location of the invoice list inside SharePoint.
#[derive(Deserialize, Clone, Debug)]
pub struct SharePointConfig {
    pub site_id: String,
    pub list_id: String,
}

/// Microsoft Graph endpoint and app registration.
#[derive(Deserialize, Clone, Debug)]
pub struct GraphConfig {
    pub base_url: String,
    pub authority_url: String,
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub scope: String,
    pub timeout_secs: u64,
}

#[derive(Deserialize, Clone, Debug)]
pub struct RapydConfig {
    pub access_key: Secret<String>,
    pub secret_key: Secret<String>,
    pub base_url: String,
    pub country: String,
    pub currency: String,
    pub complete_checkout_url: Option<String>,
    pub cancel_checkout_url: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Deserialize, Clone, Debug)]
pub struct InvoiceConfig {
    pub number_prefix: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl GraphConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RapydConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Reads settings through a key lookup, `std::env` in production.
struct Vars<F> {
    lookup: F,
}

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn required(&self, key: &str) -> Result<String> {
        self.optional(key)
            .with_context(|| format!("{key} must be set"))
    }

    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|value| !value.trim().is_empty())
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }
}

/// Anything other than `pretty` keeps JSON logs.
fn is_json_format(log_format: &str) -> bool {
    !log_format.trim().eq_ignore_ascii_case("pretty")
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let vars = Vars { lookup };

        let host = vars.or_default("CHECKOUT_SERVICE_HOST", "0.0.0.0");
        let port = vars
            .or_default("CHECKOUT_SERVICE_PORT", "3010")
            .parse()
            .context("CHECKOUT_SERVICE_PORT must be a valid port")?;

        let timeout_secs = vars
            .or_default("HTTP_TIMEOUT_SECS", "30")
            .parse()
            .context("HTTP_TIMEOUT_SECS must be a whole number of seconds")?;

        Ok(Self {
            server: ServerConfig { host, port },
            sharepoint: SharePointConfig {
                site_id: vars.required("SITE_ID")?,
                list_id: vars.or_default("SHAREPOINT_LIST_ID", DEFAULT_LIST_ID),
            },
            graph: GraphConfig {
                base_url: vars.or_default("GRAPH_BASE_URL", "https://graph.microsoft.com/v1.0"),
                authority_url: vars.or_default(
                    "GRAPH_AUTHORITY_URL",
                    "https://login.microsoftonline.com",
                ),
                tenant_id: vars.required("GRAPH_TENANT_ID")?,
                client_id: vars.required("GRAPH_CLIENT_ID")?,
                client_secret: Secret::new(vars.required("GRAPH_CLIENT_SECRET")?),
                scope: vars.or_default("GRAPH_SCOPE", "https://graph.microsoft.com/.default"),
                timeout_secs,
            },
            rapyd: RapydConfig {
                access_key: Secret::new(vars.or_default("RAPYD_ACCESS_KEY", "")),
                secret_key: Secret::new(vars.or_default("RAPYD_SECRET_KEY", "")),
                base_url: vars.or_default("RAPYD_BASE_URL", "https://sandboxapi.rapyd.net"),
                country: vars.or_default("RAPYD_COUNTRY", "US"),
                currency: vars.or_default("RAPYD_CURRENCY", "USD"),
                complete_checkout_url: vars.optional("RAPYD_COMPLETE_CHECKOUT_URL"),
                cancel_checkout_url: vars.optional("RAPYD_CANCEL_CHECKOUT_URL"),
                timeout_secs,
            },
            invoice: InvoiceConfig {
                number_prefix: vars.or_default("INVOICE_NUMBER_PREFIX", "INV"),
            },
            logging: LoggingConfig {
                level: vars.or_default("LOG_LEVEL", "info,checkout_service=debug"),
                json: is_json_format(&vars.or_default("LOG_FORMAT", "json")),
            },
            service_name: "checkout-service".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 4] = [
        ("SITE_ID", "contoso.sharepoint.com,site,web"),
        ("GRAPH_TENANT_ID", "tenant-123"),
        ("GRAPH_CLIENT_ID", "client-abc"),
        ("GRAPH_CLIENT_SECRET", "s3cret"),
    ];

    #[test]
    fn test_defaults_fill_optional_settings() {
        let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();

        assert_eq!(config.server.port, 3010);
        assert_eq!(config.sharepoint.list_id, DEFAULT_LIST_ID);
        assert_eq!(config.graph.base_url, "https://graph.microsoft.com/v1.0");
        assert_eq!(config.graph.client_secret.expose_secret(), "s3cret");
        assert_eq!(config.graph.timeout(), Duration::from_secs(30));
        assert!(config.rapyd.access_key.expose_secret().is_empty());
        assert!(config.rapyd.complete_checkout_url.is_none());
        assert_eq!(config.invoice.number_prefix, "INV");
        assert!(config.logging.json);
    }

    #[test]
    fn test_missing_required_variable_names_it() {
        for missing in ["SITE_ID", "GRAPH_TENANT_ID", "GRAPH_CLIENT_ID", "GRAPH_CLIENT_SECRET"] {
            let pairs: Vec<_> = REQUIRED
                .iter()
                .copied()
                .filter(|(key, _)| *key != missing)
                .collect();

            let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
            assert_eq!(err.to_string(), format!("{missing} must be set"));
        }
    }

    #[test]
    fn test_blank_values_count_as_unset() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("SHAREPOINT_LIST_ID", "   "));
        pairs.push(("RAPYD_CANCEL_CHECKOUT_URL", ""));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.sharepoint.list_id, DEFAULT_LIST_ID);
        assert!(config.rapyd.cancel_checkout_url.is_none());

        pairs[0] = ("SITE_ID", " ");
        assert!(Config::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    fn test_log_format_pretty_switches_off_json() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("LOG_FORMAT", "Pretty"));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert!(!config.logging.json);

        assert!(is_json_format("json"));
        assert!(is_json_format("compact"));
        assert!(!is_json_format(" PRETTY "));
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("CHECKOUT_SERVICE_PORT", "not-a-port"));
        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(err.to_string().contains("CHECKOUT_SERVICE_PORT"));
    }
}
