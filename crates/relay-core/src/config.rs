use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{domain::ChatId, errors::Error, Result};

/// How updates reach the bot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpdateMode {
    /// Long polling via `getUpdates`.
    Polling,
    /// Telegram pushes updates to our HTTP endpoint.
    Webhook(WebhookConfig),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebhookConfig {
    /// Public base URL Telegram should call, without the path.
    pub public_url: String,
    /// Local route the update endpoint is mounted on.
    pub path: String,
    /// Expected `X-Telegram-Bot-Api-Secret-Token` header. Telegram echoes it
    /// on every update, so requests without it are not from Telegram.
    pub secret: String,
    pub listen_address: String,
}

impl WebhookConfig {
    pub fn endpoint_url(&self) -> String {
        format!("{}{}", self.public_url.trim_end_matches('/'), self.path)
    }
}

/// Typed configuration, read from the environment (and `.env` if present).
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: String,
    pub operator_chat_id: ChatId,
    pub update_mode: UpdateMode,
    pub database_path: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(env_str)
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_bot_token = lookup("TELEGRAM_BOT_TOKEN")
            .and_then(non_empty)
            .ok_or_else(|| {
                Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
            })?;

        let raw_chat = lookup("OPERATOR_CHAT_ID").and_then(non_empty).ok_or_else(|| {
            Error::Config("OPERATOR_CHAT_ID environment variable is required".to_string())
        })?;
        let operator_chat_id = raw_chat
            .trim()
            .parse::<i64>()
            .map(ChatId)
            .map_err(|_| Error::Config(format!("OPERATOR_CHAT_ID is not a chat id: {raw_chat}")))?;

        let use_webhook = lookup("USE_WEBHOOK").map(|s| parse_bool(&s)).unwrap_or(false);
        let update_mode = if use_webhook {
            let public_url = lookup("WEBHOOK_URL").and_then(non_empty).ok_or_else(|| {
                Error::Config("WEBHOOK_URL is required when USE_WEBHOOK is set".to_string())
            })?;
            let mut path = lookup("WEBHOOK_PATH")
                .and_then(non_empty)
                .unwrap_or_else(|| "/webhook".to_string());
            if !path.starts_with('/') {
                path.insert(0, '/');
            }
            let secret = lookup("WEBHOOK_SECRET").and_then(non_empty).ok_or_else(|| {
                Error::Config("WEBHOOK_SECRET is required when USE_WEBHOOK is set".to_string())
            })?;
            if !is_valid_secret(&secret) {
                return Err(Error::Config(
                    "WEBHOOK_SECRET must be 1-256 characters of A-Z, a-z, 0-9, _ or -".to_string(),
                ));
            }
            UpdateMode::Webhook(WebhookConfig {
                public_url,
                path,
                secret,
                listen_address: lookup("HTTP_ADDRESS")
                    .and_then(non_empty)
                    .unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            })
        } else {
            UpdateMode::Polling
        };

        let database_path = PathBuf::from(
            lookup("DATABASE_PATH")
                .and_then(non_empty)
                .unwrap_or_else(|| "relay.db".to_string()),
        );

        Ok(Self {
            telegram_bot_token,
            operator_chat_id,
            update_mode,
            database_path,
        })
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        env::set_var(key, strip_quotes(v.trim()));
    }
}

fn strip_quotes(val: &str) -> &str {
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        &val[1..val.len() - 1]
    } else {
        val
    }
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Charset and length accepted by `setWebhook`'s `secret_token`.
fn is_valid_secret(s: &str) -> bool {
    (1..=256).contains(&s.len())
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
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
        move |k| map.get(k).cloned()
    }

    #[test]
    fn polling_defaults() {
        let cfg = Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("OPERATOR_CHAT_ID", "-1001234"),
        ]))
        .unwrap();
        assert_eq!(cfg.operator_chat_id, ChatId(-1001234));
        assert_eq!(cfg.update_mode, UpdateMode::Polling);
        assert_eq!(cfg.database_path, PathBuf::from("relay.db"));
    }

    #[test]
    fn webhook_mode_requires_url() {
        let err = Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("OPERATOR_CHAT_ID", "-1"),
            ("USE_WEBHOOK", "true"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("WEBHOOK_URL"));
    }

    #[test]
    fn webhook_mode_normalizes_path() {
        let cfg = Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("OPERATOR_CHAT_ID", "-1"),
            ("USE_WEBHOOK", "yes"),
            ("WEBHOOK_URL", "https://relay.example.com/"),
            ("WEBHOOK_PATH", "tg"),
            ("WEBHOOK_SECRET", "s3cret"),
        ]))
        .unwrap();
        let UpdateMode::Webhook(wh) = cfg.update_mode else {
            panic!("expected webhook mode");
        };
        assert_eq!(wh.endpoint_url(), "https://relay.example.com/tg");
        assert_eq!(wh.secret, "s3cret");
        assert_eq!(wh.listen_address, "0.0.0.0:8080");
    }

    #[test]
    fn webhook_mode_requires_secret() {
        let base = [
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("OPERATOR_CHAT_ID", "-1"),
            ("USE_WEBHOOK", "1"),
            ("WEBHOOK_URL", "https://relay.example.com"),
        ];
        let err = Config::from_lookup(lookup(&base)).unwrap_err();
        assert!(matches!(&err, Error::Config(m) if m.contains("WEBHOOK_SECRET")));

        let mut blank = base.to_vec();
        blank.push(("WEBHOOK_SECRET", "  "));
        assert!(Config::from_lookup(lookup(&blank)).is_err());

        let mut bad = base.to_vec();
        bad.push(("WEBHOOK_SECRET", "not a token!"));
        assert!(matches!(
            Config::from_lookup(lookup(&bad)).unwrap_err(),
            Error::Config(_)
        ));
    }

    #[test]
    fn polling_ignores_webhook_secret() {
        let cfg = Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("OPERATOR_CHAT_ID", "-1"),
            ("USE_WEBHOOK", "false"),
        ]))
        .unwrap();
        assert_eq!(cfg.update_mode, UpdateMode::Polling);
    }

    #[test]
    fn rejects_bad_chat_id_and_missing_token() {
        assert!(Config::from_lookup(lookup(&[("OPERATOR_CHAT_ID", "-1")])).is_err());
        let err = Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("OPERATOR_CHAT_ID", "ops"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn strips_dotenv_quotes() {
        assert_eq!(strip_quotes("\"a b\""), "a b");
        assert_eq!(strip_quotes("'x'"), "x");
        assert_eq!(strip_quotes("\""), "\"");
    }
}
