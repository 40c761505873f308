//! User accounts and per-user display preferences.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockyard_core::{DomainError, DomainResult, UserId};

/// A user known to the inventory system (provisioned from the token subject).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            username: self.username.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
}

/// Display preferences. Presentation input only; no ledger rule reads these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    pub currency: String,
    pub locale: String,
    pub low_stock_alerts: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            locale: "en-US".to_string(),
            low_stock_alerts: true,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsUpdate {
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub low_stock_alerts: Option<bool>,
}

impl UserSettings {
    pub fn apply(&mut self, update: SettingsUpdate, now: DateTime<Utc>) -> DomainResult<()> {
        let currency = update.currency.as_deref().map(parse_currency).transpose()?;
        let locale = update.locale.as_deref().map(parse_locale).transpose()?;

        if let Some(v) = currency {
            self.currency = v;
        }
        if let Some(v) = locale {
            self.locale = v;
        }
        if let Some(v) = update.low_stock_alerts {
            self.low_stock_alerts = v;
        }
        self.updated_at = Some(now);
        Ok(())
    }
}

fn parse_currency(raw: &str) -> DomainResult<String> {
    let code = raw.trim().to_ascii_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(DomainError::validation(
            "currency",
            "must be a three-letter ISO 4217 code",
        ));
    }
    Ok(code)
}

fn parse_locale(raw: &str) -> DomainResult<String> {
    let tag = raw.trim();
    let valid = !tag.is_empty()
        && tag.len() <= 35
        && tag.split(['-', '_']).all(|part| {
            !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric())
        });
    if !valid {
        return Err(DomainError::validation("locale", "must be a language tag such as en-US"));
    }
    Ok(tag.to_string())
}
