//! Provider credential normalization.
//!
//! Every write to the platform settings record passes through
//! [`normalize_credentials`] before persisting. The function is a pure
//! transformation: it sanitizes user-entered entries, optionally seeds a
//! configuration-derived fallback, and guarantees that at most one entry
//! ends up flagged active.
//!
//! The environment credential is an explicit argument rather than being
//! read from process state, so callers control exactly which fallback (if
//! any) applies.

use serde_json::Value;

use crate::types::Credential;

/// Label applied when a credential entry arrives without an account name.
pub const PLACEHOLDER_ACCOUNT_NAME: &str = "Unnamed account";

/// Label for the configuration-derived fallback credential.
pub const ENV_ACCOUNT_NAME: &str = "Environment";

/// A credential synthesized from configuration values. Never persisted
/// as-is; only used to seed the settings record when no usable credential
/// was entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvCredential {
    /// Provider API token.
    pub vercel_token: String,
    /// Team scope for the token, if any.
    pub vercel_team_id: Option<String>,
}

impl EnvCredential {
    /// Build the fallback, returning `None` when the token is blank.
    #[must_use]
    pub fn from_values(token: Option<&str>, team_id: Option<&str>) -> Option<Self> {
        let token = token.map(str::trim).filter(|t| !t.is_empty())?;
        Some(Self {
            vercel_token: token.to_owned(),
            vercel_team_id: team_id
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(ToOwned::to_owned),
        })
    }

    /// Convert into a persisted credential entry, flagged active.
    #[must_use]
    pub fn to_credential(&self) -> Credential {
        Credential {
            account_name: ENV_ACCOUNT_NAME.to_owned(),
            vercel_token: self.vercel_token.clone(),
            vercel_team_id: self.vercel_team_id.clone(),
            active: true,
        }
    }
}

/// Reduce a settings write's credential list to a sanitized list with
/// exactly one (or zero) active entry.
///
/// `incoming` is the raw JSON value from the write payload. When it is not
/// an array, the previously stored list is used instead. Non-object array
/// entries are discarded, fields are trimmed and defaulted, and entries
/// without a token are dropped. If the result is empty and a fallback is
/// available, the list is seeded with the fallback alone.
///
/// Active selection scans from the end: the last entry flagged active
/// wins. This matches "most recently flagged wins" when a user toggles a
/// new entry active without deactivating the previous one. When nothing is
/// flagged, the first entry is selected.
#[must_use]
pub fn normalize_credentials(
    incoming: Option<&Value>,
    previous: &[Credential],
    fallback: Option<&EnvCredential>,
) -> Vec<Credential> {
    let mut entries: Vec<Credential> = match incoming {
        Some(Value::Array(items)) => items.iter().filter_map(parse_entry).collect(),
        _ => previous.iter().filter_map(sanitize).collect(),
    };

    if entries.is_empty() {
        if let Some(fallback) = fallback {
            entries.push(fallback.to_credential());
        }
    }

    if entries.is_empty() {
        return entries;
    }

    let selected = entries
        .iter()
        .rposition(|c| c.active)
        .unwrap_or(0);
    for (index, entry) in entries.iter_mut().enumerate() {
        entry.active = index == selected;
    }

    entries
}

/// Pick the credential to use for outbound provider calls.
///
/// Returns the active persisted entry, or the fallback when no persisted
/// entry carries a non-empty token.
#[must_use]
pub fn active_credential(
    credentials: &[Credential],
    fallback: Option<&EnvCredential>,
) -> Option<Credential> {
    let persisted = credentials
        .iter()
        .filter(|c| !c.vercel_token.trim().is_empty())
        .find(|c| c.active)
        .cloned();

    persisted.or_else(|| fallback.map(EnvCredential::to_credential))
}

/// Parse one raw entry. Non-objects yield `None`; objects with a blank
/// token also yield `None` since a credential without a token is not
/// persistable.
fn parse_entry(value: &Value) -> Option<Credential> {
    let entry = value.as_object()?;

    let token = entry
        .get("vercelToken")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();
    if token.is_empty() {
        return None;
    }

    let account_name = entry
        .get("accountName")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(PLACEHOLDER_ACCOUNT_NAME)
        .to_owned();

    let team_id = entry
        .get("vercelTeamId")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned);

    let active = entry.get("active").and_then(Value::as_bool).unwrap_or(false);

    Some(Credential {
        account_name,
        vercel_token: token.to_owned(),
        vercel_team_id: team_id,
        active,
    })
}

/// Re-sanitize an already-stored entry. The same trimming rules apply so
/// normalization is idempotent regardless of which path produced the list.
fn sanitize(credential: &Credential) -> Option<Credential> {
    let token = credential.vercel_token.trim();
    if token.is_empty() {
        return None;
    }

    let account_name = match credential.account_name.trim() {
        "" => PLACEHOLDER_ACCOUNT_NAME,
        trimmed => trimmed,
    };

    Some(Credential {
        account_name: account_name.to_owned(),
        vercel_token: token.to_owned(),
        vercel_team_id: credential
            .vercel_team_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned),
        active: credential.active,
    })
}
