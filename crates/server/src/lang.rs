//! Player-facing message templates.
//!
//! Templates use positional placeholders (`{0}`, `{1}`, ...). The English
//! set is built in; a JSON object keyed by [`MessageKey::as_str`] overrides
//! individual templates.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use spawnguard_core::{PlayerId, SuppressReason};
use thiserror::Error;
use tracing::warn;

use crate::Notifier;

/// Identifies a player-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    /// To an attacker: the victim is protected. `{0}` = remaining time.
    VictimProtected,
    /// To an attacker: you are protected and cannot attack. `{0}` = remaining time.
    AttackerProtected,
    /// To an attacker: the entity's owner is protected. `{0}` = remaining time.
    OwnerProtected,
    /// To a spawning player. `{0}` = window length.
    ProtectionStarted,
    /// Status query reply. `{0}` = remaining time.
    ProtectionStatus,
    NotProtected,
    ProtectionRevoked,
}

impl MessageKey {
    pub const ALL: [MessageKey; 7] = [
        Self::VictimProtected,
        Self::AttackerProtected,
        Self::OwnerProtected,
        Self::ProtectionStarted,
        Self::ProtectionStatus,
        Self::NotProtected,
        Self::ProtectionRevoked,
    ];

    /// Stable name used in language files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VictimProtected => "victim_protected",
            Self::AttackerProtected => "attacker_protected",
            Self::OwnerProtected => "owner_protected",
            Self::ProtectionStarted => "protection_started",
            Self::ProtectionStatus => "protection_status",
            Self::NotProtected => "not_protected",
            Self::ProtectionRevoked => "protection_revoked",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }

    fn english(&self) -> &'static str {
        match self {
            Self::VictimProtected => "This player is protected for another {0}.",
            Self::AttackerProtected => "You are protected and cannot attack for another {0}.",
            Self::OwnerProtected => "The owner of this object is protected for another {0}.",
            Self::ProtectionStarted => "You are protected from damage for {0}.",
            Self::ProtectionStatus => "Your protection ends in {0}.",
            Self::NotProtected => "You are not protected.",
            Self::ProtectionRevoked => "Your spawn protection has ended.",
        }
    }
}

impl From<SuppressReason> for MessageKey {
    fn from(reason: SuppressReason) -> Self {
        match reason {
            SuppressReason::VictimProtected => Self::VictimProtected,
            SuppressReason::AttackerProtected => Self::AttackerProtected,
            SuppressReason::OwnerProtected => Self::OwnerProtected,
        }
    }
}

#[derive(Debug, Error)]
pub enum LangError {
    #[error("failed to parse language file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read language file from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Template set for one language.
#[derive(Debug, Clone)]
pub struct MessageCatalog {
    templates: HashMap<MessageKey, String>,
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self::english()
    }
}

impl MessageCatalog {
    pub fn english() -> Self {
        Self {
            templates: MessageKey::ALL
                .into_iter()
                .map(|key| (key, key.english().to_string()))
                .collect(),
        }
    }

    /// English defaults with the templates in `json` layered on top.
    ///
    /// Unknown keys are logged and skipped.
    pub fn from_json_str(json: &str) -> Result<Self, LangError> {
        let overrides: HashMap<String, String> = serde_json::from_str(json)?;
        let mut catalog = Self::english();
        for (name, template) in overrides {
            match MessageKey::from_name(&name) {
                Some(key) => {
                    catalog.templates.insert(key, template);
                }
                None => {
                    warn!(target: "spawnguard::lang", key = %name, "unknown message key ignored");
                }
            }
        }
        Ok(catalog)
    }

    pub fn from_file(path: &Path) -> Result<Self, LangError> {
        let contents = fs::read_to_string(path).map_err(|source| LangError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn template(&self, key: MessageKey) -> &str {
        self.templates
            .get(&key)
            .map(String::as_str)
            .unwrap_or_else(|| key.english())
    }

    /// Fill `{i}` placeholders with `args[i]` in one pass over the template.
    ///
    /// Argument text is never re-scanned. Placeholders without a matching
    /// argument, and braces that do not form a placeholder, are kept as is.
    pub fn render(&self, key: MessageKey, args: &[String]) -> String {
        let template = self.template(key);
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let arg = after.find('}').and_then(|close| {
                let digits = &after[..close];
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                let index: usize = digits.parse().ok()?;
                args.get(index).map(|arg| (arg, close))
            });
            match arg {
                Some((arg, close)) => {
                    out.push_str(arg);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// Notifier that renders through a catalog and hands the text to `send`.
pub struct CatalogNotifier<F: FnMut(PlayerId, String)> {
    catalog: MessageCatalog,
    send: F,
}

impl<F: FnMut(PlayerId, String)> CatalogNotifier<F> {
    pub fn new(catalog: MessageCatalog, send: F) -> Self {
        Self { catalog, send }
    }
}

impl<F: FnMut(PlayerId, String)> Notifier for CatalogNotifier<F> {
    fn notify(&mut self, player_id: PlayerId, key: MessageKey, args: &[String]) {
        let text = self.catalog.render(key, args);
        (self.send)(player_id, text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_key_has_unique_name() {
        for key in MessageKey::ALL {
            assert_eq!(MessageKey::from_name(key.as_str()), Some(key));
        }
    }

    #[test]
    fn test_render_substitutes_args() {
        let catalog = MessageCatalog::english();
        assert_eq!(
            catalog.render(MessageKey::VictimProtected, &["1h 2m".to_string()]),
            "This player is protected for another 1h 2m."
        );
        assert_eq!(catalog.render(MessageKey::NotProtected, &[]), "You are not protected.");
    }

    #[test]
    fn test_render_does_not_expand_placeholders_inside_args() {
        let json = r#"{ "protection_status": "{0} / {1} / {2} / {+1} / {x}" }"#;
        let catalog = MessageCatalog::from_json_str(json).unwrap();
        let rendered = catalog.render(
            MessageKey::ProtectionStatus,
            &["{1}".to_string(), "30s".to_string()],
        );
        assert_eq!(rendered, "{1} / 30s / {2} / {+1} / {x}");
    }

    #[test]
    fn test_overrides_layer_on_english() {
        let json = r#"{
            "protection_started": "Schutz aktiv: {0}",
            "no_such_key": "ignored"
        }"#;
        let catalog = MessageCatalog::from_json_str(json).unwrap();
        assert_eq!(
            catalog.render(MessageKey::ProtectionStarted, &["5m 0s".to_string()]),
            "Schutz aktiv: 5m 0s"
        );
        assert_eq!(catalog.template(MessageKey::NotProtected), "You are not protected.");
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = MessageCatalog::from_json_str("[1, 2]").unwrap_err();
        assert!(matches!(err, LangError::Parse(_)));
    }

    #[test]
    fn test_catalog_notifier_sends_rendered_text() {
        let mut sent = Vec::new();
        {
            let mut notifier = CatalogNotifier::new(MessageCatalog::english(), |player, text| {
                sent.push((player, text))
            });
            notifier.notify(PlayerId(9), MessageKey::ProtectionStatus, &["30s".to_string()]);
        }
        assert_eq!(
            sent,
            vec![(PlayerId(9), "Your protection ends in 30s.".to_string())]
        );
    }
}
