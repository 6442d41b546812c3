//! Static checks over the sync entry list, run before any network I/O

use std::collections::HashSet;

use crate::source::adapters::AdapterRegistry;
use crate::source::adapters::parse_repo;
use crate::source::adapters::registry_api::RegistryLocator;
use crate::sync::entry::{SourceKind, SyncConfig};
use crate::sync::error::{ConfigError, ConfigIssue};

/// Checks every entry and reports all issues at once
pub fn validate(configs: &[SyncConfig], registry: &AdapterRegistry) -> Result<(), ConfigError> {
    let issues = collect_issues(configs, registry);
    if issues.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(issues))
    }
}

pub fn collect_issues(configs: &[SyncConfig], registry: &AdapterRegistry) -> Vec<ConfigIssue> {
    let mut issues = Vec::new();
    let mut seen = HashSet::new();

    for entry in configs {
        let key = entry.entity_key.as_str();

        if key.trim().is_empty() {
            issues.push(ConfigIssue::new(key, "entity key is empty"));
        } else if !seen.insert(key.to_lowercase()) {
            issues.push(ConfigIssue::new(key, "duplicate entity key"));
        }

        match entry.source_kind {
            SourceKind::RegistryApi => {
                if let Err(e) = RegistryLocator::parse(&entry.source_locator) {
                    issues.push(ConfigIssue::new(key, e.to_string()));
                }
            }
            SourceKind::ReleaseApi | SourceKind::TagApi => {
                if parse_repo(&entry.source_locator).is_err() {
                    issues.push(ConfigIssue::new(
                        key,
                        format!(
                            "source locator {:?} must be <owner>/<repo>",
                            entry.source_locator
                        ),
                    ));
                }
            }
            SourceKind::Custom => {}
        }

        if entry.lts_tag_prefix.is_some() {
            if entry.source_kind != SourceKind::TagApi {
                issues.push(ConfigIssue::new(
                    key,
                    "ltsTagPrefix is only used by tagApi entries",
                ));
            } else if !entry.wants_lts {
                issues.push(ConfigIssue::new(key, "ltsTagPrefix is set but wantsLts is false"));
            }
        }

        if entry.wants_living_standard && entry.source_kind != SourceKind::Custom {
            issues.push(ConfigIssue::new(
                key,
                "wantsLivingStandard requires a custom source",
            ));
        }

        if registry.adapter_for(entry).is_none() {
            let message = match entry.source_kind {
                SourceKind::Custom => format!(
                    "no custom source registered for key {:?} or locator {:?}",
                    key, entry.source_locator
                ),
                kind => format!("no adapter registered for {}", kind.as_str()),
            };
            issues.push(ConfigIssue::new(key, message));
        }
    }

    issues
}
