//! engine::runner
//!
//! The run orchestrator: drives entities strictly in the caller's order.
//!
//! # Architecture
//!
//! For each entity: snapshot target state, classify (§decision), then
//! either short-circuit (skip / version bump) or fetch the full variant
//! set, validate completeness, and reconcile. Retry with exponential
//! backoff wraps the fetch pipeline here, re-invoking it on only the
//! failed subset. Cancellation is polled at entity boundaries only, so an
//! in-flight batch always completes.
//!
//! # Invariants
//!
//! - No cross-entity parallelism: the target tree is order sensitive
//! - Within one entity, all children are fetched before any is written
//! - An incomplete fetch (fewer than the full space after retries) leaves
//!   the entity's target state untouched
//! - Entity failures never abort the run; partial progress across
//!   entities is always preserved

use std::collections::BTreeMap;
use std::sync::Arc;

use super::decision::{classify, EntityState, UpdateAction};
use super::plan::build_plan;
use super::progress::{CancelFlag, ProgressEvent, ProgressSink};
use super::reconcile;
use crate::core::config::{ConfigError, FetchConfig, SyncConfig};
use crate::core::metadata::EntityMetadata;
use crate::core::types::{IconName, VersionToken};
use crate::core::variants::{PreferenceTable, VariantSpace};
use crate::core::versions::ChangeManifest;
use crate::fetch::{fetch_all, ContentTransport, FetchedContent, SourceUrlBuilder};
use crate::tree::{ChildEntry, TargetTree, TreeError};

/// Number of cooldown slices reported during one backoff wait.
const COOLDOWN_SLICES: u32 = 4;

/// Terminal status of one entity within a run.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityStatus {
    /// Reconciled (possibly with zero actual writes).
    Synced,
    /// Complete and current; nothing done.
    Skipped,
    /// Version token re-stamped without fetching.
    VersionBumped,
    /// Marked failed and skipped; target state untouched.
    Failed,
}

/// Per-entity result.
#[derive(Debug, serde::Serialize)]
pub struct EntityReport {
    pub entity: IconName,
    /// Classified action, when classification was reached.
    pub action: Option<UpdateAction>,
    pub status: EntityStatus,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub warning: Option<String>,
}

/// Whole-run result. Entity failures are reported here, not raised;
/// already-reconciled entities are never rolled back.
#[derive(Debug, Default, serde::Serialize)]
pub struct RunSummary {
    pub reports: Vec<EntityReport>,
    pub total: usize,
    pub cancelled: bool,
}

impl RunSummary {
    /// Entities that reached a terminal non-failed status.
    pub fn completed(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| r.status != EntityStatus::Failed)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| r.status == EntityStatus::Failed)
            .count()
    }
}

/// The orchestrator.
pub struct SyncRunner {
    pub space: VariantSpace,
    pub prefs: PreferenceTable,
    pub urls: SourceUrlBuilder,
    pub fetch: FetchConfig,
    pub delete_extra: bool,
}

impl SyncRunner {
    /// Build a runner from validated configuration.
    pub fn from_config(config: &SyncConfig) -> Result<Self, ConfigError> {
        let space = config.variant_space()?;
        let prefs = config.preference_table(&space);
        Ok(Self {
            space,
            prefs,
            urls: SourceUrlBuilder::new(config.source.base_url.clone()),
            fetch: config.fetch.clone(),
            delete_extra: config.reconcile.delete_extra,
        })
    }

    /// Run one sync pass over `entities`, in order.
    pub async fn run(
        &self,
        tree: &mut dyn TargetTree,
        transport: Arc<dyn ContentTransport>,
        entities: &[IconName],
        version: &VersionToken,
        manifest: &ChangeManifest,
        sink: &dyn ProgressSink,
        cancel: &CancelFlag,
    ) -> RunSummary {
        let mut summary = RunSummary {
            total: entities.len(),
            ..RunSummary::default()
        };
        sink.emit(ProgressEvent::RunStarted {
            total: entities.len(),
        });

        for (index, entity) in entities.iter().enumerate() {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }
            sink.emit(ProgressEvent::EntityStarted {
                entity: entity.clone(),
                index,
                total: entities.len(),
            });

            let report = self
                .process_entity(tree, Arc::clone(&transport), entity, version, manifest, sink)
                .await;
            if let Some(warning) = &report.warning {
                sink.emit(ProgressEvent::Warning {
                    entity: entity.clone(),
                    message: warning.clone(),
                });
            }
            sink.emit(ProgressEvent::EntityCompleted {
                entity: entity.clone(),
                written: report.created + report.updated,
                completed: index + 1,
                total: entities.len(),
            });
            summary.reports.push(report);

            // Keep a single-threaded host responsive between entities.
            tokio::task::yield_now().await;
        }

        sink.emit(ProgressEvent::RunFinished {
            completed: summary.completed(),
            failed: summary.failed(),
            total: summary.total,
            cancelled: summary.cancelled,
        });
        summary
    }

    async fn process_entity(
        &self,
        tree: &mut dyn TargetTree,
        transport: Arc<dyn ContentTransport>,
        entity: &IconName,
        version: &VersionToken,
        manifest: &ChangeManifest,
        sink: &dyn ProgressSink,
    ) -> EntityReport {
        let (state, children, stored) = match self.snapshot(tree, entity) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                return failed_report(entity, None, format!("cannot read target state: {error}"))
            }
        };

        let action = classify(entity, &state, version, manifest);
        sink.emit(ProgressEvent::EntityDecided {
            entity: entity.clone(),
            action: action.clone(),
        });

        match action {
            UpdateAction::Skip => EntityReport {
                entity: entity.clone(),
                action: Some(action),
                status: EntityStatus::Skipped,
                created: 0,
                updated: 0,
                deleted: 0,
                warning: None,
            },
            UpdateAction::VersionBumpOnly => {
                match reconcile::bump_version(tree, entity, &stored, version) {
                    Ok(()) => EntityReport {
                        entity: entity.clone(),
                        action: Some(action),
                        status: EntityStatus::VersionBumped,
                        created: 0,
                        updated: 0,
                        deleted: 0,
                        warning: None,
                    },
                    Err(error) => failed_report(
                        entity,
                        Some(action),
                        format!("version stamp failed: {error}"),
                    ),
                }
            }
            action => {
                self.fetch_and_reconcile(tree, transport, entity, version, action, children, stored, sink)
                    .await
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn fetch_and_reconcile(
        &self,
        tree: &mut dyn TargetTree,
        transport: Arc<dyn ContentTransport>,
        entity: &IconName,
        version: &VersionToken,
        action: UpdateAction,
        children: Vec<ChildEntry>,
        stored: EntityMetadata,
        sink: &dyn ProgressSink,
    ) -> EntityReport {
        let fetched = self
            .fetch_with_retry(transport, entity, version, sink)
            .await;

        // All children are fetched before any is written; anything short
        // of the full space rejects the entity wholesale so a partially
        // populated entity is never committed.
        if fetched.len() != self.space.size() {
            return failed_report(
                entity,
                Some(action),
                format!(
                    "incomplete fetch: {}/{} variants after {} attempts, target untouched",
                    fetched.len(),
                    self.space.size(),
                    self.fetch.max_attempts
                ),
            );
        }

        let new_hashes: BTreeMap<String, _> = fetched
            .iter()
            .map(|(k, v)| (k.clone(), v.hash.clone()))
            .collect();
        let plan = build_plan(
            &self.space,
            &children,
            &new_hashes,
            &stored,
            action.updates_existing(),
        );

        match reconcile::apply(
            tree,
            entity,
            &self.space,
            &self.prefs,
            plan,
            &fetched,
            &stored,
            version,
            self.delete_extra,
        ) {
            Ok(outcome) => {
                let warning = if outcome.failures.is_empty() {
                    None
                } else {
                    let names: Vec<&str> =
                        outcome.failures.iter().map(|f| f.name.as_str()).collect();
                    Some(format!(
                        "{} child write(s) failed, left unchanged: {}",
                        outcome.failures.len(),
                        names.join(", ")
                    ))
                };
                EntityReport {
                    entity: entity.clone(),
                    action: Some(action),
                    status: EntityStatus::Synced,
                    created: outcome.created,
                    updated: outcome.updated,
                    deleted: outcome.deleted,
                    warning,
                }
            }
            Err(error) => {
                failed_report(entity, Some(action), format!("reconciliation failed: {error}"))
            }
        }
    }

    /// Fetch the full variant set, retrying only the failed subset with
    /// escalating backoff between whole-pipeline attempts.
    async fn fetch_with_retry(
        &self,
        transport: Arc<dyn ContentTransport>,
        entity: &IconName,
        version: &VersionToken,
        sink: &dyn ProgressSink,
    ) -> BTreeMap<String, FetchedContent> {
        let mut pending = self.urls.full_set(&self.space, entity, version);
        let mut collected = BTreeMap::new();

        for attempt in 1..=self.fetch.max_attempts {
            let outcome = fetch_all(
                Arc::clone(&transport),
                std::mem::take(&mut pending),
                self.fetch.batch_size,
                self.fetch.inter_batch_delay(),
            )
            .await;
            sink.emit(ProgressEvent::FetchAttempt {
                entity: entity.clone(),
                attempt,
                stats: outcome.stats.clone(),
            });

            for content in outcome.fetched {
                collected.insert(content.reference.key.comparison_key(), content);
            }
            if outcome.failed.is_empty() {
                break;
            }
            pending = outcome.failed;

            if attempt < self.fetch.max_attempts {
                self.cooldown(entity, attempt, sink).await;
            }
        }
        collected
    }

    /// Sleep one backoff period in slices, surfacing remaining time so the
    /// run never looks hung.
    async fn cooldown(&self, entity: &IconName, attempt: u32, sink: &dyn ProgressSink) {
        let total = self.fetch.backoff_delay(attempt);
        if total.is_zero() {
            return;
        }
        let slice = total / COOLDOWN_SLICES;
        for elapsed_slices in 1..=COOLDOWN_SLICES {
            tokio::time::sleep(slice).await;
            let remaining = total.saturating_sub(slice * elapsed_slices);
            sink.emit(ProgressEvent::RetryCooldown {
                entity: entity.clone(),
                attempt,
                remaining,
            });
        }
        // Integer division remainder.
        let leftover = total.saturating_sub(slice * COOLDOWN_SLICES);
        if !leftover.is_zero() {
            tokio::time::sleep(leftover).await;
        }
    }

    /// Snapshot target-side state for classification.
    ///
    /// Completeness counts distinct parseable variant children; junk never
    /// makes an entity look complete.
    fn snapshot(
        &self,
        tree: &dyn TargetTree,
        entity: &IconName,
    ) -> Result<(EntityState, Vec<ChildEntry>, EntityMetadata), TreeError> {
        let exists = tree.entity_exists(entity)?;
        if !exists {
            return Ok((
                EntityState {
                    exists: false,
                    present: 0,
                    expected: self.space.size(),
                    stored_version: None,
                },
                Vec::new(),
                EntityMetadata::default(),
            ));
        }

        let children = tree.list_children(entity)?;
        let stored = EntityMetadata::load(tree, entity)?;
        let present = children
            .iter()
            .filter_map(|entry| self.space.parse_name(&entry.name))
            .map(|key| key.comparison_key())
            .collect::<std::collections::HashSet<_>>()
            .len();

        let state = EntityState {
            exists: true,
            present,
            expected: self.space.size(),
            stored_version: stored.version_token.clone(),
        };
        Ok((state, children, stored))
    }
}

fn failed_report(
    entity: &IconName,
    action: Option<UpdateAction>,
    warning: String,
) -> EntityReport {
    EntityReport {
        entity: entity.clone(),
        action,
        status: EntityStatus::Failed,
        created: 0,
        updated: 0,
        deleted: 0,
        warning: Some(warning),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_serializes_with_kebab_case_labels() {
        let summary = RunSummary {
            reports: vec![EntityReport {
                entity: IconName::new("wifi").unwrap(),
                action: Some(UpdateAction::VersionBumpOnly),
                status: EntityStatus::VersionBumped,
                created: 0,
                updated: 0,
                deleted: 0,
                warning: None,
            }],
            total: 1,
            cancelled: false,
        };

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["reports"][0]["entity"], "wifi");
        assert_eq!(json["reports"][0]["action"], "version-bump-only");
        assert_eq!(json["reports"][0]["status"], "version-bumped");
        assert_eq!(json["total"], 1);
    }
}
