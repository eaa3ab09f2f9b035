// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Minimal-diff reconciliation of desired record sets against the directory.
//!
//! The engine compares a desired set of rdata values with what the directory
//! observes for the same identity, computes the smallest sequence of change
//! actions that converges the two, and applies those actions one remote call
//! at a time. Comparison happens on normalized rdata so formatting noise
//! never produces spurious churn.
//!
//! Apply is deliberately unforgiving: actions run in plan order, the first
//! hard failure stops the loop, and completed actions are never rolled back.
//! The directory's append/delete-by-value model makes every action
//! individually idempotent, so a later pass picks up exactly where a failed
//! one stopped. Retry of transient faults belongs to the
//! [`DirectoryClient`] implementation, never to the engine.

use tracing::{debug, info, warn};

use crate::constants::{DEFAULT_RECORD_CLASS, DEFAULT_RECORD_TTL_SECS};
use crate::directory::DirectoryClient;
use crate::dns_errors::{DirectoryError, SyncError};
use crate::recordset::{RecordIdentity, RecordSet};

/// One step of a change plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeAction {
    /// Append one rdata value to the record set.
    Add {
        /// Normalized rdata to append
        rdata: String,
    },
    /// Delete one rdata value from the record set.
    Remove {
        /// Normalized rdata to delete
        rdata: String,
    },
    /// Rewrite set-wide metadata for the values surviving the diff.
    RefreshMetadata {
        /// Desired TTL in seconds
        ttl: u32,
    },
}

/// The ordered actions that converge observed state onto desired state.
#[derive(Debug, Clone)]
pub struct ChangePlan {
    /// Identity the plan applies to
    pub identity: RecordIdentity,
    /// Desired TTL in seconds
    pub ttl: u32,
    /// Desired DNS class
    pub class: String,
    /// Actions in apply order
    pub actions: Vec<ChangeAction>,
    /// Values present in both sets, targeted by `RefreshMetadata`
    pub kept: Vec<String>,
}

impl ChangePlan {
    /// Diff a desired set against an observed one.
    ///
    /// Additions run before removals so a partially applied plan never
    /// leaves the set emptier than either input. CNAME is the exception:
    /// only one value may exist at an owner, so stale values are removed
    /// first. A `RefreshMetadata` action is appended last when TTLs differ
    /// and at least one value survives the diff.
    #[must_use]
    pub fn diff(desired: &RecordSet, observed: &RecordSet) -> Self {
        let additions: Vec<String> = desired.difference(observed);
        let removals: Vec<String> = observed.difference(desired);
        let kept: Vec<String> = desired.intersection(observed);

        let mut actions = Vec::with_capacity(additions.len() + removals.len() + 1);
        let adds = additions.into_iter().map(|rdata| ChangeAction::Add { rdata });
        let removes = removals
            .into_iter()
            .map(|rdata| ChangeAction::Remove { rdata });

        if desired.identity.rtype.is_exclusive_at_owner() {
            actions.extend(removes);
            actions.extend(adds);
        } else {
            actions.extend(adds);
            actions.extend(removes);
        }

        if observed.ttl != desired.ttl && !kept.is_empty() {
            actions.push(ChangeAction::RefreshMetadata { ttl: desired.ttl });
        }

        Self {
            identity: desired.identity.clone(),
            ttl: desired.ttl,
            class: desired.class.clone(),
            actions,
            kept,
        }
    }

    /// Whether the plan contains no actions (the sets already converge).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// The action that stopped an apply pass, with the error that caused it.
#[derive(Debug)]
pub struct ApplyFailure {
    /// The action that failed
    pub action: ChangeAction,
    /// Why it failed
    pub error: DirectoryError,
}

/// Outcome of applying a change plan.
#[derive(Debug)]
pub struct ChangePlanResult {
    /// The plan that was applied
    pub plan: ChangePlan,
    /// Actions that completed, in order
    pub completed: Vec<ChangeAction>,
    /// The first hard failure, if any
    pub failure: Option<ApplyFailure>,
}

impl ChangePlanResult {
    /// Whether the full plan was applied and the sets now converge.
    #[must_use]
    pub fn converged(&self) -> bool {
        self.failure.is_none()
    }
}

/// Drives record sets toward their desired state through a directory client.
pub struct Reconciler<C: DirectoryClient> {
    client: C,
}

impl<C: DirectoryClient> Reconciler<C> {
    /// Create a reconciler over the given directory client.
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// The underlying directory client.
    #[must_use]
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Converge one record identity onto the desired rdata values.
    ///
    /// Values are normalized before comparison, observed state is read from
    /// the directory, and the resulting plan is applied action by action.
    /// `ttl` and `class` default to 3600 and `IN`.
    ///
    /// A partial apply is not an `Err`: the returned result carries the
    /// completed prefix and the failure, and the caller decides whether to
    /// run another pass. `Err` is reserved for failures before apply starts,
    /// such as malformed desired values or an unreadable directory.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::RecordData`] when a desired or observed value
    /// does not parse for the record type, or [`SyncError::Directory`] when
    /// the observed state cannot be listed.
    pub async fn reconcile(
        &self,
        identity: &RecordIdentity,
        desired_values: &[String],
        ttl: Option<u32>,
        class: Option<&str>,
    ) -> Result<ChangePlanResult, SyncError> {
        let ttl = ttl.unwrap_or(DEFAULT_RECORD_TTL_SECS);
        let class = class.unwrap_or(DEFAULT_RECORD_CLASS);

        let desired = RecordSet::new(identity.clone(), ttl, class, desired_values)?;

        let records = self.client.list_records(identity).await?;
        // An empty listing is trusted as-is: the directory is the source of
        // truth for observed state, and second-guessing it would leave stale
        // values unremovable.
        let observed_ttl = records.first().map_or(ttl, |r| r.ttl);
        let observed_values: Vec<&str> = records.iter().map(|r| r.rdata.as_str()).collect();
        let observed = RecordSet::new(identity.clone(), observed_ttl, class, &observed_values)?;

        let plan = ChangePlan::diff(&desired, &observed);
        if plan.is_empty() {
            debug!(identity = %identity, "Record set already converged");
            return Ok(ChangePlanResult {
                plan,
                completed: Vec::new(),
                failure: None,
            });
        }

        info!(
            identity = %identity,
            actions = plan.actions.len(),
            desired = desired.len(),
            observed = observed.len(),
            "Applying change plan"
        );

        self.apply(plan).await
    }

    /// Apply a plan one action at a time, stopping at the first hard failure.
    async fn apply(&self, plan: ChangePlan) -> Result<ChangePlanResult, SyncError> {
        let mut completed = Vec::with_capacity(plan.actions.len());
        let mut failure = None;

        for action in &plan.actions {
            match self.apply_action(&plan, action).await {
                Ok(()) => completed.push(action.clone()),
                Err(e) => {
                    warn!(
                        identity = %plan.identity,
                        action = ?action,
                        completed = completed.len(),
                        error = %e,
                        "Change plan stopped at failed action"
                    );
                    failure = Some(ApplyFailure {
                        action: action.clone(),
                        error: e,
                    });
                    break;
                }
            }
        }

        Ok(ChangePlanResult {
            plan,
            completed,
            failure,
        })
    }

    /// Apply one action, folding the tolerated outcomes into success.
    ///
    /// A `Conflict` on add means the value is already present and a
    /// `NotFound` on remove means it is already gone; both are exactly the
    /// state the action was driving toward.
    async fn apply_action(
        &self,
        plan: &ChangePlan,
        action: &ChangeAction,
    ) -> Result<(), DirectoryError> {
        match action {
            ChangeAction::Add { rdata } => {
                match self
                    .client
                    .create_record(&plan.identity, rdata, plan.ttl, &plan.class)
                    .await
                {
                    Err(DirectoryError::Conflict { .. }) => {
                        debug!(
                            identity = %plan.identity,
                            rdata = %rdata,
                            "Value already present, treating add as complete"
                        );
                        Ok(())
                    }
                    other => other,
                }
            }
            ChangeAction::Remove { rdata } => {
                match self.client.delete_record(&plan.identity, rdata).await {
                    Err(DirectoryError::NotFound { .. }) => {
                        debug!(
                            identity = %plan.identity,
                            rdata = %rdata,
                            "Value already absent, treating remove as complete"
                        );
                        Ok(())
                    }
                    other => other,
                }
            }
            ChangeAction::RefreshMetadata { ttl } => {
                self.client
                    .refresh_metadata(&plan.identity, &plan.kept, *ttl, &plan.class)
                    .await
            }
        }
    }
}
