//! Store-facing metraj operations.
//!
//! Generation is split in two phases: [`preview`] computes the row set
//! without writing anything, and [`commit`] swaps it into the store as one
//! transaction. [`regenerate`] runs both back to back.

use tracing::{debug, error, info, info_span};

use crate::error::MetrajError;
use crate::form::MetrajRequest;
use crate::metraj::{self, MetrajPlan, MetrajWarning};
use crate::models::{DrillingInfo, FieldRecord, ProjectId};
use crate::settings::MetrajSettings;
use crate::storage::Storage;

/// Result of a committed regeneration.
#[derive(Clone, Debug, PartialEq)]
pub struct MetrajOutcome {
    pub target_depth_m: f64,
    /// Stored rows in depth order, with their assigned ids.
    pub records: Vec<FieldRecord>,
    pub warnings: Vec<MetrajWarning>,
}

/// Result of saving drilling parameters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrillingUpdate {
    /// New rows when the depth change forced a regeneration.
    pub regenerated: Option<Vec<FieldRecord>>,
    pub warnings: Vec<MetrajWarning>,
}

/// Compute the row set for a project, reading only its stored drilling depth.
pub fn preview<S: Storage + ?Sized>(
    store: &S,
    project_id: ProjectId,
    request: &MetrajRequest,
    settings: &MetrajSettings,
) -> Result<MetrajPlan, MetrajError> {
    let stored_depth_m = store.get_drilling_depth(project_id)?;
    preview_with_drilling_depth(project_id, request, stored_depth_m, settings)
}

/// Same as [`preview`] with the stored drilling depth supplied by the caller.
pub fn preview_with_drilling_depth(
    project_id: ProjectId,
    request: &MetrajRequest,
    stored_depth_m: Option<f64>,
    settings: &MetrajSettings,
) -> Result<MetrajPlan, MetrajError> {
    let mut warnings = request.warnings.clone();
    let requested_m = match request.target_depth_m {
        Some(requested_m) => {
            if let Some(stored_m) = stored_depth_m.filter(|d| *d > 0.0) {
                if (requested_m - stored_m).abs() > settings.match_tolerance_m {
                    warnings.push(MetrajWarning::DepthDiffersFromDrilling {
                        requested_m,
                        stored_m,
                    });
                }
            }
            requested_m
        }
        None => stored_depth_m.ok_or_else(|| {
            MetrajError::invalid_depth(format!(
                "no drilling depth recorded for project {project_id}"
            ))
        })?,
    };

    let mut plan = metraj::plan(project_id, requested_m, request.ud.as_ref(), settings)?;
    warnings.append(&mut plan.warnings);
    plan.warnings = warnings;
    Ok(plan)
}

/// Replace every field record of the project with `records` in one transaction.
pub fn commit<S: Storage + ?Sized>(
    store: &mut S,
    project_id: ProjectId,
    records: Vec<FieldRecord>,
) -> Result<Vec<FieldRecord>, MetrajError> {
    let stored = store
        .replace_field_records(project_id, records)
        .map_err(|err| {
            error!(project_id = project_id.0, error = %err, "field record replace failed");
            MetrajError::from(err)
        })?;
    info!(
        project_id = project_id.0,
        rows = stored.len(),
        "field records committed"
    );
    Ok(stored)
}

/// Preview and commit in one call.
pub fn regenerate<S: Storage + ?Sized>(
    store: &mut S,
    project_id: ProjectId,
    request: &MetrajRequest,
    settings: &MetrajSettings,
) -> Result<MetrajOutcome, MetrajError> {
    let span = info_span!("metraj.regenerate", project_id = project_id.0);
    let _entered = span.enter();

    let plan = preview(store, project_id, request, settings)?;
    debug!(
        target_depth_m = plan.target_depth_m,
        rows = plan.records.len(),
        warnings = plan.warnings.len(),
        "metraj planned"
    );
    let records = commit(store, project_id, plan.records)?;
    Ok(MetrajOutcome {
        target_depth_m: plan.target_depth_m,
        records,
        warnings: plan.warnings,
    })
}

fn depth_changed(previous: Option<f64>, current: Option<f64>, tolerance: f64) -> bool {
    match (previous, current) {
        (Some(a), Some(b)) => (a - b).abs() > tolerance,
        (None, None) => false,
        _ => true,
    }
}

/// Save drilling parameters. A changed drilling depth rebuilds the grid
/// (without UD rows) when the project already has field records; the new
/// parameters and the new rows are stored together or not at all.
pub fn save_drilling_info<S: Storage + ?Sized>(
    store: &mut S,
    info: DrillingInfo,
    settings: &MetrajSettings,
) -> Result<DrillingUpdate, MetrajError> {
    let project_id = info.project_id;
    let previous_depth_m = store.get_drilling_depth(project_id)?;
    let changed = depth_changed(
        previous_depth_m,
        info.drilling_depth_m,
        settings.match_tolerance_m,
    );
    let regenerate_to = info.drilling_depth_m.filter(|d| changed && *d > 0.0);
    let Some(depth_m) = regenerate_to else {
        store.upsert_drilling_info(info)?;
        return Ok(DrillingUpdate::default());
    };
    if store.count_field_records(project_id)? == 0 {
        store.upsert_drilling_info(info)?;
        return Ok(DrillingUpdate::default());
    }

    let plan = metraj::plan(project_id, depth_m, None, settings)?;
    let records = store
        .save_drilling_info_with_records(info, plan.records)
        .map_err(|err| {
            error!(project_id = project_id.0, error = %err, "drilling info save failed");
            MetrajError::from(err)
        })?;
    info!(
        project_id = project_id.0,
        depth_m,
        "drilling depth changed, field records regenerated"
    );
    Ok(DrillingUpdate {
        regenerated: Some(records),
        warnings: plan.warnings,
    })
}
