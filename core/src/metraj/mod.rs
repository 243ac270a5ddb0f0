//! Depth-metraj generation for borehole field records.
//!
//! A metraj is the regular grid of sample rows for one borehole: a row at
//! `0, step, 2*step, ...` strictly below the target depth. Undisturbed-sample
//! (UD) depths are then merged into that grid, either by tagging the row they
//! coincide with or by inserting a new row at their sorted position.
//!
//! Everything here is pure: no store access, no clock, no randomness. The
//! same inputs always produce the same rows.
//!
//! # Example
//!
//! ```
//! use sondaj_metraj::metraj::{plan, UdRequest};
//! use sondaj_metraj::{MetrajSettings, ProjectId};
//!
//! let ud = UdRequest::new("2.0", Some(1));
//! let plan = plan(ProjectId(1), 4.5, Some(&ud), &MetrajSettings::default()).unwrap();
//! let depths: Vec<f64> = plan.records.iter().map(|r| r.depth_m).collect();
//! assert_eq!(depths, vec![0.0, 1.5, 2.0, 3.0]);
//! assert_eq!(plan.records[2].sample_type_no, "UD-1");
//! ```

pub mod ud;

use std::fmt;

use tracing::{debug, warn};

pub use ud::{parse_count, parse_decimal, parse_ud_depths};

use crate::error::MetrajError;
use crate::models::{FieldRecord, ProjectId};
use crate::settings::MetrajSettings;

/// Non-fatal conditions met while planning a metraj, shown to the user.
#[derive(Clone, Debug, PartialEq, uniffi::Enum)]
pub enum MetrajWarning {
    /// The requested depth was below the minimum and was raised.
    DepthClamped { requested_m: f64, applied_m: f64 },
    /// An explicit depth was used although the drilling parameters say otherwise.
    DepthDiffersFromDrilling { requested_m: f64, stored_m: f64 },
    /// UD input could not be read; only the grid was generated.
    UdParseFailed { message: String },
    /// UD depth count disagrees with the declared count; only the grid was generated.
    CountMismatch { parsed: u32, declared: u32 },
    /// A UD depth repeated an earlier one within tolerance; the later sample
    /// took over the earlier sample's row.
    DuplicateUdDepth { depth_m: f64 },
}

impl fmt::Display for MetrajWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetrajWarning::DepthClamped {
                requested_m,
                applied_m,
            } => write!(
                f,
                "Borehole depth must be at least {applied_m}m; {requested_m}m was raised to {applied_m}m."
            ),
            MetrajWarning::DepthDiffersFromDrilling {
                requested_m,
                stored_m,
            } => write!(
                f,
                "Entered depth ({requested_m}m) differs from the drilling parameters ({stored_m}m); the entered depth was used."
            ),
            MetrajWarning::UdParseFailed { message } => {
                write!(f, "UD samples were not added: {message}")
            }
            MetrajWarning::CountMismatch { parsed, declared } => write!(
                f,
                "UD depth count ({parsed}) does not match UD count ({declared}); metraj was generated without UD samples."
            ),
            MetrajWarning::DuplicateUdDepth { depth_m } => {
                write!(f, "UD depth {depth_m}m repeats an earlier UD depth; the row carries the later sample number.")
            }
        }
    }
}

/// Raw UD input as the user typed it.
#[derive(Clone, Debug, PartialEq)]
pub struct UdRequest {
    pub depths: String,
    /// When present, the number of parsed depths must equal it.
    pub declared_count: Option<u32>,
}

impl UdRequest {
    pub fn new(depths: impl Into<String>, declared_count: Option<u32>) -> Self {
        Self {
            depths: depths.into(),
            declared_count,
        }
    }
}

/// The computed, not yet persisted, row set for one project.
#[derive(Clone, Debug, PartialEq, uniffi::Record)]
pub struct MetrajPlan {
    pub project_id: ProjectId,
    /// Depth the grid was generated against, after clamping.
    pub target_depth_m: f64,
    pub records: Vec<FieldRecord>,
    pub warnings: Vec<MetrajWarning>,
}

/// Halves go to the even centimetre.
fn round_cm(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Regular grid of sample depths from zero up to, but excluding, `target_depth_m`.
///
/// The running depth is rounded to centimetres after every step, so long
/// grids do not drift. A target that is an exact multiple of the step is
/// not itself emitted.
pub fn generate_grid(target_depth_m: f64, step_m: f64) -> Result<Vec<f64>, MetrajError> {
    if !target_depth_m.is_finite() || target_depth_m <= 0.0 {
        return Err(MetrajError::invalid_depth(target_depth_m));
    }
    if !step_m.is_finite() || step_m < crate::settings::MIN_STEP_M {
        return Err(MetrajError::InvalidSettings(format!(
            "step_m must be at least {}, got {step_m}",
            crate::settings::MIN_STEP_M
        )));
    }

    let mut depths = Vec::new();
    let mut current = 0.0;
    while current < target_depth_m {
        depths.push(current);
        current = round_cm(current + step_m);
    }
    debug!(
        rows = depths.len(),
        target_depth_m,
        last_depth_m = current,
        "generated depth grid"
    );
    Ok(depths)
}

/// Raise a requested depth shallower than one step up to one step.
/// Depths beyond `max_depth_m` are rejected.
pub fn clamp_target_depth(
    requested_m: f64,
    settings: &MetrajSettings,
) -> Result<(f64, Option<MetrajWarning>), MetrajError> {
    if !requested_m.is_finite() || requested_m <= 0.0 {
        return Err(MetrajError::invalid_depth(requested_m));
    }
    if requested_m > settings.max_depth_m {
        return Err(MetrajError::invalid_depth(format!(
            "{requested_m} is deeper than the {} m limit",
            settings.max_depth_m
        )));
    }
    if requested_m < settings.step_m {
        let warning = MetrajWarning::DepthClamped {
            requested_m,
            applied_m: settings.step_m,
        };
        return Ok((settings.step_m, Some(warning)));
    }
    Ok((requested_m, None))
}

/// Blank rows for every grid depth.
pub fn grid_records(
    project_id: ProjectId,
    target_depth_m: f64,
    settings: &MetrajSettings,
) -> Result<Vec<FieldRecord>, MetrajError> {
    Ok(generate_grid(target_depth_m, settings.step_m)?
        .into_iter()
        .map(|depth| FieldRecord::at_depth(project_id, depth, settings.sample_length_m))
        .collect())
}

/// Merge UD sample depths into a depth-ordered row set.
///
/// Depths are processed in ascending order and the n-th one is numbered
/// `UD-n`. A depth within tolerance of an existing row (grid or UD inserted
/// earlier in this pass) tags that row; any other depth becomes a new row
/// placed before the first deeper row. A repeated depth therefore retags the
/// row of the earlier one.
pub fn merge_ud_samples(
    mut records: Vec<FieldRecord>,
    project_id: ProjectId,
    ud_depths: &[f64],
    settings: &MetrajSettings,
) -> (Vec<FieldRecord>, Vec<MetrajWarning>) {
    let tolerance = settings.match_tolerance_m;
    let mut warnings = Vec::new();

    let mut sorted = ud_depths.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    for (index, ud_depth) in sorted.into_iter().enumerate() {
        let number = index + 1;
        if let Some(existing) = records
            .iter_mut()
            .find(|r| (r.depth_m - ud_depth).abs() < tolerance)
        {
            if existing.is_ud() {
                warnings.push(MetrajWarning::DuplicateUdDepth { depth_m: ud_depth });
            }
            existing.mark_ud(number, ud_depth, settings.sample_length_m);
            debug!(ud_depth, number, "UD sample tagged existing row");
            continue;
        }

        let mut row = FieldRecord::at_depth(project_id, ud_depth, settings.sample_length_m);
        row.mark_ud(number, ud_depth, settings.sample_length_m);
        let position = records
            .iter()
            .position(|r| r.depth_m > ud_depth)
            .unwrap_or(records.len());
        records.insert(position, row);
        debug!(ud_depth, number, position, "UD sample inserted new row");
    }

    (records, warnings)
}

/// Parse, count-check, and merge a UD request.
///
/// Any failure degrades to the unchanged grid plus a warning.
pub fn apply_ud_request(
    records: Vec<FieldRecord>,
    project_id: ProjectId,
    request: &UdRequest,
    settings: &MetrajSettings,
) -> (Vec<FieldRecord>, Vec<MetrajWarning>) {
    match checked_ud_depths(request) {
        Ok(depths) => merge_ud_samples(records, project_id, &depths, settings),
        Err(err) => {
            warn!(error = %err, "UD samples skipped");
            let warning = match err {
                MetrajError::CountMismatch { parsed, declared } => {
                    MetrajWarning::CountMismatch { parsed, declared }
                }
                other => MetrajWarning::UdParseFailed {
                    message: other.to_string(),
                },
            };
            (records, vec![warning])
        }
    }
}

fn checked_ud_depths(request: &UdRequest) -> Result<Vec<f64>, MetrajError> {
    let depths = parse_ud_depths(&request.depths)?;
    if let Some(declared) = request.declared_count {
        let parsed = depths.len() as u32;
        if parsed != declared {
            return Err(MetrajError::CountMismatch { parsed, declared });
        }
    }
    Ok(depths)
}

/// Compute the full row set for a project without touching any store.
pub fn plan(
    project_id: ProjectId,
    requested_depth_m: f64,
    ud: Option<&UdRequest>,
    settings: &MetrajSettings,
) -> Result<MetrajPlan, MetrajError> {
    settings.validate()?;
    let (target_depth_m, clamp_warning) = clamp_target_depth(requested_depth_m, settings)?;
    let mut warnings: Vec<MetrajWarning> = clamp_warning.into_iter().collect();

    let mut records = grid_records(project_id, target_depth_m, settings)?;
    if let Some(request) = ud {
        let (merged, ud_warnings) = apply_ud_request(records, project_id, request, settings);
        records = merged;
        warnings.extend(ud_warnings);
    }

    Ok(MetrajPlan {
        project_id,
        target_depth_m,
        records,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROJECT: ProjectId = ProjectId(1);

    fn depths(records: &[FieldRecord]) -> Vec<f64> {
        records.iter().map(|r| r.depth_m).collect()
    }

    #[test]
    fn test_grid_excludes_exact_multiple_target() {
        assert_eq!(generate_grid(4.5, 1.5).unwrap(), vec![0.0, 1.5, 3.0]);
        assert_eq!(generate_grid(45.0, 1.5).unwrap().len(), 30);
    }

    #[test]
    fn test_grid_count_for_non_multiples() {
        for (target, expected) in [(4.6, 4), (10.0, 7), (0.1, 1), (100.0, 67), (1.6, 2)] {
            let grid = generate_grid(target, 1.5).unwrap();
            assert_eq!(grid.len(), expected, "target {target}");
            assert!(*grid.last().unwrap() < target);
        }
    }

    #[test]
    fn test_grid_spacing_does_not_drift() {
        let grid = generate_grid(300.0, 1.5).unwrap();
        for (i, depth) in grid.iter().enumerate() {
            assert_eq!(*depth, round_cm(i as f64 * 1.5));
        }
        assert_eq!(*grid.last().unwrap(), 298.5);

        let grid = generate_grid(1.0, 0.1).unwrap();
        assert_eq!(grid.len(), 10);
        assert_eq!(grid[3], 0.3);
    }

    #[test]
    fn test_rounding_ties_go_to_even() {
        assert_eq!(round_cm(0.125), 0.12);
        assert_eq!(round_cm(0.375), 0.38);
        assert_eq!(generate_grid(0.2, 0.125).unwrap(), vec![0.0, 0.12]);
    }

    #[test]
    fn test_clamp_follows_configured_step() {
        let settings = MetrajSettings {
            step_m: 1.0,
            ..MetrajSettings::default()
        };
        let plan = plan(PROJECT, 0.5, None, &settings).unwrap();

        assert_eq!(plan.target_depth_m, 1.0);
        assert_eq!(depths(&plan.records), vec![0.0]);
    }

    #[test]
    fn test_plan_rejects_depth_beyond_limit() {
        let settings = MetrajSettings::default();
        assert!(matches!(
            plan(PROJECT, 1e13, None, &settings),
            Err(MetrajError::InvalidDepth { .. })
        ));
        assert_eq!(plan(PROJECT, 500.0, None, &settings).unwrap().records.len(), 334);
    }

    #[test]
    fn test_grid_rejects_non_positive_depth() {
        assert!(matches!(
            generate_grid(0.0, 1.5),
            Err(MetrajError::InvalidDepth { .. })
        ));
        assert!(matches!(
            generate_grid(-2.0, 1.5),
            Err(MetrajError::InvalidDepth { .. })
        ));
        assert!(matches!(
            generate_grid(f64::NAN, 1.5),
            Err(MetrajError::InvalidDepth { .. })
        ));
    }

    #[test]
    fn test_clamp_below_one_step() {
        let settings = MetrajSettings::default();
        let plan = plan(PROJECT, 0.5, None, &settings).unwrap();

        assert_eq!(plan.target_depth_m, 1.5);
        assert_eq!(depths(&plan.records), vec![0.0]);
        assert_eq!(
            plan.warnings,
            vec![MetrajWarning::DepthClamped {
                requested_m: 0.5,
                applied_m: 1.5
            }]
        );
    }

    #[test]
    fn test_generated_rows_are_blank() {
        let records = grid_records(PROJECT, 3.1, &MetrajSettings::default()).unwrap();
        assert_eq!(records.len(), 3);
        let row = &records[1];
        assert_eq!(row.casing_depth_m, 1.5);
        assert_eq!(row.sample_interval, "1.50-1.95");
        assert_eq!(row.well_tests, "");
        assert_eq!(row.sample_type_no, "");
        assert_eq!(row.n30, 0);
        assert_eq!(row.id, None);
    }

    #[test]
    fn test_exact_match_tags_existing_row() {
        let settings = MetrajSettings::default();
        let grid = grid_records(PROJECT, 4.5, &settings).unwrap();
        let (merged, warnings) = merge_ud_samples(grid, PROJECT, &[3.0], &settings);

        assert!(warnings.is_empty());
        assert_eq!(depths(&merged), vec![0.0, 1.5, 3.0]);
        assert_eq!(merged[2].well_tests, "UD");
        assert_eq!(merged[2].sample_type_no, "UD-1");
        assert_eq!(merged[2].sample_interval, "3.00-3.45");
    }

    #[test]
    fn test_near_match_within_tolerance() {
        let settings = MetrajSettings::default();
        let grid = grid_records(PROJECT, 4.5, &settings).unwrap();
        let (merged, _) = merge_ud_samples(grid, PROJECT, &[3.005], &settings);

        assert_eq!(merged.len(), 3);
        assert_eq!(merged[2].depth_m, 3.0);
        assert!(merged[2].is_ud());
    }

    #[test]
    fn test_unmatched_depth_inserted_in_order() {
        let settings = MetrajSettings::default();
        let grid = grid_records(PROJECT, 4.5, &settings).unwrap();
        let (merged, _) = merge_ud_samples(grid, PROJECT, &[2.0], &settings);

        assert_eq!(depths(&merged), vec![0.0, 1.5, 2.0, 3.0]);
        let inserted = &merged[2];
        assert_eq!(inserted.casing_depth_m, 2.0);
        assert_eq!(inserted.well_tests, "UD");
        assert_eq!(inserted.sample_type_no, "UD-1");
        assert_eq!(inserted.sample_interval, "2.00-2.45");
        assert_eq!(inserted.project_id, PROJECT);
        assert!(!merged[1].is_ud());
        assert!(!merged[3].is_ud());
    }

    #[test]
    fn test_ud_numbering_follows_depth_order() {
        let settings = MetrajSettings::default();
        let grid = grid_records(PROJECT, 9.0, &settings).unwrap();
        let (merged, _) = merge_ud_samples(grid, PROJECT, &[7.0, 2.0], &settings);

        let at = |d: f64| merged.iter().find(|r| r.depth_m == d).unwrap();
        assert_eq!(at(2.0).sample_type_no, "UD-1");
        assert_eq!(at(7.0).sample_type_no, "UD-2");
    }

    #[test]
    fn test_depth_past_grid_is_appended() {
        let settings = MetrajSettings::default();
        let grid = grid_records(PROJECT, 4.5, &settings).unwrap();
        let (merged, _) = merge_ud_samples(grid, PROJECT, &[4.5, 12.0], &settings);

        assert_eq!(depths(&merged), vec![0.0, 1.5, 3.0, 4.5, 12.0]);
        assert_eq!(merged[4].sample_type_no, "UD-2");
    }

    #[test]
    fn test_merge_result_sorted_without_duplicates() {
        let settings = MetrajSettings::default();
        let grid = grid_records(PROJECT, 20.0, &settings).unwrap();
        let ud = [18.25, 0.0, 4.5, 6.1, 6.105, 13.7, 1.2];
        let (merged, warnings) = merge_ud_samples(grid, PROJECT, &ud, &settings);

        for pair in merged.windows(2) {
            assert!(pair[1].depth_m - pair[0].depth_m >= settings.match_tolerance_m);
        }
        assert_eq!(
            warnings,
            vec![MetrajWarning::DuplicateUdDepth { depth_m: 6.105 }]
        );
        let ud_rows: Vec<&str> = merged
            .iter()
            .filter(|r| r.is_ud())
            .map(|r| r.sample_type_no.as_str())
            .collect();
        assert_eq!(ud_rows, vec!["UD-1", "UD-2", "UD-3", "UD-5", "UD-6", "UD-7"]);
    }

    #[test]
    fn test_repeated_depth_keeps_sorted_numbering() {
        let settings = MetrajSettings::default();
        let grid = grid_records(PROJECT, 9.0, &settings).unwrap();
        let (merged, warnings) = merge_ud_samples(grid, PROJECT, &[5.0, 2.0, 2.0], &settings);

        let ud_rows: Vec<(f64, &str)> = merged
            .iter()
            .filter(|r| r.is_ud())
            .map(|r| (r.depth_m, r.sample_type_no.as_str()))
            .collect();
        assert_eq!(ud_rows, vec![(2.0, "UD-2"), (5.0, "UD-3")]);
        assert_eq!(
            warnings,
            vec![MetrajWarning::DuplicateUdDepth { depth_m: 2.0 }]
        );
    }

    #[test]
    fn test_near_repeat_retags_with_its_own_interval() {
        let settings = MetrajSettings::default();
        let grid = grid_records(PROJECT, 4.5, &settings).unwrap();
        let (merged, _) = merge_ud_samples(grid, PROJECT, &[3.0, 3.008], &settings);

        assert_eq!(merged.len(), 3);
        assert_eq!(merged[2].depth_m, 3.0);
        assert_eq!(merged[2].sample_type_no, "UD-2");
        assert_eq!(merged[2].sample_interval, "3.01-3.46");
    }

    #[test]
    fn test_count_mismatch_keeps_grid() {
        let settings = MetrajSettings::default();
        let ud = UdRequest::new("2.0", Some(2));
        let plan = plan(PROJECT, 4.5, Some(&ud), &settings).unwrap();

        assert_eq!(depths(&plan.records), vec![0.0, 1.5, 3.0]);
        assert!(plan.records.iter().all(|r| !r.is_ud()));
        assert_eq!(
            plan.warnings,
            vec![MetrajWarning::CountMismatch {
                parsed: 1,
                declared: 2
            }]
        );
    }

    #[test]
    fn test_unparseable_ud_keeps_grid() {
        let settings = MetrajSettings::default();
        let ud = UdRequest::new("two metres", Some(1));
        let plan = plan(PROJECT, 4.5, Some(&ud), &settings).unwrap();

        assert_eq!(plan.records.len(), 3);
        assert!(matches!(
            plan.warnings.as_slice(),
            [MetrajWarning::UdParseFailed { .. }]
        ));
    }

    #[test]
    fn test_plan_is_deterministic() {
        let settings = MetrajSettings::default();
        let ud = UdRequest::new("7,0 2,0", Some(2));
        let first = plan(PROJECT, 10.0, Some(&ud), &settings).unwrap();
        let second = plan(PROJECT, 10.0, Some(&ud), &settings).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_plan_rejects_invalid_depth() {
        let settings = MetrajSettings::default();
        assert!(matches!(
            plan(PROJECT, 0.0, None, &settings),
            Err(MetrajError::InvalidDepth { .. })
        ));
    }

    #[test]
    fn test_warning_messages() {
        let warning = MetrajWarning::CountMismatch {
            parsed: 1,
            declared: 2,
        };
        assert_eq!(
            warning.to_string(),
            "UD depth count (1) does not match UD count (2); metraj was generated without UD samples."
        );
    }
}
