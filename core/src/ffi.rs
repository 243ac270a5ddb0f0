//! Functions exported to the front ends.
//!
//! Previews run without a store attached; the caller passes the drilling
//! depth it already holds for the project.

use crate::error::MetrajError;
use crate::form::MetrajForm;
use crate::metraj::{MetrajPlan, MetrajWarning};
use crate::models::{FieldRecord, ProjectId};
use crate::profile::{self, SoilLayer, SptPoint};
use crate::service;
use crate::settings::MetrajSettings;

#[uniffi::export]
pub fn default_metraj_settings() -> MetrajSettings {
    MetrajSettings::default()
}

#[uniffi::export]
pub fn preview_metraj_from_form(
    project_id: ProjectId,
    form: MetrajForm,
    drilling_depth_m: Option<f64>,
    settings: MetrajSettings,
) -> Result<MetrajPlan, MetrajError> {
    let request = form.into_request()?;
    service::preview_with_drilling_depth(project_id, &request, drilling_depth_m, &settings)
}

/// Message shown to the user for a warning.
#[uniffi::export]
pub fn describe_metraj_warning(warning: MetrajWarning) -> String {
    warning.to_string()
}

#[uniffi::export]
pub fn spt_profile(records: Vec<FieldRecord>) -> Vec<SptPoint> {
    profile::spt_series(&records)
}

#[uniffi::export]
pub fn soil_profile(records: Vec<FieldRecord>) -> Vec<SoilLayer> {
    profile::soil_layers(&records)
}
