use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectId(pub i64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldRecordId(pub i64);

uniffi::custom_newtype!(ProjectId, i64);
uniffi::custom_newtype!(FieldRecordId, i64);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for FieldRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Marker written to `well_tests` for undisturbed-sample rows.
pub const UD_MARKER: &str = "UD";

#[derive(Clone, Debug, PartialEq)]
pub struct Project {
    pub id: Option<ProjectId>,
    pub name: String,
    pub contractor: Option<String>,
    pub responsible_engineer: Option<String>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            contractor: None,
            responsible_engineer: None,
        }
    }
}

/// Land-registry ("tapu") parcel data, one per project.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LandRegistry {
    pub project_id: ProjectId,
    pub province: Option<String>,
    pub district: Option<String>,
    pub neighbourhood: Option<String>,
    pub block_no: Option<String>,
    pub sheet_no: Option<String>,
    pub parcel_no: Option<String>,
    pub coord_x: Option<f64>,
    pub coord_y: Option<f64>,
}

/// Drilling parameters ("sondaj bilgileri"), one per project.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrillingInfo {
    pub project_id: ProjectId,
    pub driller_name: Option<String>,
    pub collar_elevation_m: Option<f64>,
    pub drilling_depth_m: Option<f64>,
    /// ISO-8601 date.
    pub start_date: Option<String>,
    /// ISO-8601 date.
    pub end_date: Option<String>,
    pub borehole_diameter_mm: Option<f64>,
    pub groundwater_level_m: Option<f64>,
    pub ud_samples_note: Option<String>,
    pub soil_type: Option<String>,
    pub machine_type: Option<String>,
    pub spt_hammer_type: Option<String>,
}

/// One depth-indexed row of field and lab measurements ("arazi bilgisi").
#[derive(Clone, Debug, PartialEq, uniffi::Record)]
pub struct FieldRecord {
    pub id: Option<FieldRecordId>,
    pub project_id: ProjectId,
    pub depth_m: f64,
    pub casing_depth_m: f64,
    pub well_tests: String,
    pub sample_interval: String,
    pub sample_type_no: String,
    pub spt_0_15: i32,
    pub spt_15_30: i32,
    pub spt_30_45: i32,
    pub n30: i32,
    pub t_max: f64,
    pub t_remoulded: f64,
    pub cohesion_kpa: f64,
    pub friction_angle_deg: f64,
    pub natural_unit_weight_kn_m3: f64,
    pub dry_unit_weight_kn_m3: f64,
    pub soil_profile: String,
    pub soil_description: String,
}

impl FieldRecord {
    /// Blank generated row at `depth_m`. Casing depth mirrors the depth and
    /// every measurement starts at zero or empty.
    pub fn at_depth(project_id: ProjectId, depth_m: f64, sample_length_m: f64) -> Self {
        Self {
            id: None,
            project_id,
            depth_m,
            casing_depth_m: depth_m,
            well_tests: String::new(),
            sample_interval: sample_interval(depth_m, sample_length_m),
            sample_type_no: String::new(),
            spt_0_15: 0,
            spt_15_30: 0,
            spt_30_45: 0,
            n30: 0,
            t_max: 0.0,
            t_remoulded: 0.0,
            cohesion_kpa: 0.0,
            friction_angle_deg: 0.0,
            natural_unit_weight_kn_m3: 0.0,
            dry_unit_weight_kn_m3: 0.0,
            soil_profile: String::new(),
            soil_description: String::new(),
        }
    }

    /// Tag this row as the `number`-th UD sample (1-based) taken at `ud_depth_m`.
    pub fn mark_ud(&mut self, number: usize, ud_depth_m: f64, sample_length_m: f64) {
        self.well_tests = UD_MARKER.to_string();
        self.sample_type_no = format!("UD-{number}");
        self.sample_interval = sample_interval(ud_depth_m, sample_length_m);
    }

    pub fn is_ud(&self) -> bool {
        self.well_tests == UD_MARKER
    }

    /// Copy of the row with the storage id cleared, for comparing row sets
    /// across regenerations.
    pub fn without_id(&self) -> Self {
        Self {
            id: None,
            ..self.clone()
        }
    }
}

/// Physical recovery interval of a sample starting at `depth_m`.
pub fn sample_interval(depth_m: f64, sample_length_m: f64) -> String {
    format!("{:.2}-{:.2}", depth_m, depth_m + sample_length_m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_interval_format() {
        assert_eq!(sample_interval(0.0, 0.45), "0.00-0.45");
        assert_eq!(sample_interval(1.5, 0.45), "1.50-1.95");
        assert_eq!(sample_interval(7.25, 0.45), "7.25-7.70");
    }

    #[test]
    fn test_mark_ud_rewrites_markers() {
        let mut record = FieldRecord::at_depth(ProjectId(1), 3.0, 0.45);
        assert!(!record.is_ud());

        record.mark_ud(2, 3.004, 0.45);
        assert!(record.is_ud());
        assert_eq!(record.sample_type_no, "UD-2");
        assert_eq!(record.sample_interval, "3.00-3.45");
        assert_eq!(record.depth_m, 3.0);
    }
}
