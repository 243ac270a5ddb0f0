//! Depth profile series for the borehole log charts.
//!
//! Pure functions over field records, no storage access.

use crate::models::FieldRecord;

/// SPT N30 consistency band, drawn as reference lines on the N30 chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum SptBand {
    /// N30 below 10
    Loose,
    /// 10 to 30
    MediumDense,
    /// 30 to 50
    Dense,
    /// 50 and above, usually refusal
    VeryDense,
}

impl SptBand {
    pub fn from_n30(n30: i32) -> Self {
        if n30 < 10 {
            SptBand::Loose
        } else if n30 < 30 {
            SptBand::MediumDense
        } else if n30 < 50 {
            SptBand::Dense
        } else {
            SptBand::VeryDense
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SptBand::Loose => "Gevşek",
            SptBand::MediumDense => "Orta sıkı",
            SptBand::Dense => "Sıkı",
            SptBand::VeryDense => "Çok sıkı",
        }
    }
}

#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct SptPoint {
    pub depth_m: f64,
    pub n30: i32,
    pub band: SptBand,
}

#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct SoilLayer {
    pub top_m: f64,
    pub bottom_m: f64,
    pub description: String,
}

fn sorted_by_depth(records: &[FieldRecord]) -> Vec<&FieldRecord> {
    let mut rows: Vec<&FieldRecord> = records.iter().collect();
    rows.sort_by(|a, b| a.depth_m.total_cmp(&b.depth_m));
    rows
}

/// Recorded N30 against depth. Rows without an N30 entry are skipped.
pub fn spt_series(records: &[FieldRecord]) -> Vec<SptPoint> {
    sorted_by_depth(records)
        .into_iter()
        .filter(|r| r.n30 != 0)
        .map(|r| SptPoint {
            depth_m: r.depth_m,
            n30: r.n30,
            band: SptBand::from_n30(r.n30),
        })
        .collect()
}

/// Soil layers from the described rows. A description covers the interval
/// from the previous described row down to its own depth; consecutive rows
/// with the same description form one layer.
pub fn soil_layers(records: &[FieldRecord]) -> Vec<SoilLayer> {
    let mut layers: Vec<SoilLayer> = Vec::new();
    let mut top_m = 0.0;

    for row in sorted_by_depth(records) {
        let description = row.soil_description.trim();
        if description.is_empty() {
            continue;
        }
        let continues = layers
            .last()
            .is_some_and(|layer| layer.description == description);
        if continues {
            if let Some(layer) = layers.last_mut() {
                layer.bottom_m = row.depth_m;
            }
        } else {
            layers.push(SoilLayer {
                top_m,
                bottom_m: row.depth_m,
                description: description.to_string(),
            });
        }
        top_m = row.depth_m;
    }

    layers.retain(|layer| layer.bottom_m > layer.top_m);
    layers
}
