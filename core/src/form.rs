//! Adapter from the raw metraj form to a typed request.

use crate::error::MetrajError;
use crate::metraj::{parse_count, parse_decimal, MetrajWarning, UdRequest};

/// Metraj form fields exactly as submitted.
#[derive(Clone, Debug, Default, PartialEq, uniffi::Record)]
pub struct MetrajForm {
    /// Blank means "use the drilling depth stored for the project".
    pub target_depth: String,
    pub has_ud_samples: bool,
    pub ud_depths: String,
    /// Blank means the UD count is not checked.
    pub ud_count: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetrajRequest {
    pub target_depth_m: Option<f64>,
    pub ud: Option<UdRequest>,
    /// Problems found while reading the form that did not stop it.
    pub warnings: Vec<MetrajWarning>,
}

impl MetrajRequest {
    pub fn with_depth(target_depth_m: f64) -> Self {
        Self {
            target_depth_m: Some(target_depth_m),
            ..Self::default()
        }
    }

    pub fn with_ud(mut self, depths: impl Into<String>, declared_count: Option<u32>) -> Self {
        self.ud = Some(UdRequest::new(depths, declared_count));
        self
    }
}

impl MetrajForm {
    pub fn into_request(self) -> Result<MetrajRequest, MetrajError> {
        let target_depth_m = match self.target_depth.trim() {
            "" => None,
            raw => Some(parse_decimal(raw).ok_or_else(|| MetrajError::invalid_depth(raw))?),
        };

        let mut warnings = Vec::new();
        let ud = if self.has_ud_samples && !self.ud_depths.trim().is_empty() {
            match self.ud_count.trim() {
                "" => Some(UdRequest::new(self.ud_depths, None)),
                raw => match parse_count(raw) {
                    Some(count) => Some(UdRequest::new(self.ud_depths, Some(count))),
                    None => {
                        warnings.push(MetrajWarning::UdParseFailed {
                            message: format!("UD count '{raw}' is not a whole number"),
                        });
                        None
                    }
                },
            }
        } else {
            None
        };

        Ok(MetrajRequest {
            target_depth_m,
            ud,
            warnings,
        })
    }
}
