//! Engine options: every recognized knob is an explicit field, validated
//! at construction. There is no free-form option merging.

use crate::domain::{FocalPlane, ModelKind, ModelTopology, PostError, PostResult};
use crate::modules::topology;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    /// Component composition of the fits being processed.
    pub topology: ModelTopology,
    /// Overrides the detector inference from artifact file names.
    pub focal_plane: Option<FocalPlane>,
    /// Additional query terms resolved alongside the topology-derived ones.
    pub extra_query_terms: Vec<String>,
    /// Whether to read the gain companion store for gain-varying artifacts.
    pub read_gain: bool,
}

impl EngineOptions {
    pub fn new(topology: ModelTopology) -> Self {
        Self {
            topology,
            focal_plane: None,
            extra_query_terms: Vec::new(),
            read_gain: true,
        }
    }

    pub fn with_focal_plane(mut self, focal_plane: FocalPlane) -> Self {
        self.focal_plane = Some(focal_plane);
        self
    }

    pub fn without_gain(mut self) -> Self {
        self.read_gain = false;
        self
    }

    pub fn with_extra_query_terms(mut self, terms: Vec<String>) -> PostResult<Self> {
        if terms.iter().any(|term| term.trim().is_empty()) {
            return Err(PostError::input_validation(
                "INPUT.OPTIONS",
                "extra query terms must not be blank",
            ));
        }
        self.extra_query_terms = terms;
        Ok(self)
    }

    /// Query terms for one discovery pass: normalization always, the
    /// kind-specific terms the topology needs, the fixed metadata names,
    /// then any caller extensions.
    pub(crate) fn query_terms(&self) -> Vec<String> {
        let mut terms = vec!["normalisation".to_string()];
        if topology::has_kind(self.topology, ModelKind::Thermal) {
            terms.push("temperature".to_string());
        }
        if topology::has_kind(self.topology, ModelKind::BrokenPowerLaw) {
            terms.push("break".to_string());
            terms.push("photonindex".to_string());
        }
        for fixed in ["EXPOSURE", "STATISTIC", "factor"] {
            terms.push(fixed.to_string());
        }
        terms.extend(self.extra_query_terms.iter().cloned());
        terms
    }
}

#[cfg(test)]
mod tests {
    use super::EngineOptions;
    use crate::domain::ModelTopology;

    #[test]
    fn query_terms_follow_the_topology_kinds() {
        let thermal_only = EngineOptions::new(ModelTopology::TwoThermal).query_terms();
        assert!(thermal_only.contains(&"temperature".to_string()));
        assert!(!thermal_only.contains(&"break".to_string()));

        let mixed = EngineOptions::new(ModelTopology::ThermalBroken).query_terms();
        for expected in [
            "normalisation",
            "temperature",
            "break",
            "photonindex",
            "EXPOSURE",
            "STATISTIC",
            "factor",
        ] {
            assert!(
                mixed.contains(&expected.to_string()),
                "missing term '{}'",
                expected
            );
        }
    }

    #[test]
    fn blank_extra_terms_are_rejected() {
        let error = EngineOptions::new(ModelTopology::OneThermal)
            .with_extra_query_terms(vec!["gainSlope".to_string(), "  ".to_string()])
            .expect_err("blank term should be rejected");
        assert_eq!(error.placeholder(), "INPUT.OPTIONS");
    }

    #[test]
    fn extra_terms_are_appended() {
        let options = EngineOptions::new(ModelTopology::OneThermal)
            .with_extra_query_terms(vec!["gainSlope".to_string()])
            .expect("valid terms should be accepted");
        assert_eq!(
            options.query_terms().last().map(String::as_str),
            Some("gainSlope")
        );
    }
}
