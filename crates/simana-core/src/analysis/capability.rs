use super::error::AnalysisError;
use std::collections::HashSet;
use std::fmt;

/// A capability an analysis may depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// Static structure analyses (contact map, B-factor profile).
    StructureAnalysis,
    /// Multi-frame analyses (DCCM).
    TrajectoryAnalysis,
    /// Image rendering of analysis results.
    Plotting,
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Feature::StructureAnalysis => "structure-analysis",
            Feature::TrajectoryAnalysis => "trajectory-analysis",
            Feature::Plotting => "plotting",
        };
        f.write_str(name)
    }
}

/// Answers which [`Feature`]s the running deployment provides.
pub trait Capabilities: Send + Sync {
    fn is_available(&self, feature: Feature) -> bool;
}

/// Reports the features compiled into this build.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinCapabilities;

impl Capabilities for BuiltinCapabilities {
    fn is_available(&self, feature: Feature) -> bool {
        match feature {
            Feature::StructureAnalysis | Feature::TrajectoryAnalysis => true,
            Feature::Plotting => cfg!(feature = "plotting"),
        }
    }
}

/// A fixed feature set, independent of how the crate was compiled.
#[derive(Debug, Clone, Default)]
pub struct FixedCapabilities {
    available: HashSet<Feature>,
}

impl FixedCapabilities {
    pub fn new(features: impl IntoIterator<Item = Feature>) -> Self {
        Self {
            available: features.into_iter().collect(),
        }
    }

    pub fn all() -> Self {
        Self::new([
            Feature::StructureAnalysis,
            Feature::TrajectoryAnalysis,
            Feature::Plotting,
        ])
    }
}

impl Capabilities for FixedCapabilities {
    fn is_available(&self, feature: Feature) -> bool {
        self.available.contains(&feature)
    }
}

/// Fails with [`AnalysisError::DependencyUnavailable`] for the first missing feature.
pub fn require(
    capabilities: &dyn Capabilities,
    features: &[Feature],
) -> Result<(), AnalysisError> {
    match features.iter().find(|f| !capabilities.is_available(**f)) {
        Some(&missing) => Err(AnalysisError::DependencyUnavailable(missing)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_always_provides_analyses() {
        let caps = BuiltinCapabilities;
        assert!(caps.is_available(Feature::StructureAnalysis));
        assert!(caps.is_available(Feature::TrajectoryAnalysis));
        assert_eq!(
            caps.is_available(Feature::Plotting),
            cfg!(feature = "plotting")
        );
    }

    #[test]
    fn require_reports_first_missing_feature() {
        let caps = FixedCapabilities::new([Feature::StructureAnalysis]);

        assert!(require(&caps, &[Feature::StructureAnalysis]).is_ok());
        let err = require(&caps, &[Feature::StructureAnalysis, Feature::Plotting]).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::DependencyUnavailable(Feature::Plotting)
        ));
    }

    #[test]
    fn feature_names_are_kebab_case() {
        assert_eq!(Feature::TrajectoryAnalysis.to_string(), "trajectory-analysis");
    }
}
