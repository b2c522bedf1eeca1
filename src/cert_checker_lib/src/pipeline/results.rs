use crate::analysis::padding::PaddingAnalysis;
use crate::intermediate_representation::Project;

/// A struct containing pointers to all known analysis results
/// that may be needed as input for the checks.
#[derive(Clone, Copy)]
pub struct AnalysisResults<'a> {
    /// A pointer to the project struct
    pub project: &'a Project,
    /// The padding analysis if already computed.
    /// Sharing one analysis between checks lets them share its cache of used bits per record.
    pub padding_analysis: Option<&'a PaddingAnalysis<'a>>,
}

impl<'a> AnalysisResults<'a> {
    /// Create a new `AnalysisResults` struct with only the project itself known.
    pub fn new(project: &'a Project) -> AnalysisResults<'a> {
        AnalysisResults {
            project,
            padding_analysis: None,
        }
    }

    /// Create a padding analysis with an empty cache.
    /// The result gets returned, but not saved to the `AnalysisResults` struct itself.
    pub fn compute_padding_analysis(&self) -> PaddingAnalysis<'a> {
        PaddingAnalysis::new(self.project)
    }

    /// Create a new `AnalysisResults` struct containing the given padding analysis.
    pub fn with_padding_analysis(
        self,
        padding_analysis: Option<&'a PaddingAnalysis<'a>>,
    ) -> AnalysisResults<'a> {
        AnalysisResults {
            padding_analysis,
            ..self
        }
    }
}
