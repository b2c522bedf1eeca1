//! This module contains functions and structs helpful for building a complete analysis pipeline
//! starting from the path of a project file.

mod results;
pub use results::AnalysisResults;

use crate::intermediate_representation::Project;
use crate::prelude::*;
use crate::utils::log::LogMessage;
use std::path::Path;

/// Read the JSON-serialized project at the given path and normalize it.
///
/// If successful, returns the project and the log messages generated during normalization.
pub fn load_project(project_file_path: &Path) -> Result<(Project, Vec<LogMessage>), Error> {
    let file = std::fs::File::open(project_file_path).with_context(|| {
        format!(
            "Could not open project file {}",
            project_file_path.display()
        )
    })?;
    let mut project: Project = serde_json::from_reader(std::io::BufReader::new(file))
        .context("Could not parse the project file")?;
    let logs = project.normalize();
    Ok((project, logs))
}
