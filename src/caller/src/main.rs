//! This crate defines the command line interface for the cert_checker.
//! General documentation about the cert_checker is contained in the [`cert_checker_lib`] crate.

extern crate cert_checker_lib; // Needed for the docstring-link to work

use cert_checker_lib::pipeline::{load_project, AnalysisResults};
use cert_checker_lib::utils::log::{add_debug_log_statistics, print_all_messages, LogMessage};
use cert_checker_lib::utils::{get_default_config, read_config_file};
use cert_checker_lib::CheckModule;
use std::collections::HashSet;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
/// Find comparisons of padding data and mismatched array deletes in C and C++ translation units
struct CmdlineArgs {
    /// The path to the JSON-serialized project of the translation unit.
    #[structopt(required_unless("module-versions"), validator(check_file_existence))]
    project: Option<String>,

    /// Path to a custom configuration file to use instead of the standard one.
    #[structopt(long, short, validator(check_file_existence))]
    config: Option<String>,

    /// Write the results to a file instead of stdout.
    /// This only affects warnings. Log messages are still printed to stdout.
    #[structopt(long, short)]
    out: Option<String>,

    /// Specify a specific set of checks to be run as a comma separated list, e.g. 'EXP42,EXP51'.
    ///
    /// Use the "--module-versions" command line option to get a list of all valid check names.
    #[structopt(long, short)]
    partial: Option<String>,

    /// Generate JSON output.
    #[structopt(long, short)]
    json: bool,

    /// Do not print log messages. This prevents polluting stdout for json output.
    #[structopt(long, short)]
    quiet: bool,

    /// Prints out the version numbers of all known modules.
    #[structopt(long)]
    module_versions: bool,

    /// Include various statistics in the debug log messages.
    /// This can be helpful for assessing the analysis quality for the input project.
    #[structopt(long)]
    statistics: bool,
}

fn main() {
    let cmdline_args = CmdlineArgs::from_args();

    if let Err(err) = run(cmdline_args) {
        eprintln!("Error: {err:#}");
        std::process::exit(101);
    }
}

/// Check the existence of a file
fn check_file_existence(file_path: String) -> Result<(), String> {
    if std::fs::metadata(&file_path)
        .map_err(|err| format!("{}", err))?
        .is_file()
    {
        Ok(())
    } else {
        Err(format!("{} is not a file.", file_path))
    }
}

/// Run the cert_checker on the project given in the command line arguments.
fn run(args: CmdlineArgs) -> Result<(), anyhow::Error> {
    let mut modules = cert_checker_lib::get_modules();
    if args.module_versions {
        // Only print the module versions and then quit.
        println!("[cert_checker] module_versions:");
        for module in modules.iter() {
            println!("{}", module);
        }
        return Ok(());
    }

    // Get the configuration file
    let config: serde_json::Value = if let Some(config_path) = args.config {
        let file = std::io::BufReader::new(std::fs::File::open(config_path)?);
        serde_json::from_reader(file)
            .map_err(|err| anyhow::anyhow!("Parsing of the configuration file failed: {err}"))?
    } else {
        // Fall back to the bundled configuration if no configuration file is installed.
        read_config_file("config.json").or_else(|_| get_default_config())?
    };

    // Filter the modules to be executed if the `--partial` parameter is set.
    if let Some(ref partial_module_list) = args.partial {
        filter_modules_for_partial_run(&mut modules, partial_module_list)?;
    }

    let project_file_path = PathBuf::from(
        args.project
            .ok_or_else(|| anyhow::anyhow!("No project file given"))?,
    );
    let (project, mut all_logs) = load_project(&project_file_path)?;

    let analysis_results = AnalysisResults::new(&project);
    let padding_analysis = analysis_results.compute_padding_analysis();
    let analysis_results = analysis_results.with_padding_analysis(Some(&padding_analysis));

    // Execute the modules and collect their logs and warnings.
    let mut all_warnings = Vec::new();
    for module in modules {
        let (mut logs, mut warnings) = (module.run)(&analysis_results, &config[&module.name]);
        all_logs.append(&mut logs);
        all_warnings.append(&mut warnings);
    }

    if args.statistics {
        all_logs.push(LogMessage::new_info(format!(
            "Analyzed {} functions and {} record types.",
            project.program.term.subs.len(),
            project.records.len()
        )));
        add_debug_log_statistics(&mut all_logs);
    }

    // Print the results of the modules.
    if args.quiet {
        all_logs = Vec::new(); // Suppress all log messages since the `--quiet` flag is set.
    }
    print_all_messages(all_logs, all_warnings, args.out.as_deref(), args.json)
}

/// Only keep the modules specified by the `--partial` parameter in the `modules` list.
/// The parameter is a comma-separated list of module names, e.g. 'EXP42,EXP51'.
fn filter_modules_for_partial_run(
    modules: &mut Vec<&CheckModule>,
    partial_param: &str,
) -> Result<(), anyhow::Error> {
    let module_names: HashSet<&str> = partial_param.split(',').collect();
    let mut selected_modules = Vec::new();
    for module_name in module_names {
        if let Some(module) = modules.iter().find(|module| module.name == module_name) {
            selected_modules.push(*module);
        } else if !module_name.is_empty() {
            return Err(anyhow::anyhow!("{} is not a valid module name.", module_name));
        }
    }
    *modules = selected_modules;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_runs() {
        let mut modules = cert_checker_lib::get_modules();
        filter_modules_for_partial_run(&mut modules, "EXP51,").unwrap();
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].name, "EXP51");

        let mut modules = cert_checker_lib::get_modules();
        assert!(filter_modules_for_partial_run(&mut modules, "EXP42,CWE476").is_err());
    }
}
