//! This crate contains acceptance tests for the *cert_checker*.
//!
//! Each test runs the `cert_checker` binary (which has to be installed and in the `PATH`)
//! on a JSON-serialized project from the `samples` directory
//! and counts the number of generated warnings.

use colored::*;
use std::process::Command;

/// A test case containing the necessary information to run an acceptance test.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct CheckTestCase {
    /// The name of the sample project (without file extension)
    sample: &'static str,
    /// The name of the *cert_checker*-check to execute
    check_name: &'static str,
}

impl CheckTestCase {
    /// Create a new test case running the given check on the given sample.
    pub fn new(sample: &'static str, check_name: &'static str) -> CheckTestCase {
        CheckTestCase { sample, check_name }
    }

    /// Get the file path of the sample project
    fn get_filepath(&self) -> String {
        format!("samples/{}.json", self.sample)
    }

    /// Run the test case and print to the shell, whether the test case succeeded or not.
    /// Returns stdout + stderr of the test execution on failure.
    pub fn run_test(
        &self,
        search_string: &str,
        num_expected_occurences: usize,
    ) -> Result<(), String> {
        let filepath = self.get_filepath();
        let output = Command::new("cert_checker")
            .arg(&filepath)
            .arg("--partial")
            .arg(self.check_name)
            .arg("--quiet")
            .output()
            .map_err(|err| format!("Could not execute cert_checker: {err}"))?;
        if output.status.success() {
            let num_warnings = String::from_utf8_lossy(&output.stdout)
                .lines()
                .filter(|line| line.starts_with(search_string))
                .count();
            if num_warnings == num_expected_occurences {
                println!("{} \t {}", filepath, "[OK]".green());
                Ok(())
            } else {
                println!("{} \t {}", filepath, "[FAILED]".red());
                Err(format!(
                    "Expected occurrences: {num_expected_occurences}. Found: {num_warnings}"
                ))
            }
        } else {
            println!("{} \t {}", filepath, "[FAILED]".red());
            match output.status.code() {
                Some(_code) => Err(String::from_utf8_lossy(&output.stdout).to_string()
                    + &String::from_utf8_lossy(&output.stderr)),
                None => Err(format!("Execution failed for file {filepath}")),
            }
        }
    }
}

/// Print the error messages of failed checks.
/// The `error_log` tuples are of the form `(check_filename, error_message)`.
pub fn print_errors(error_log: Vec<(String, String)>) {
    for (filepath, error) in error_log {
        println!("{}", format!("+++ Error for {filepath} +++").red());
        println!("{error}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore]
    fn exp42() {
        let mut error_log = Vec::new();
        let test_case = CheckTestCase::new("exp42", "EXP42");
        for (search_string, num_expected_occurences) in [("[EXP42]", 2), ("[OOP57]", 1)] {
            if let Err(error) = test_case.run_test(search_string, num_expected_occurences) {
                error_log.push((test_case.get_filepath(), error));
            }
        }
        if !error_log.is_empty() {
            print_errors(error_log);
            panic!();
        }
    }

    #[test]
    #[ignore]
    fn exp51() {
        let mut error_log = Vec::new();
        let test_case = CheckTestCase::new("exp51", "EXP51");
        // Two of the three functions delete an array through a base class pointer.
        if let Err(error) = test_case.run_test("[EXP51]", 2) {
            error_log.push((test_case.get_filepath(), error));
        }
        if !error_log.is_empty() {
            print_errors(error_log);
            panic!();
        }
    }
}
