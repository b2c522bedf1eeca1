/*!
The main library of the cert_checker containing all checks and analysis modules.

# What is the cert_checker

The cert_checker is a lint for C and C++ translation units that looks for two classes of
memory-representation bugs described by the SEI CERT coding standards:

- **EXP42-C / OOP57-CPP**: comparing structured records byte-wise (e.g. with `memcmp`)
  although the compared bytes contain padding or the record has no standard layout.
- **EXP51-CPP**: deleting an array through a pointer whose pointee type differs
  from the element type used in the corresponding `new[]` expression.

The cert_checker does not parse source code itself.
It consumes a JSON-serialized [`Project`](crate::intermediate_representation::Project)
produced by a compiler front-end plugin.
The project contains the record definitions of the translation unit
(optionally with the record layouts computed by the compiler)
and the function bodies as basic blocks of simple statements.

# Usage

```sh
cert_checker PROJECT.json
```
One can modify the behaviour of the cert_checker through the command line.
Use the `--help` command line option for more information.
One can also provide a custom configuration file to modify the behaviour of each check
through the `--config` command line option.
Start by taking a look at the standard configuration file located at `src/config.json`
and read the [check-specific documentation](crate::checkers) for more details about each field in the configuration file.

# Further documentation

You can find out more information about each check, including known false positives and false negatives,
by reading the check-specific module documentation in the [`checkers`] module.
*/

pub mod analysis;
pub mod checkers;
pub mod intermediate_representation;
pub mod pipeline;
pub mod utils;

use utils::log::{CheckWarning, LogMessage};

mod prelude {
    pub use serde::{Deserialize, Serialize};

    pub use crate::intermediate_representation::{ByteSize, Term, Tid};
    pub use crate::pipeline::AnalysisResults;
    pub use anyhow::Context as _;
    pub use anyhow::{anyhow, Error};
}
use prelude::*;

/// The generic function signature for the main function of a check module
pub type CheckModuleFn =
    fn(&AnalysisResults, &serde_json::Value) -> (Vec<LogMessage>, Vec<CheckWarning>);

/// A structure containing general information about a check module,
/// including the function to be called to run the analysis.
pub struct CheckModule {
    /// The name of the check.
    pub name: &'static str,
    /// The version number of the check.
    /// Should be incremented whenever significant changes are made to the check.
    pub version: &'static str,
    /// The function that executes the check and returns the warnings found during the check.
    pub run: CheckModuleFn,
}

impl std::fmt::Display for CheckModule {
    /// Print the module name and its version number.
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, r#""{}": "{}""#, self.name, self.version)
    }
}

/// Get a list of all known analysis modules.
pub fn get_modules() -> Vec<&'static CheckModule> {
    vec![
        &crate::checkers::exp42::CHECK_MODULE,
        &crate::checkers::exp51::CHECK_MODULE,
    ]
}
