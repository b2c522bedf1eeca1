//! Structs and functions for generating log messages and check warnings.

use crate::prelude::*;
use std::{collections::BTreeMap, thread::JoinHandle};

/// An additional message attached to a location on the path leading to a warning,
/// e.g. pointing to the allocation site of a deleted array.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, PartialOrd, Ord)]
pub struct PathNote {
    /// The source location the note refers to.
    pub address: String,
    /// The term ID of the statement the note refers to.
    pub tid: String,
    /// The text of the note.
    pub text: String,
}

impl PathNote {
    /// Create a note attached to the given term.
    pub fn new(tid: &Tid, text: impl ToString) -> PathNote {
        PathNote {
            address: tid.address.clone(),
            tid: tid.to_string(),
            text: text.to_string(),
        }
    }
}

impl std::fmt::Display for PathNote {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}: note: {}", self.address, self.text)
    }
}

/// A warning generated by a check.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, PartialOrd, Ord, Default)]
pub struct CheckWarning {
    /// A short name of the rule that is violated, e.g. `EXP42`.
    pub name: String,
    /// The version number of the check.
    pub version: String,
    /// Source locations associated with the warning.
    /// The first address denotes the program point where the warning was generated.
    pub addresses: Vec<String>,
    /// Term IDs associated to the warning.
    /// More exact than the addresses if several terms share a source location.
    pub tids: Vec<String>,
    /// Symbol names (e.g. type or function names) associated to the warning.
    pub symbols: Vec<String>,
    /// Notes at other locations on the path leading to the warning.
    pub notes: Vec<PathNote>,
    /// A short description of the warning that is presented to the user.
    /// Should contain all essential information necessary to understand the warning,
    /// including the source location for which the warning was generated.
    pub description: String,
}

impl CheckWarning {
    /// Creates a new CheckWarning by only setting name, version and description
    pub fn new(
        name: impl ToString,
        version: impl ToString,
        description: impl ToString,
    ) -> CheckWarning {
        CheckWarning {
            name: name.to_string(),
            version: version.to_string(),
            addresses: Vec::new(),
            tids: Vec::new(),
            symbols: Vec::new(),
            notes: Vec::new(),
            description: description.to_string(),
        }
    }

    /// Sets the address field of the CheckWarning
    pub fn addresses(mut self, addresses: Vec<String>) -> CheckWarning {
        self.addresses = addresses;
        self
    }

    /// Sets the Tids field of the CheckWarning
    pub fn tids(mut self, tids: Vec<String>) -> CheckWarning {
        self.tids = tids;
        self
    }

    /// Sets the symbols field of the CheckWarning
    pub fn symbols(mut self, symbols: Vec<String>) -> CheckWarning {
        self.symbols = symbols;
        self
    }

    /// Sets the notes field of the CheckWarning
    pub fn notes(mut self, notes: Vec<PathNote>) -> CheckWarning {
        self.notes = notes;
        self
    }
}

impl std::fmt::Display for CheckWarning {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "[{}] ({}) {}",
            self.name, self.version, self.description
        )?;
        for note in self.notes.iter() {
            write!(formatter, "\n    {note}")?;
        }
        Ok(())
    }
}

/// A generic log message.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, PartialOrd, Ord)]
pub struct LogMessage {
    /// The log message.
    pub text: String,
    /// The severity/type of the log message.
    pub level: LogLevel,
    /// The term inside the translation unit that the message is related to.
    pub location: Option<Tid>,
    /// The analysis where the message originated.
    pub source: Option<String>,
}

impl LogMessage {
    /// Create a new `Info`-level log message
    pub fn new_info(text: impl Into<String>) -> LogMessage {
        LogMessage {
            text: text.into(),
            level: LogLevel::Info,
            location: None,
            source: None,
        }
    }

    /// Create a new `Debug`-level log message
    pub fn new_debug(text: impl Into<String>) -> LogMessage {
        LogMessage {
            text: text.into(),
            level: LogLevel::Debug,
            location: None,
            source: None,
        }
    }

    /// Create a new `Error`-level log message
    pub fn new_error(text: impl Into<String>) -> LogMessage {
        LogMessage {
            text: text.into(),
            level: LogLevel::Error,
            location: None,
            source: None,
        }
    }

    /// Associate a specific location to the log message.
    pub fn location(mut self, location: Tid) -> LogMessage {
        self.location = Some(location);
        self
    }

    /// Set the name of the source analysis for the log message.
    pub fn source(mut self, source: impl Into<String>) -> LogMessage {
        self.source = Some(source.into());
        self
    }
}

/// The severity/type of a log message.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, PartialOrd, Ord)]
pub enum LogLevel {
    /// Messages intended for debugging.
    Debug,
    /// Errors encountered during analysis.
    Error,
    /// Non-error messages intended for the user.
    Info,
}

impl std::fmt::Display for LogMessage {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.level {
            LogLevel::Debug => write!(formatter, "DEBUG: ")?,
            LogLevel::Error => write!(formatter, "ERROR: ")?,
            LogLevel::Info => write!(formatter, "INFO: ")?,
        };
        match (&self.source, &self.location) {
            (Some(source), Some(location)) => {
                write!(formatter, "{} @ {}: ", source, location.address)?
            }
            (Some(source), None) => write!(formatter, "{}: ", source)?,
            (None, Some(location)) => write!(formatter, "{}: ", location.address)?,
            (None, None) => (),
        };
        write!(formatter, "{}", self.text)
    }
}

/// Print all provided log messages and warnings.
///
/// Log messages will always be printed to `stdout`.
/// Warnings will either be printed to `stdout` or to the file path provided in `out_path`.
///
/// If `emit_json` is set, the warnings will be converted to json for the output.
pub fn print_all_messages(
    logs: Vec<LogMessage>,
    warnings: Vec<CheckWarning>,
    out_path: Option<&str>,
    emit_json: bool,
) -> Result<(), Error> {
    for log in logs {
        println!("{}", log);
    }
    let output: String = if emit_json {
        serde_json::to_string_pretty(&warnings)?
    } else {
        warnings
            .iter()
            .map(|warning| format!("{}\n", warning))
            .collect()
    };
    if let Some(file_path) = out_path {
        std::fs::write(file_path, output)
            .with_context(|| format!("Writing to output path {} failed", file_path))?;
    } else {
        print!("{}", output);
    }
    Ok(())
}

/// For each analysis count the number of debug log messages in `all_logs`
/// and add a (INFO level) log message with the resulting number to `all_logs`.
/// Also count and log the number of general debug log messages.
pub fn add_debug_log_statistics(all_logs: &mut Vec<LogMessage>) {
    let mut analysis_debug_log_count = BTreeMap::new();
    let mut general_debug_log_count = 0u64;
    for log in all_logs.iter().filter(|log| log.level == LogLevel::Debug) {
        if let Some(analysis) = &log.source {
            analysis_debug_log_count
                .entry(analysis.clone())
                .and_modify(|count| *count += 1)
                .or_insert(1u64);
        } else {
            general_debug_log_count += 1;
        }
    }
    for (analysis, count) in analysis_debug_log_count {
        all_logs.push(LogMessage::new_info(format!("Logged {} debug log messages.", count)).source(analysis));
    }
    if general_debug_log_count > 0 {
        all_logs.push(LogMessage::new_info(format!(
            "Logged {} general debug log messages.",
            general_debug_log_count
        )));
    }
}

/// The message types a logging thread can receive.
/// See the [`LogThread`] type for more information.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, PartialOrd, Ord)]
pub enum LogThreadMsg {
    /// A normal log message.
    Log(LogMessage),
    /// A check warning
    Warning(CheckWarning),
    /// If the log collector thread receives this signal,
    /// it should stop receiving new messages
    /// and instead terminate and return the collected messages prior to receiving the termination signal.
    Terminate,
}

impl From<LogMessage> for LogThreadMsg {
    fn from(msg: LogMessage) -> Self {
        Self::Log(msg)
    }
}

impl From<CheckWarning> for LogThreadMsg {
    fn from(warning: CheckWarning) -> Self {
        Self::Warning(warning)
    }
}

/// A type for managing threads for collecting log messages.
///
/// With [`LogThread::spawn()`] one can create a new log thread
/// whose handle is contained in the returned `LogThread` struct.
/// By calling the [`collect()`](LogThread::collect()) method
/// one can tell the log thread to shut down
/// and return the logs collected to this point.
/// If the `LogThread` object gets dropped before calling `collect()`,
/// the corresponding logging thread will be stopped
/// and all collected logs will be discarded.
///
/// If one deliberately wants to discard all logging messages,
/// one can simply create a sender to a disconnected channel
/// via [`LogThread::create_disconnected_sender()`].
pub struct LogThread {
    msg_sender: crossbeam_channel::Sender<LogThreadMsg>,
    thread_handle: Option<JoinHandle<(Vec<LogMessage>, Vec<CheckWarning>)>>,
}

impl Drop for LogThread {
    /// If the logging thread still exists,
    /// send it the `Terminate` signal.
    /// Then wait until the logging thread stopped.
    fn drop(&mut self) {
        let _ = self.msg_sender.send(LogThreadMsg::Terminate);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl LogThread {
    /// Create a new `LogThread` object with a handle to a freshly spawned logging collector thread.
    ///
    /// The parameter is the function containing the actual log collection logic.
    /// I.e. the function should receive messages through the given receiver until the channel disconnects
    /// or until it receives a [`LogThreadMsg::Terminate`] message.
    /// After that it should return the logs collected up to that point.
    ///
    /// See [`LogThread::collect_and_deduplicate`] for a standard collector function that can be used here.
    pub fn spawn<F>(collector_func: F) -> LogThread
    where
        F: FnOnce(crossbeam_channel::Receiver<LogThreadMsg>) -> (Vec<LogMessage>, Vec<CheckWarning>)
            + Send
            + 'static,
    {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let thread_handle = std::thread::spawn(move || collector_func(receiver));
        LogThread {
            msg_sender: sender,
            thread_handle: Some(thread_handle),
        }
    }

    /// Just create a disconnected sender to a (non-existing) logging thread.
    /// Can be used like a sender to a channel that deliberately discards all messages sent to it.
    pub fn create_disconnected_sender() -> crossbeam_channel::Sender<LogThreadMsg> {
        let (sender, _) = crossbeam_channel::unbounded();
        sender
    }

    /// Get a sender that can be used to send messages to the logging thread corresponding to this `LogThread` instance.
    pub fn get_msg_sender(&self) -> crossbeam_channel::Sender<LogThreadMsg> {
        self.msg_sender.clone()
    }

    /// Stop the logging thread by sending it the `Terminate` signal
    /// and then return all logs collected until that point.
    ///
    /// If the logging thread panicked, no logs are returned.
    pub fn collect(mut self) -> (Vec<LogMessage>, Vec<CheckWarning>) {
        let _ = self.msg_sender.send(LogThreadMsg::Terminate);
        self.thread_handle
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default()
    }

    /// This function collects logs from the given receiver until a [`LogThreadMsg::Terminate`] signal is received.
    /// All collected logs are deduplicated before being returned.
    ///
    /// Log messages are deduplicated if two messages share the same term of origin.
    /// Warnings are deduplicated if two warnings have the same name and the same term of origin,
    /// i.e. the same first term ID.
    /// This removes duplicate warnings generated on different paths through the same function.
    /// In such a case only the last message received is kept.
    /// Warnings without term IDs are deduplicated by their first address instead
    /// and warnings without any location are never deduplicated.
    ///
    /// This function can be used as a standard collector function for [`LogThread::spawn`].
    pub fn collect_and_deduplicate(
        receiver: crossbeam_channel::Receiver<LogThreadMsg>,
    ) -> (Vec<LogMessage>, Vec<CheckWarning>) {
        let mut logs_with_location = BTreeMap::new();
        let mut general_logs = Vec::new();
        let mut warnings_with_location = BTreeMap::new();
        let mut general_warnings = Vec::new();

        while let Ok(log_thread_msg) = receiver.recv() {
            match log_thread_msg {
                LogThreadMsg::Log(log_message) => {
                    if let Some(ref tid) = log_message.location {
                        logs_with_location.insert(tid.clone(), log_message);
                    } else {
                        general_logs.push(log_message);
                    }
                }
                LogThreadMsg::Warning(warning) => {
                    match warning.tids.first().or_else(|| warning.addresses.first()) {
                        Some(origin) => {
                            warnings_with_location
                                .insert((origin.clone(), warning.name.clone()), warning);
                        }
                        None => general_warnings.push(warning),
                    }
                }
                LogThreadMsg::Terminate => break,
            }
        }
        let logs = logs_with_location
            .into_values()
            .chain(general_logs)
            .collect();
        let warnings = warnings_with_location
            .into_values()
            .chain(general_warnings)
            .collect();
        (logs, warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deduplicate_warnings_from_several_paths() {
        let log_thread = LogThread::spawn(LogThread::collect_and_deduplicate);
        let sender = log_thread.get_msg_sender();
        let warning = CheckWarning::new("EXP51", "0.1", "first path")
            .addresses(vec!["test.cpp:10:3".to_string()])
            .tids(vec!["delete_stmt".to_string()]);
        let second_path = CheckWarning {
            description: "second path".to_string(),
            ..warning.clone()
        };
        let other_check = CheckWarning {
            name: "OTHER".to_string(),
            ..warning.clone()
        };
        sender.send(warning.into()).unwrap();
        sender.send(second_path.into()).unwrap();
        sender.send(other_check.into()).unwrap();
        sender
            .send(CheckWarning::new("EXP42", "0.1", "no location").into())
            .unwrap();
        sender
            .send(LogMessage::new_debug("general").into())
            .unwrap();
        sender
            .send(LogMessage::new_debug("first").location(Tid::new("stmt")).into())
            .unwrap();
        sender
            .send(LogMessage::new_debug("second").location(Tid::new("stmt")).into())
            .unwrap();
        let (logs, warnings) = log_thread.collect();
        assert_eq!(warnings.len(), 3);
        assert_eq!(warnings[0].description, "second path");
        assert_eq!(warnings[1].name, "OTHER");
        assert_eq!(warnings[2].description, "no location");
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].text, "second");
    }

    #[test]
    fn debug_log_statistics() {
        let mut logs = vec![
            LogMessage::new_debug("a").source("EXP42"),
            LogMessage::new_debug("b").source("EXP42"),
            LogMessage::new_debug("c"),
            LogMessage::new_error("d").source("EXP51"),
        ];
        add_debug_log_statistics(&mut logs);
        assert_eq!(logs.len(), 6);
        assert_eq!(
            logs[4],
            LogMessage::new_info("Logged 2 debug log messages.").source("EXP42")
        );
        assert_eq!(
            logs[5].text,
            "Logged 1 general debug log messages.".to_string()
        );
    }

    #[test]
    fn warning_display_with_notes() {
        let warning = CheckWarning::new("EXP51", "0.1", "description")
            .notes(vec![PathNote::new(
                &Tid::new("new").with_address("test.cpp:3:14"),
                "allocated here",
            )]);
        assert_eq!(
            format!("{warning}"),
            "[EXP51] (0.1) description\n    test.cpp:3:14: note: allocated here"
        );
    }
}
