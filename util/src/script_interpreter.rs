//! # Scenario script interpreter module
//!
//! This module provides an interpreter for scenario scripts, allowing
//! commands to be issued to an executable at given simulation times.
//!
//! A script is a sequence of `<time_s>: <json>;` entries, for example:
//!
//! ```text
//! 0.0: {"type": "place_robot", "x": 100.0, "y": 100.0};
//! 1.5: {"type": "start"};
//! ```
//!
//! The JSON payload is deserialised into whichever command type the 
//! executable uses.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::fs;
use regex::RegexBuilder;
use serde::de::DeserializeOwned;
use thiserror::Error;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A command which is scripted to occur at a specific time.
#[derive(Debug)]
struct Command<C> {
    /// The time the command is supposed to execute at
    exec_time_s: f64,

    /// The command to run
    cmd: C
}

/// A script interpreter.
///
/// After initialising with the path to the script to run use `.get_pending`
/// to acquire a list of commands that need executing.
#[derive(Debug)]
pub struct ScriptInterpreter<C> {
    script_path: Option<PathBuf>,
    cmds: VecDeque<Command<C>>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0:?}")]
    ScriptNotFound(PathBuf),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error(
        "Script contains an invalid timestamp: {0}. \
        Should be a float (like 1.0)")]
    InvalidTimestamp(String),

    #[error("Script contains an invalid command at {0} s: {1}")]
    InvalidCmd(f64, serde_json::Error),

    #[error("Script timestamps must not decrease ({1} s follows {0} s)")]
    OutOfOrder(f64, f64)
}

/// Commands which are due for execution.
#[derive(Debug, PartialEq)]
pub enum PendingCmds<C> {
    None,
    Some(Vec<C>),
    EndOfScript
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<C> ScriptInterpreter<C>
where
    C: DeserializeOwned
{

    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {

        let path = PathBuf::from(script_path.as_ref());
        
        if !path.exists() {
            return Err(ScriptError::ScriptNotFound(path));
        }

        let script = fs::read_to_string(&path)
            .map_err(ScriptError::ScriptLoadError)?;

        let mut si = Self::from_script(&script)?;
        si.script_path = Some(path);

        Ok(si)
    }

    /// Create a new interpreter from the contents of a script.
    pub fn from_script(script: &str) -> Result<Self, ScriptError> {

        let mut cmd_queue: VecDeque<Command<C>> = VecDeque::new();

        // Each entry is `time: payload;`, one per line
        let re = RegexBuilder::
            new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
            .multi_line(true)
            .build()
            .expect("script regex is valid");

        for cap in re.captures_iter(script) {
            let exec_time_s: f64 = cap[1].parse()
                .map_err(|e| ScriptError::InvalidTimestamp(format!("{}", e)))?;

            let cmd: C = serde_json::from_str(&cap[3])
                .map_err(|e| ScriptError::InvalidCmd(exec_time_s, e))?;

            if let Some(prev) = cmd_queue.back() {
                if exec_time_s < prev.exec_time_s {
                    return Err(ScriptError::OutOfOrder(prev.exec_time_s, exec_time_s))
                }
            }

            cmd_queue.push_back(Command {
                exec_time_s,
                cmd
            });
        }

        if cmd_queue.is_empty() {
            return Err(ScriptError::ScriptEmpty)
        }

        Ok(ScriptInterpreter {
            script_path: None,
            cmds: cmd_queue
        })
    }

    /// Return the commands whose execution time is at or before `now_s`.
    pub fn get_pending(&mut self, now_s: f64) -> PendingCmds<C> {

        // If the queue is empty the script is over
        if self.cmds.is_empty() {
            return PendingCmds::EndOfScript
        }

        let mut cmd_vec: Vec<C> = vec![];

        while let Some(front) = self.cmds.front() {
            if front.exec_time_s > now_s {
                break
            }
            if let Some(c) = self.cmds.pop_front() {
                cmd_vec.push(c.cmd);
            }
        }

        if cmd_vec.is_empty() {
            PendingCmds::None
        }
        else {
            PendingCmds::Some(cmd_vec)
        }
    }

    /// Get the number of commands remaining in the script
    pub fn get_num_cmds(&self) -> usize {
        self.cmds.len()
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        match self.cmds.back() {
            Some(c) => c.exec_time_s,
            None => 0f64
        }
    }

    /// The path the script was loaded from, if it came from a file.
    pub fn script_path(&self) -> Option<&Path> {
        self.script_path.as_deref()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(tag = "type", rename_all = "snake_case")]
    enum Cmd {
        Go { speed: f64 },
        Halt
    }

    #[test]
    fn test_pending() {
        let script = "\
            0.0: {\"type\": \"go\", \"speed\": 2.0};\n\
            0.0: {\"type\": \"halt\"};\n\
            2.5: {\"type\": \"go\", \"speed\": 1.0};\n";

        let mut si: ScriptInterpreter<Cmd> = ScriptInterpreter::from_script(script).unwrap();

        assert_eq!(si.get_num_cmds(), 3);
        assert_eq!(si.get_duration(), 2.5);

        assert_eq!(
            si.get_pending(0.0), 
            PendingCmds::Some(vec![Cmd::Go { speed: 2.0 }, Cmd::Halt])
        );
        assert_eq!(si.get_pending(1.0), PendingCmds::None);
        assert_eq!(si.get_pending(2.5), PendingCmds::Some(vec![Cmd::Go { speed: 1.0 }]));
        assert_eq!(si.get_pending(3.0), PendingCmds::EndOfScript);
    }

    #[test]
    fn test_bad_scripts() {
        match ScriptInterpreter::<Cmd>::from_script("nothing to see here") {
            Err(ScriptError::ScriptEmpty) => (),
            r => panic!("Expected empty script error, got {:?}", r)
        }

        match ScriptInterpreter::<Cmd>::from_script("1.0: {\"type\": \"fly\"};") {
            Err(ScriptError::InvalidCmd(t, _)) => assert_eq!(t, 1.0),
            r => panic!("Expected invalid command error, got {:?}", r)
        }

        match ScriptInterpreter::<Cmd>::from_script(
            "2.0: {\"type\": \"halt\"};\n1.0: {\"type\": \"halt\"};"
        ) {
            Err(ScriptError::OutOfOrder(a, b)) => {
                assert_eq!(a, 2.0);
                assert_eq!(b, 1.0);
            },
            r => panic!("Expected out of order error, got {:?}", r)
        }

        match ScriptInterpreter::<Cmd>::new("/definitely/not/a/script.rss") {
            Err(ScriptError::ScriptNotFound(_)) => (),
            r => panic!("Expected not found error, got {:?}", r)
        }
    }
}
