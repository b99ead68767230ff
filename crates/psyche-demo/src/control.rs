//! Line-based parameter control on stdin.
//!
//! `name=value` sets a parameter, `?` prints the current values as JSON,
//! `reset` drops the motion reference and `quit` stops the run loop.

use std::io::BufRead;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use psyche_core::{FrameProcessor, ParamError, ParameterSet};
use psyche_engine::StopHandle;

/// One parsed control line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Set { name: String, value: f64 },
    Query,
    /// Forget the flow reference so the next frame primes again.
    ResetFlow,
    Quit,
}

/// What the control surface can reach in a running session.
#[derive(Clone)]
pub struct Controls {
    pub params: Arc<ParameterSet>,
    pub stop: StopHandle,
    pub processor: Arc<Mutex<FrameProcessor>>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ControlError {
    #[error("expected `name=value`, `?`, `reset` or `quit`, got {0:?}")]
    Malformed(String),

    #[error("invalid number {0:?}")]
    BadNumber(String),
}

/// Parse one line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>, ControlError> {
    let line = line.trim();
    match line {
        "" => Ok(None),
        "?" => Ok(Some(Command::Query)),
        "reset" => Ok(Some(Command::ResetFlow)),
        "quit" | "q" | "exit" => Ok(Some(Command::Quit)),
        _ => {
            let (name, value) = line
                .split_once('=')
                .ok_or_else(|| ControlError::Malformed(line.to_string()))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(ControlError::Malformed(line.to_string()));
            }
            let value = value.trim();
            let value: f64 = value
                .parse()
                .map_err(|_| ControlError::BadNumber(value.to_string()))?;
            Ok(Some(Command::Set {
                name: name.to_string(),
                value,
            }))
        }
    }
}

/// Apply a command. Returns the text to echo back, if any.
pub fn execute(command: Command, controls: &Controls) -> Result<Option<String>, ParamError> {
    match command {
        Command::Set { name, value } => {
            let stored = controls.params.set_parameter(&name, value)?;
            Ok(Some(format!("{name}={stored}")))
        }
        Command::Query => Ok(controls.params.values_json().ok()),
        Command::ResetFlow => {
            controls.processor.lock().reset_flow();
            tracing::info!("flow reference reset");
            Ok(None)
        }
        Command::Quit => {
            controls.stop.stop();
            Ok(None)
        }
    }
}

/// Read commands from stdin on a background thread until EOF or `quit`.
pub fn spawn_stdin_control(controls: Controls) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("psyche-control".into())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                let command = match parse_command(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(err) => {
                        tracing::warn!(error = %err, "ignoring control line");
                        continue;
                    }
                };
                let quitting = command == Command::Quit;
                match execute(command, &controls) {
                    Ok(Some(reply)) => println!("{reply}"),
                    Ok(None) => {}
                    Err(err) => tracing::warn!(error = %err, "parameter update rejected"),
                }
                if quitting {
                    break;
                }
            }
            tracing::debug!("control input closed");
        })
}

#[cfg(test)]
mod tests {
    use psyche_core::Frame;
    use psyche_core::params::{DOSAGE, TILES};

    use super::*;

    fn controls() -> Controls {
        let params = Arc::new(ParameterSet::standard());
        Controls {
            processor: Arc::new(Mutex::new(FrameProcessor::new(Arc::clone(&params)))),
            params,
            stop: StopHandle::new(),
        }
    }

    #[test]
    fn test_parse_set() {
        assert_eq!(
            parse_command(" dosage = 250.5 "),
            Ok(Some(Command::Set {
                name: "dosage".into(),
                value: 250.5
            }))
        );
    }

    #[test]
    fn test_parse_keywords_and_blank() {
        assert_eq!(parse_command("?"), Ok(Some(Command::Query)));
        assert_eq!(parse_command("reset"), Ok(Some(Command::ResetFlow)));
        assert_eq!(parse_command("quit"), Ok(Some(Command::Quit)));
        assert_eq!(parse_command("   "), Ok(None));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_command("dosage"), Err(ControlError::Malformed(_))));
        assert!(matches!(parse_command("=4"), Err(ControlError::Malformed(_))));
        assert!(matches!(parse_command("tiles=lots"), Err(ControlError::BadNumber(_))));
    }

    #[test]
    fn test_execute_updates_and_stops() {
        let controls = controls();

        let reply = execute(
            Command::Set {
                name: TILES.into(),
                value: 99.0,
            },
            &controls,
        )
        .unwrap();
        assert_eq!(reply.as_deref(), Some("tiles=20"));

        let json = execute(Command::Query, &controls).unwrap().unwrap();
        let values: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(values[DOSAGE], 100.0);

        let unknown = Command::Set {
            name: "gain".into(),
            value: 1.0,
        };
        assert!(execute(unknown, &controls).is_err());
        execute(Command::Quit, &controls).unwrap();
        assert!(controls.stop.is_stopped());
    }

    #[test]
    fn test_reset_reprimes_flow() {
        let controls = controls();
        let frame = Frame::filled(16, 16, [40, 80, 120]);
        controls.processor.lock().process(&frame).unwrap();
        assert!(controls.processor.lock().flow_state().is_primed());

        assert_eq!(execute(Command::ResetFlow, &controls), Ok(None));
        assert!(!controls.processor.lock().flow_state().is_primed());
    }
}
