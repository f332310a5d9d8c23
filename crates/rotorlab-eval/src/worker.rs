//! JSON-lines client for simulator worker processes.
//!
//! Each request is one line `{"id": n, "method": "...", "params": {...}}` written to the
//! worker's stdin. The worker answers with one line on stdout, either
//! `{"id": n, "result": ...}` or `{"id": n, "error": "message"}`; the `id` may be omitted.
//! The worker's stderr is passed through untouched, so stdout is reserved for responses.
//!
//! Methods:
//!
//! | method             | params                           | result                        |
//! |--------------------|----------------------------------|-------------------------------|
//! | `run_episode`      | `{"robot": ..., "target": [3]}`  | `{"rewards": [..], "poses": [[7], ..]}` |
//! | `analyze_airframe` | `{"robot": ...}`                 | `[m0, m1]`                    |
//! | `farm_power`       | `{"layout": {"positions": ..}}`  | power as a number             |

use std::{
    io::{self, BufRead, BufReader, Write},
    process::{Child, ChildStdin, ChildStdout, Command, ExitStatus, Stdio},
};

use rotorlab_design::{robot::RobotParameter, turbine::TurbineLayout};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    EvalError,
    simulator::{AirframeAnalyzer, Episode, FlightSimulator, WindFarmSimulator},
};

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum WorkerError {
    #[display("failed to spawn worker `{program}`")]
    Spawn { program: String, source: io::Error },
    #[display("worker I/O failed")]
    #[from]
    Io(io::Error),
    #[display("failed to encode `{method}` request")]
    Encode {
        method: String,
        source: serde_json::Error,
    },
    #[display("failed to decode `{method}` response")]
    Decode {
        method: String,
        source: serde_json::Error,
    },
    #[display("protocol violation in `{method}`: {reason}")]
    Protocol { method: String, reason: String },
    #[display("worker closed its output before answering `{method}`")]
    Closed { method: String },
    #[display("worker reported an error in `{method}`: {message}")]
    Remote { method: String, message: String },
}

#[derive(Debug, Serialize)]
struct Request<'a, P: ?Sized> {
    id: u64,
    method: &'a str,
    params: &'a P,
}

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Request/response channel over a line-oriented reader and writer.
#[derive(Debug)]
pub struct JsonLineChannel<R, W> {
    reader: R,
    writer: W,
    next_id: u64,
}

impl<R, W> JsonLineChannel<R, W>
where
    R: BufRead,
    W: Write,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            next_id: 1,
        }
    }

    /// Sends one request and blocks until its response arrives.
    pub fn call<P, T>(&mut self, method: &str, params: &P) -> Result<T, WorkerError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let id = self.next_id;
        self.next_id += 1;

        let request = Request { id, method, params };
        let mut line = serde_json::to_string(&request).map_err(|source| WorkerError::Encode {
            method: method.to_owned(),
            source,
        })?;
        line.push('\n');
        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()?;
        tracing::trace!(id, method, "request sent");

        let response = self.read_response(method)?;
        if let Some(response_id) = response.id
            && response_id != id
        {
            return Err(WorkerError::Protocol {
                method: method.to_owned(),
                reason: format!("expected response id {id}, got {response_id}"),
            });
        }
        if let Some(message) = response.error {
            return Err(WorkerError::Remote {
                method: method.to_owned(),
                message,
            });
        }
        let value = response.result.ok_or_else(|| WorkerError::Protocol {
            method: method.to_owned(),
            reason: "response has neither `result` nor `error`".to_owned(),
        })?;
        serde_json::from_value(value).map_err(|source| WorkerError::Decode {
            method: method.to_owned(),
            source,
        })
    }

    /// Returns the underlying reader and writer.
    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }

    fn read_response(&mut self, method: &str) -> Result<Response, WorkerError> {
        let mut buf = String::new();
        loop {
            buf.clear();
            if self.reader.read_line(&mut buf)? == 0 {
                return Err(WorkerError::Closed {
                    method: method.to_owned(),
                });
            }
            let line = buf.trim();
            if line.is_empty() {
                continue;
            }
            return serde_json::from_str(line).map_err(|source| WorkerError::Decode {
                method: method.to_owned(),
                source,
            });
        }
    }
}

/// Program and arguments that start a worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// A running worker process.
///
/// Dropping the client closes the worker's stdin, kills the worker if it has not exited
/// yet and reaps it. Use [`WorkerClient::shutdown`] to let it exit on its own.
#[derive(Debug)]
pub struct WorkerClient {
    program: String,
    child: Child,
    channel: Option<JsonLineChannel<BufReader<ChildStdout>, ChildStdin>>,
}

impl WorkerClient {
    pub fn spawn(command: &WorkerCommand) -> Result<Self, WorkerError> {
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| WorkerError::Spawn {
                program: command.program.clone(),
                source,
            })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(WorkerError::Protocol {
                method: "spawn".to_owned(),
                reason: "worker pipes are unavailable".to_owned(),
            });
        };

        tracing::info!(program = %command.program, pid = child.id(), "worker started");
        Ok(Self {
            program: command.program.clone(),
            child,
            channel: Some(JsonLineChannel::new(BufReader::new(stdout), stdin)),
        })
    }

    pub fn call<P, T>(&mut self, method: &str, params: &P) -> Result<T, WorkerError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let channel = self.channel.as_mut().ok_or_else(|| WorkerError::Closed {
            method: method.to_owned(),
        })?;
        channel.call(method, params)
    }

    /// Closes the worker's stdin and waits for it to exit.
    pub fn shutdown(mut self) -> Result<ExitStatus, WorkerError> {
        drop(self.channel.take());
        let status = self.child.wait()?;
        tracing::info!(program = %self.program, %status, "worker exited");
        Ok(status)
    }
}

impl Drop for WorkerClient {
    fn drop(&mut self) {
        if self.channel.take().is_none() {
            return;
        }
        match self.child.try_wait() {
            Ok(Some(status)) => {
                tracing::debug!(program = %self.program, %status, "worker already exited");
            }
            Ok(None) | Err(_) => {
                if let Err(e) = self.child.kill() {
                    tracing::debug!(program = %self.program, error = %e, "worker already gone");
                }
                let _ = self.child.wait();
            }
        }
    }
}

#[derive(Serialize)]
struct EpisodeParams<'a> {
    robot: &'a RobotParameter,
    target: [f64; 3],
}

#[derive(Serialize)]
struct RobotParams<'a> {
    robot: &'a RobotParameter,
}

#[derive(Serialize)]
struct LayoutParams<'a> {
    layout: &'a TurbineLayout,
}

impl FlightSimulator for WorkerClient {
    fn run_episode(
        &mut self,
        robot: &RobotParameter,
        target: [f64; 3],
    ) -> Result<Episode, EvalError> {
        Ok(self.call("run_episode", &EpisodeParams { robot, target })?)
    }
}

impl AirframeAnalyzer for WorkerClient {
    fn analyze(&mut self, robot: &RobotParameter) -> Result<[f64; 2], EvalError> {
        Ok(self.call("analyze_airframe", &RobotParams { robot })?)
    }
}

impl WindFarmSimulator for WorkerClient {
    fn farm_power(&mut self, layout: &TurbineLayout) -> Result<f64, EvalError> {
        Ok(self.call("farm_power", &LayoutParams { layout })?)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use serde_json::json;

    use super::*;

    fn channel(responses: &str) -> JsonLineChannel<Cursor<Vec<u8>>, Vec<u8>> {
        JsonLineChannel::new(Cursor::new(responses.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_call_writes_request_line() {
        let mut channel = channel("{\"id\": 1, \"result\": [0.5, -0.25]}\n");
        let margins: [f64; 2] = channel.call("analyze_airframe", &json!({"robot": null})).unwrap();
        assert_eq!(margins, [0.5, -0.25]);

        let (_, written) = channel.into_inner();
        let written = String::from_utf8(written).unwrap();
        assert!(written.ends_with('\n'));
        let request: serde_json::Value = serde_json::from_str(written.trim()).unwrap();
        assert_eq!(
            request,
            json!({"id": 1, "method": "analyze_airframe", "params": {"robot": null}})
        );
    }

    #[test]
    fn test_ids_increment_and_may_be_omitted() {
        let mut channel = channel("{\"result\": 1.0}\n\n{\"id\": 2, \"result\": 2.0}\n");
        assert_eq!(channel.call::<_, f64>("farm_power", &()).unwrap(), 1.0);
        assert_eq!(channel.call::<_, f64>("farm_power", &()).unwrap(), 2.0);
    }

    #[test]
    fn test_mismatched_id_is_protocol_error() {
        let mut channel = channel("{\"id\": 7, \"result\": 1.0}\n");
        let err = channel.call::<_, f64>("farm_power", &()).unwrap_err();
        assert!(matches!(err, WorkerError::Protocol { .. }), "{err:?}");
    }

    #[test]
    fn test_remote_error() {
        let mut channel = channel("{\"error\": \"no CUDA device\"}\n");
        let err = channel.call::<_, f64>("run_episode", &()).unwrap_err();
        assert!(
            matches!(&err, WorkerError::Remote { method, message }
                if method == "run_episode" && message == "no CUDA device")
        );
    }

    #[test]
    fn test_eof_is_closed() {
        let mut channel = channel("");
        let err = channel.call::<_, f64>("farm_power", &()).unwrap_err();
        assert!(matches!(err, WorkerError::Closed { .. }));
    }

    #[test]
    fn test_missing_result_and_bad_payload() {
        let mut channel = channel("{\"id\": 1}\nnot json\n");
        let err = channel.call::<_, f64>("farm_power", &()).unwrap_err();
        assert!(matches!(err, WorkerError::Protocol { .. }));
        let err = channel.call::<_, f64>("farm_power", &()).unwrap_err();
        assert!(matches!(err, WorkerError::Decode { .. }));
    }

    #[test]
    fn test_spawn_missing_program() {
        let command = WorkerCommand {
            program: "/nonexistent/rotorlab-worker".to_owned(),
            args: vec![],
        };
        let err = WorkerClient::spawn(&command).unwrap_err();
        assert!(matches!(err, WorkerError::Spawn { .. }));
    }

    #[cfg(unix)]
    fn shell_worker(script: &str) -> WorkerClient {
        WorkerClient::spawn(&WorkerCommand {
            program: "sh".to_owned(),
            args: vec!["-c".to_owned(), script.to_owned()],
        })
        .unwrap()
    }

    #[cfg(unix)]
    #[test]
    fn test_process_worker_round_trip() {
        let mut client =
            shell_worker(r#"while read -r line; do echo '{"result": 1234.5}'; done"#);
        let layout = TurbineLayout::from_positions(vec![[0.0, 0.0], [500.0, 500.0]]);
        assert_eq!(client.farm_power(&layout).unwrap(), 1234.5);
        assert_eq!(client.farm_power(&layout).unwrap(), 1234.5);
        assert!(client.shutdown().unwrap().success());
    }

    #[cfg(unix)]
    #[test]
    fn test_dropped_worker_is_reaped() {
        use std::time::{Duration, Instant};

        for script in ["cat >/dev/null", "exec sleep 30"] {
            let client = shell_worker(script);
            let start = Instant::now();
            drop(client);
            assert!(
                start.elapsed() < Duration::from_secs(10),
                "dropping `{script}` blocked"
            );
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_process_worker_error_becomes_eval_error() {
        let mut client =
            shell_worker(r#"while read -r line; do echo '{"error": "simulator crashed"}'; done"#);
        let layout = TurbineLayout::from_positions(vec![]);
        let err = client.farm_power(&layout).unwrap_err();
        assert!(matches!(
            err,
            EvalError::Worker(WorkerError::Remote { .. })
        ));
    }
}
