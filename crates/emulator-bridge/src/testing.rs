//! Test doubles for the device bridge and process runner.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::adb::{AdbError, DeviceBridge};
use crate::emulator::EmulatorError;
use crate::process::ProcessRunner;

/// Bridge answering shell commands from per-command queues
///
/// Once a command's queue is empty it answers with empty output.
#[derive(Default)]
pub(crate) struct ScriptedBridge {
    devices: Vec<String>,
    responses: Mutex<HashMap<String, VecDeque<Result<String, String>>>>,
    shell_calls: Mutex<Vec<(String, String)>>,
    devices_calls: AtomicUsize,
}

impl ScriptedBridge {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_devices(mut self, serials: &[&str]) -> Self {
        self.devices = serials.iter().map(|s| s.to_string()).collect();
        self
    }

    pub(crate) fn respond(mut self, command: &str, output: &str) -> Self {
        self.queue(command).push_back(Ok(output.to_string()));
        self
    }

    pub(crate) fn respond_err(mut self, command: &str, message: &str) -> Self {
        self.queue(command).push_back(Err(message.to_string()));
        self
    }

    fn queue(&mut self, command: &str) -> &mut VecDeque<Result<String, String>> {
        self.responses.get_mut().entry(command.to_string()).or_default()
    }

    pub(crate) fn shell_calls(&self) -> Vec<(String, String)> {
        self.shell_calls.lock().clone()
    }

    pub(crate) fn shell_count(&self, command: &str) -> usize {
        self.shell_calls.lock().iter().filter(|(_, c)| c == command).count()
    }

    pub(crate) fn devices_count(&self) -> usize {
        self.devices_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeviceBridge for ScriptedBridge {
    async fn devices(&self) -> Result<Vec<String>, AdbError> {
        self.devices_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.devices.clone())
    }

    async fn shell(&self, serial: &str, command: &str) -> Result<String, AdbError> {
        self.shell_calls.lock().push((serial.to_string(), command.to_string()));

        let next = self
            .responses
            .lock()
            .get_mut(command)
            .and_then(VecDeque::pop_front);

        match next {
            Some(Ok(output)) => Ok(output),
            Some(Err(message)) => Err(AdbError::CommandFailed(message)),
            None => Ok(String::new()),
        }
    }
}

pub(crate) type SpawnCall = (PathBuf, Vec<String>, PathBuf);

/// Runner returning canned output and recording every call
pub(crate) struct RecordingRunner {
    output: Result<String, String>,
    spawn_fails: bool,
    output_calls: Mutex<Vec<(PathBuf, Vec<String>)>>,
    spawn_calls: Mutex<Vec<SpawnCall>>,
}

impl RecordingRunner {
    pub(crate) fn with_output(output: &str) -> Self {
        Self {
            output: Ok(output.to_string()),
            spawn_fails: false,
            output_calls: Mutex::new(Vec::new()),
            spawn_calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing(stderr: &str) -> Self {
        Self {
            output: Err(stderr.to_string()),
            ..Self::with_output("")
        }
    }

    pub(crate) fn spawn_fails(mut self) -> Self {
        self.spawn_fails = true;
        self
    }

    pub(crate) fn output_calls(&self) -> Vec<(PathBuf, Vec<String>)> {
        self.output_calls.lock().clone()
    }

    pub(crate) fn spawn_calls(&self) -> Vec<SpawnCall> {
        self.spawn_calls.lock().clone()
    }
}

#[async_trait]
impl ProcessRunner for RecordingRunner {
    async fn output(&self, program: &Path, args: &[&str]) -> Result<String, EmulatorError> {
        self.output_calls.lock().push((
            program.to_path_buf(),
            args.iter().map(|a| a.to_string()).collect(),
        ));

        self.output.clone().map_err(|message| EmulatorError::CommandFailed {
            command: format!("{} {}", program.display(), args.join(" ")),
            message,
        })
    }

    async fn spawn_detached(&self, program: &Path, args: &[String], cwd: &Path) -> Result<(), EmulatorError> {
        if self.spawn_fails {
            return Err(EmulatorError::StartFailed(format!("{}: No such file or directory", program.display())));
        }

        self.spawn_calls.lock().push((program.to_path_buf(), args.to_vec(), cwd.to_path_buf()));
        Ok(())
    }
}
