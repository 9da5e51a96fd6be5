//! Highlight notifications for the LED board and the knee tracker, and the
//! reports those devices send back.
//!
//! Delivery is fire-and-forget: failures are logged and never reach the game.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};

pub const BOARD_DEVICE: &str = "BoardESP";
pub const KNEE_DEVICE: &str = "KneeESP";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HighlightCommand {
    #[serde(rename = "turn_on")]
    On,
    #[serde(rename = "turn_off")]
    Off,
}

/// Receives every target activation/deactivation and session on/off signal.
pub trait HighlightSink {
    fn highlight(&mut self, command: HighlightCommand, target_id: usize);

    /// Session-wide signal, sent when a session starts and when it ends.
    fn tracker(&mut self, _command: HighlightCommand) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl HighlightSink for NullSink {
    fn highlight(&mut self, _command: HighlightCommand, _target_id: usize) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    Target(HighlightCommand, usize),
    Tracker(HighlightCommand),
}

/// Keeps notifications in order. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    log: Rc<RefCell<Vec<Notification>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.log.borrow().clone()
    }

    /// Target currently lit according to the notifications seen so far.
    pub fn lit_target(&self) -> Option<usize> {
        let mut lit = None;
        for n in self.log.borrow().iter() {
            match *n {
                Notification::Target(HighlightCommand::On, id) => lit = Some(id),
                Notification::Target(HighlightCommand::Off, id) if lit == Some(id) => lit = None,
                _ => {}
            }
        }
        lit
    }
}

impl HighlightSink for RecordingSink {
    fn highlight(&mut self, command: HighlightCommand, target_id: usize) {
        self.log
            .borrow_mut()
            .push(Notification::Target(command, target_id));
    }

    fn tracker(&mut self, command: HighlightCommand) {
        self.log.borrow_mut().push(Notification::Tracker(command));
    }
}

/// Wire format shared with the device firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceMessage {
    pub command: HighlightCommand,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub led_id: Option<usize>,
}

/// Device-addressed message channel with an allow-list of device ids.
#[derive(Debug)]
pub struct DeviceChannel {
    allowed: Vec<String>,
    connected: HashMap<String, Sender<String>>,
}

impl DeviceChannel {
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
            connected: HashMap::new(),
        }
    }

    /// Channel allowing the board and knee devices.
    pub fn with_default_devices() -> Self {
        Self::new([BOARD_DEVICE, KNEE_DEVICE])
    }

    /// Connect a device; returns the receiving end of its message stream.
    pub fn register(&mut self, device: &str) -> Receiver<String> {
        let (tx, rx) = mpsc::channel();
        self.connected.insert(device.to_string(), tx);
        rx
    }

    /// Returns whether the message was handed to the device.
    pub fn send(&mut self, device: &str, message: &DeviceMessage) -> bool {
        if !self.allowed.iter().any(|d| d == device) {
            warn!("device {} is not in the list of allowed devices", device);
            return false;
        }
        let Some(tx) = self.connected.get(device) else {
            warn!("device {} is not connected", device);
            return false;
        };
        let payload = match serde_json::to_string(message) {
            Ok(p) => p,
            Err(e) => {
                warn!("could not encode message for {}: {}", device, e);
                return false;
            }
        };
        if tx.send(payload.clone()).is_err() {
            warn!("failed to send to {}: channel closed", device);
            self.connected.remove(device);
            return false;
        }
        debug!("sent to {}: {}", device, payload);
        true
    }
}

/// Routes target highlights to the board and tracker signals to the knee unit.
#[derive(Debug)]
pub struct DeviceSink {
    channel: DeviceChannel,
    board: String,
    knee: String,
}

impl DeviceSink {
    pub fn new(channel: DeviceChannel) -> Self {
        Self {
            channel,
            board: BOARD_DEVICE.to_string(),
            knee: KNEE_DEVICE.to_string(),
        }
    }

    pub fn channel_mut(&mut self) -> &mut DeviceChannel {
        &mut self.channel
    }
}

impl HighlightSink for DeviceSink {
    fn highlight(&mut self, command: HighlightCommand, target_id: usize) {
        let msg = DeviceMessage {
            command,
            led_id: Some(target_id),
        };
        self.channel.send(&self.board, &msg);
    }

    fn tracker(&mut self, command: HighlightCommand) {
        let msg = DeviceMessage {
            command,
            led_id: None,
        };
        self.channel.send(&self.knee, &msg);
    }
}

/// A message sent back by a device, e.g. `{"field":"angle","value":12.5}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum DeviceReport {
    /// Knee flexion in degrees.
    Angle(f64),
}

impl DeviceReport {
    pub fn parse(payload: &str) -> Option<Self> {
        match serde_json::from_str(payload) {
            Ok(report) => Some(report),
            Err(e) => {
                warn!("ignoring device report {}: {}", payload, e);
                None
            }
        }
    }
}

/// Collects raw reports from every connected device.
#[derive(Debug)]
pub struct DeviceInbox {
    tx: Sender<(String, String)>,
    rx: Receiver<(String, String)>,
}

impl DeviceInbox {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    /// Sending half for the transport of one device.
    pub fn uplink(&self, device: &str) -> DeviceUplink {
        DeviceUplink {
            device: device.to_string(),
            tx: self.tx.clone(),
        }
    }

    /// Reports received since the last call, in arrival order. Payloads that
    /// do not parse are logged and skipped.
    pub fn drain(&self) -> Vec<(String, DeviceReport)> {
        let mut reports = Vec::new();
        while let Ok((device, payload)) = self.rx.try_recv() {
            debug!("report from {}: {}", device, payload);
            if let Some(report) = DeviceReport::parse(&payload) {
                reports.push((device, report));
            }
        }
        reports
    }
}

impl Default for DeviceInbox {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct DeviceUplink {
    device: String,
    tx: Sender<(String, String)>,
}

impl DeviceUplink {
    pub fn send(&self, payload: impl Into<String>) -> bool {
        self.tx.send((self.device.clone(), payload.into())).is_ok()
    }
}
