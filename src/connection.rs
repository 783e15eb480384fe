//! Connection lifecycle state machine.
//!
//! The monitor holds exactly one [`ConnectionState`] at a time; state-machine
//! transitions are the only mutator. Every movement from `Disconnected` or
//! `Error` toward an active stream requires an explicit action - there is no
//! automatic reconnection and no auto-connect at startup. Invalid actions are
//! rejected with [`MonitorError::InvalidTransition`] and leave the state
//! untouched.

use std::sync::{Arc, Mutex};

use crate::error::MonitorError;

/// Connection state shared between the monitor and its producer task.
pub(crate) type SharedState = Arc<Mutex<ConnectionState>>;

/// Moves the state to `Error` if a stream is currently supposed to be alive.
///
/// Called from the producer task on transport loss. A no-op when the state
/// already moved on (the user disconnected or switched sources), so a late
/// failure report cannot clobber a deliberate transition.
pub(crate) fn fail_stream(state: &SharedState, reason: &str) {
    let mut guard = state.lock().unwrap_or_else(|e| e.into_inner());
    if guard.is_streaming() {
        *guard = ConnectionState::Error {
            reason: reason.to_string(),
        };
    }
}

/// Identifies a discoverable BLE candidate.
///
/// Ordering among discovered devices is discovery order, which keeps cyclic
/// selection stable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// Platform identifier used to re-find the peripheral at connect time.
    pub address: String,
    /// Advertised name, or "Unknown" when the device did not advertise one.
    pub display_name: String,
}

impl std::fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.display_name, self.address)
    }
}

/// Current position in the device-connection lifecycle.
///
/// ```text
/// Disconnected --scan--> Scanning --devices found--> DeviceListReady
/// DeviceListReady --select--> DeviceListReady (highlight moves, cyclic)
/// DeviceListReady --connect--> Connecting --success--> Connected
///                                         --failure--> Error
/// Connected --stream error--> Error
/// any state --disconnect--> Disconnected
/// any state --activate mock--> MockActive --stop mock--> Disconnected
/// Error --scan--> Scanning        Error --connect--> Connecting
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    /// No device activity. The initial state.
    Disconnected,
    /// A background scan is listening for advertisements.
    Scanning,
    /// Discovery finished; a candidate is highlighted for connection.
    DeviceListReady {
        /// Devices in discovery order.
        devices: Vec<DeviceDescriptor>,
        /// Index of the highlighted candidate.
        selected: usize,
    },
    /// A connection attempt to this device is in flight.
    Connecting(DeviceDescriptor),
    /// Streaming samples from this device.
    Connected(DeviceDescriptor),
    /// The mock replay source is streaming.
    MockActive,
    /// Something failed. Non-terminal: `scan` or `connect` leaves it.
    Error {
        /// Human-readable failure description.
        reason: String,
    },
}

impl ConnectionState {
    /// Short name used in errors and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Scanning => "Scanning",
            Self::DeviceListReady { .. } => "DeviceListReady",
            Self::Connecting(_) => "Connecting",
            Self::Connected(_) => "Connected",
            Self::MockActive => "MockActive",
            Self::Error { .. } => "Error",
        }
    }

    /// Returns `true` if a sample source should currently be alive.
    pub fn is_streaming(&self) -> bool {
        matches!(self, Self::Connected(_) | Self::MockActive)
    }

    fn rejected(&self, action: &'static str) -> MonitorError {
        MonitorError::InvalidTransition {
            state: self.name(),
            action,
        }
    }

    /// Checks that a scan may start from this state.
    pub(crate) fn guard_scan(&self) -> Result<(), MonitorError> {
        match self {
            Self::Disconnected | Self::Error { .. } => Ok(()),
            _ => Err(self.rejected("scan")),
        }
    }

    /// Checks that selection may move, returning the device count.
    pub(crate) fn guard_select(&self) -> Result<usize, MonitorError> {
        match self {
            Self::DeviceListReady { devices, .. } if !devices.is_empty() => Ok(devices.len()),
            _ => Err(self.rejected("select")),
        }
    }

    /// Checks that a connect attempt may start, returning the target.
    ///
    /// From `DeviceListReady` the highlighted candidate is the target; from
    /// `Error` the caller supplies the previously connected device, if any.
    pub(crate) fn guard_connect(
        &self,
        last_device: Option<&DeviceDescriptor>,
    ) -> Result<DeviceDescriptor, MonitorError> {
        match self {
            Self::DeviceListReady { devices, selected } => devices
                .get(*selected)
                .cloned()
                .ok_or_else(|| self.rejected("connect")),
            Self::Error { .. } => last_device.cloned().ok_or_else(|| self.rejected("connect")),
            _ => Err(self.rejected("connect")),
        }
    }

    /// Checks that the mock replay may stop from this state.
    pub(crate) fn guard_stop_mock(&self) -> Result<(), MonitorError> {
        match self {
            Self::MockActive => Ok(()),
            _ => Err(self.rejected("stop mock")),
        }
    }
}
