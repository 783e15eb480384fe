//! The vibration monitor: source lifecycle, statistics, and point logging.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use btleplug::platform::Peripheral;
use tokio::task::JoinHandle;

use crate::config::MonitorConfig;
use crate::connection::{ConnectionState, DeviceDescriptor, SharedState};
use crate::error::MonitorError;
use crate::event::{EventCallback, MonitorEvent};
use crate::pipeline::AcquisitionChannel;
use crate::sink::{LogEntry, LogSink, PointMetadata};
use crate::source::{device, MockReplay, SourceHandle};
use crate::stats::{Baseline, StatisticsRecord, StatsEngine};

/// Builder for [`VibrationMonitor`].
///
/// # Example
///
/// ```
/// use stream_imu::{Baseline, VibrationMonitor};
/// use std::time::Duration;
///
/// let monitor = VibrationMonitor::builder()
///     .window_capacity(100)
///     .scan_timeout(Duration::from_secs(10))
///     .baseline(Baseline::Cruise)
///     .build();
/// ```
#[derive(Default)]
pub struct MonitorBuilder {
    config: MonitorConfig,
    events: Option<EventCallback>,
}

impl MonitorBuilder {
    /// Creates a builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rolling statistics window capacity.
    pub fn window_capacity(mut self, capacity: usize) -> Self {
        self.config.window_capacity = capacity;
        self
    }

    /// Sets the acquisition channel capacity.
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.config.channel_capacity = capacity;
        self
    }

    /// Sets the mock replay rate in samples per second.
    pub fn replay_rate_hz(mut self, rate_hz: u32) -> Self {
        self.config.replay_rate_hz = rate_hz;
        self
    }

    /// Sets how long a device scan listens for advertisements.
    pub fn scan_timeout(mut self, timeout: Duration) -> Self {
        self.config.scan_timeout = timeout;
        self
    }

    /// Sets the classification baseline.
    pub fn baseline(mut self, baseline: Baseline) -> Self {
        self.config.baseline = baseline;
        self
    }

    /// Registers a callback for runtime events.
    ///
    /// The callback is invoked from producer tasks; keep it fast and
    /// non-blocking.
    pub fn on_event<F>(mut self, callback: F) -> Self
    where
        F: Fn(MonitorEvent) + Send + Sync + 'static,
    {
        self.events = Some(Arc::new(callback));
        self
    }

    /// Builds the monitor. Starts nothing: the monitor comes up
    /// `Disconnected` and idle.
    pub fn build(self) -> VibrationMonitor {
        VibrationMonitor {
            channel: AcquisitionChannel::new(self.config.channel_capacity),
            engine: StatsEngine::new(self.config.window_capacity, self.config.baseline),
            state: Arc::new(Mutex::new(ConnectionState::Disconnected)),
            discovered: Arc::new(Mutex::new(Vec::new())),
            active: None,
            scan_task: None,
            last_device: None,
            events: self.events,
            config: self.config,
        }
    }
}

/// Propeller-shaft vibration monitor for a WT901BLE68 accelerometer.
///
/// Owns the whole pipeline: the connection state machine, at most one sample
/// source (live device or mock replay), the acquisition channel, and the
/// statistics engine. All methods take `&mut self`; the monitor is a single
/// consumer driven from one task, while sources produce from their own.
///
/// Call [`tick`](VibrationMonitor::tick) periodically to drain acquired
/// samples and refresh statistics.
///
/// # Example
///
/// ```no_run
/// use stream_imu::{PointMetadata, MemorySink, VibrationMonitor};
///
/// # async fn run() -> Result<(), stream_imu::MonitorError> {
/// let mut monitor = VibrationMonitor::new();
/// monitor.activate_mock().await;
///
/// tokio::time::sleep(std::time::Duration::from_secs(1)).await;
/// if let Some(record) = monitor.tick() {
///     println!("mean {:.3} g ({:?})", record.mean_g, record.status);
/// }
///
/// let sink = MemorySink::new();
/// monitor.log_point(PointMetadata::empty(), &sink).await?;
/// monitor.disconnect().await;
/// # Ok(())
/// # }
/// ```
pub struct VibrationMonitor {
    config: MonitorConfig,
    state: SharedState,
    channel: AcquisitionChannel,
    engine: StatsEngine,
    discovered: Arc<Mutex<Vec<(DeviceDescriptor, Peripheral)>>>,
    active: Option<SourceHandle>,
    scan_task: Option<JoinHandle<()>>,
    last_device: Option<DeviceDescriptor>,
    events: Option<EventCallback>,
}

impl VibrationMonitor {
    /// Creates a monitor with default configuration.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Returns a builder for custom configuration.
    pub fn builder() -> MonitorBuilder {
        MonitorBuilder::new()
    }

    /// A snapshot of the current connection state.
    pub fn state(&self) -> ConnectionState {
        self.lock_state().clone()
    }

    /// The active configuration.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ConnectionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_discovered(
        &self,
    ) -> std::sync::MutexGuard<'_, Vec<(DeviceDescriptor, Peripheral)>> {
        self.discovered.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Starts a background device scan.
    ///
    /// Valid from `Disconnected` and `Error` only. The state moves to
    /// `Scanning` immediately and to `DeviceListReady` once the scan window
    /// elapses; poll [`state`](VibrationMonitor::state) to observe the result.
    /// An empty device list is a valid outcome.
    pub fn scan(&mut self) -> Result<(), MonitorError> {
        {
            let mut guard = self.lock_state();
            guard.guard_scan()?;
            *guard = ConnectionState::Scanning;
        }
        tracing::info!(timeout = ?self.config.scan_timeout, "scan started");

        let state = self.state.clone();
        let discovered = self.discovered.clone();
        let events = self.events.clone();
        let timeout = self.config.scan_timeout;
        self.scan_task = Some(tokio::spawn(async move {
            let result = async {
                let adapter = device::default_adapter().await?;
                device::scan(&adapter, timeout).await
            }
            .await;

            let mut guard = state.lock().unwrap_or_else(|e| e.into_inner());
            // The user may have disconnected mid-scan; a finished scan must
            // not resurrect the session.
            if *guard != ConnectionState::Scanning {
                return;
            }
            match result {
                Ok(found) => {
                    let devices: Vec<DeviceDescriptor> =
                        found.iter().map(|(d, _)| d.clone()).collect();
                    let count = devices.len();
                    *discovered.lock().unwrap_or_else(|e| e.into_inner()) = found;
                    *guard = ConnectionState::DeviceListReady {
                        devices,
                        selected: 0,
                    };
                    drop(guard);
                    if let Some(callback) = events {
                        callback(MonitorEvent::ScanCompleted {
                            device_count: count,
                        });
                    }
                }
                Err(e) => {
                    tracing::warn!("scan failed: {e}");
                    *guard = ConnectionState::Error {
                        reason: e.to_string(),
                    };
                }
            }
        }));
        Ok(())
    }

    /// Moves the highlighted device selection to `index`, wrapping cyclically.
    ///
    /// Valid only in `DeviceListReady` with a non-empty list.
    pub fn select(&mut self, index: usize) -> Result<(), MonitorError> {
        let mut guard = self.lock_state();
        let count = guard.guard_select()?;
        if let ConnectionState::DeviceListReady { selected, .. } = &mut *guard {
            *selected = index % count;
        }
        Ok(())
    }

    /// Advances the highlighted device selection by one, wrapping at the end.
    pub fn select_next(&mut self) -> Result<(), MonitorError> {
        let mut guard = self.lock_state();
        let count = guard.guard_select()?;
        if let ConnectionState::DeviceListReady { selected, .. } = &mut *guard {
            *selected = (*selected + 1) % count;
        }
        Ok(())
    }

    /// Connects to the highlighted device and starts streaming.
    ///
    /// Valid from `DeviceListReady` (connects to the highlighted candidate)
    /// and from `Error` (retries the previously connected device, if any).
    /// On failure the state moves to `Error` and the error is returned.
    pub async fn connect(&mut self) -> Result<(), MonitorError> {
        let target = {
            let mut guard = self.lock_state();
            let target = guard.guard_connect(self.last_device.as_ref())?;
            *guard = ConnectionState::Connecting(target.clone());
            target
        };
        tracing::info!(device = %target, "connecting");

        let peripheral = self
            .lock_discovered()
            .iter()
            .find(|(d, _)| d.address == target.address)
            .map(|(_, p)| p.clone());
        let peripheral = match peripheral {
            Some(p) => p,
            None => {
                let err = MonitorError::DeviceNotFound {
                    address: target.address.clone(),
                };
                *self.lock_state() = ConnectionState::Error {
                    reason: err.to_string(),
                };
                return Err(err);
            }
        };

        match device::LiveDevice::connect(target.clone(), peripheral).await {
            Ok(live) => {
                *self.lock_state() = ConnectionState::Connected(target.clone());
                self.active = Some(live.spawn_stream(
                    self.channel.clone(),
                    self.state.clone(),
                    self.events.clone(),
                ));
                self.last_device = Some(target);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(device = %target, "connect failed: {e}");
                *self.lock_state() = ConnectionState::Error {
                    reason: e.to_string(),
                };
                Err(e)
            }
        }
    }

    /// Stops whatever is running and returns to `Disconnected`.
    ///
    /// Valid from any state and always succeeds. Unconsumed samples stay in
    /// the channel; the statistics window is untouched.
    pub async fn disconnect(&mut self) {
        // Set the state first so a scan finishing concurrently sees it.
        *self.lock_state() = ConnectionState::Disconnected;
        if let Some(task) = self.scan_task.take() {
            task.abort();
        }
        if let Some(source) = self.active.take() {
            source.shutdown().await;
        }
        tracing::info!("disconnected");
    }

    /// Activates the mock replay source.
    ///
    /// Valid from any state; an existing source is stopped first.
    pub async fn activate_mock(&mut self) {
        *self.lock_state() = ConnectionState::MockActive;
        if let Some(task) = self.scan_task.take() {
            task.abort();
        }
        if let Some(source) = self.active.take() {
            source.shutdown().await;
        }
        let mock = MockReplay::idle().with_rate(self.config.replay_rate_hz);
        self.active = Some(mock.spawn(self.channel.clone(), self.events.clone()));
        // activate_mock may race the shutdown above; re-assert the state in
        // case a late stream failure moved it to Error.
        *self.lock_state() = ConnectionState::MockActive;
    }

    /// Stops the mock replay source. Valid only from `MockActive`.
    pub async fn stop_mock(&mut self) -> Result<(), MonitorError> {
        self.lock_state().guard_stop_mock()?;
        *self.lock_state() = ConnectionState::Disconnected;
        if let Some(source) = self.active.take() {
            source.shutdown().await;
        }
        Ok(())
    }

    /// Drains acquired samples into the window and recomputes statistics.
    ///
    /// Returns `None` while the window is empty.
    pub fn tick(&mut self) -> Option<StatisticsRecord> {
        self.engine.tick(&self.channel)
    }

    /// The most recently computed statistics record, if any.
    pub fn latest(&self) -> Option<&StatisticsRecord> {
        self.engine.latest()
    }

    /// The baseline currently classified against.
    pub fn baseline(&self) -> Baseline {
        self.engine.baseline()
    }

    /// Switches the classification baseline. Takes effect on the next tick.
    pub fn set_baseline(&mut self, baseline: Baseline) {
        self.engine.set_baseline(baseline);
    }

    /// Total samples evicted from the acquisition channel since creation.
    pub fn total_dropped(&self) -> u64 {
        self.channel.total_dropped()
    }

    /// Logs the current statistics snapshot to `sink`.
    ///
    /// Fails with [`MonitorError::InsufficientData`] when no statistics have
    /// been computed yet; an empty window is never reported as a Normal
    /// reading. The entry's session label records the source at log time:
    /// the device name, "mock", or "offline".
    pub async fn log_point(
        &mut self,
        metadata: PointMetadata,
        sink: &dyn LogSink,
    ) -> Result<LogEntry, MonitorError> {
        let record = self
            .engine
            .latest()
            .cloned()
            .ok_or(MonitorError::InsufficientData)?;
        let session = match &*self.lock_state() {
            ConnectionState::Connected(device) => device.display_name.clone(),
            ConnectionState::MockActive => "mock".to_string(),
            _ => "offline".to_string(),
        };
        let entry = LogEntry::from_record(&record, self.engine.baseline(), session, metadata);
        sink.write(&entry).await?;
        tracing::info!(
            sink = sink.name(),
            mean_g = entry.mean_g,
            status = ?entry.status,
            "point logged"
        );
        Ok(entry)
    }
}

impl Default for VibrationMonitor {
    fn default() -> Self {
        Self::new()
    }
}
