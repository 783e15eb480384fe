//! Live WT901BLE68 device source over Bluetooth LE.
//!
//! Discovery, connection, and the notification receive loop. The device
//! streams frames as GATT notifications on the WitMotion `ffe4`
//! characteristic at its native rate (observed around 1 kHz); each payload is
//! handed to the [`FrameDecoder`] and the resulting samples pushed into the
//! acquisition channel.
//!
//! On transport loss the producer task moves the connection state to
//! `Error` and exits - reconnection is an explicit user decision, never
//! automatic.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use btleplug::api::{Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::StreamExt;
use uuid::Uuid;

use crate::connection::{fail_stream, SharedState};
use crate::decoder::FrameDecoder;
use crate::error::MonitorError;
use crate::event::{EventCallback, MonitorEvent};
use crate::pipeline::AcquisitionChannel;
use crate::source::SourceHandle;
use crate::DeviceDescriptor;

/// WitMotion notify characteristic (`0000ffe4-0000-1000-8000-00805f9a34fb`).
pub const NOTIFY_CHARACTERISTIC: Uuid = Uuid::from_u128(0x0000ffe4_0000_1000_8000_00805f9a34fb);

/// WitMotion command characteristic (`0000ffe9-0000-1000-8000-00805f9a34fb`).
pub const COMMAND_CHARACTERISTIC: Uuid = Uuid::from_u128(0x0000ffe9_0000_1000_8000_00805f9a34fb);

/// Command that asks the sensor to start streaming.
const STREAM_START_COMMAND: [u8; 3] = [0xFF, 0xAA, 0x69];

/// How often the receive loop rechecks the stop flag while idle.
const STOP_POLL: Duration = Duration::from_millis(100);

/// Returns the first available Bluetooth adapter.
pub(crate) async fn default_adapter() -> Result<Adapter, MonitorError> {
    let manager = Manager::new().await?;
    manager
        .adapters()
        .await?
        .into_iter()
        .next()
        .ok_or(MonitorError::NoAdapter)
}

/// Scans for advertising peripherals for `timeout`.
///
/// Returns descriptor/peripheral pairs in discovery order. Devices without an
/// advertised name are listed as "Unknown" rather than filtered out; the
/// sensor does not always advertise its name on every platform.
pub(crate) async fn scan(
    adapter: &Adapter,
    timeout: Duration,
) -> Result<Vec<(DeviceDescriptor, Peripheral)>, MonitorError> {
    adapter
        .start_scan(ScanFilter::default())
        .await
        .map_err(|e| MonitorError::ScanFailed {
            reason: e.to_string(),
        })?;
    tokio::time::sleep(timeout).await;
    let _ = adapter.stop_scan().await;

    let mut found = Vec::new();
    for peripheral in adapter.peripherals().await? {
        let display_name = peripheral
            .properties()
            .await
            .ok()
            .flatten()
            .and_then(|props| props.local_name)
            .unwrap_or_else(|| "Unknown".to_string());
        let descriptor = DeviceDescriptor {
            address: peripheral.id().to_string(),
            display_name,
        };
        found.push((descriptor, peripheral));
    }
    tracing::info!(count = found.len(), "scan completed");
    Ok(found)
}

/// A connected WT901 peripheral, subscribed and ready to stream.
pub(crate) struct LiveDevice {
    descriptor: DeviceDescriptor,
    peripheral: Peripheral,
    notify: Characteristic,
}

impl LiveDevice {
    /// Connects, discovers services, and subscribes to the notify
    /// characteristic.
    ///
    /// The stream-start command write is best effort: some firmware
    /// revisions stream without it.
    pub(crate) async fn connect(
        descriptor: DeviceDescriptor,
        peripheral: Peripheral,
    ) -> Result<Self, MonitorError> {
        peripheral
            .connect()
            .await
            .map_err(|e| MonitorError::ConnectFailed {
                name: descriptor.display_name.clone(),
                reason: e.to_string(),
            })?;
        peripheral.discover_services().await?;

        let characteristics = peripheral.characteristics();
        let notify = characteristics
            .iter()
            .find(|c| c.uuid == NOTIFY_CHARACTERISTIC)
            .cloned()
            .ok_or(MonitorError::NotifyCharacteristicMissing {
                uuid: NOTIFY_CHARACTERISTIC,
            })?;

        if let Some(command) = characteristics
            .iter()
            .find(|c| c.uuid == COMMAND_CHARACTERISTIC)
        {
            if let Err(e) = peripheral
                .write(command, &STREAM_START_COMMAND, WriteType::WithoutResponse)
                .await
            {
                tracing::warn!(device = %descriptor, "stream-start command write failed: {e}");
            }
        }

        peripheral.subscribe(&notify).await?;
        tracing::info!(device = %descriptor, "connected and subscribed");
        Ok(Self {
            descriptor,
            peripheral,
            notify,
        })
    }

    /// Spawns the receive loop, pushing decoded samples into `channel`.
    pub(crate) fn spawn_stream(
        self,
        channel: AcquisitionChannel,
        state: SharedState,
        events: Option<EventCallback>,
    ) -> SourceHandle {
        let label = self.descriptor.display_name.clone();
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();
        let task = tokio::spawn(self.run(channel, state, events, stop_flag));
        SourceHandle::new(label, stop, task)
    }

    async fn run(
        self,
        channel: AcquisitionChannel,
        state: SharedState,
        events: Option<EventCallback>,
        stop: Arc<AtomicBool>,
    ) {
        let label = self.descriptor.display_name.clone();
        let emit = |event: MonitorEvent| {
            if let Some(ref callback) = events {
                callback(event);
            }
        };
        emit(MonitorEvent::SourceStarted {
            source: label.clone(),
        });

        let mut notifications = match self.peripheral.notifications().await {
            Ok(stream) => stream,
            Err(e) => {
                let reason = format!("notification stream unavailable: {e}");
                tracing::warn!(device = %self.descriptor, "{reason}");
                fail_stream(&state, &reason);
                emit(MonitorEvent::SourceStopped {
                    source: label,
                    reason,
                });
                return;
            }
        };

        let mut decoder = FrameDecoder::new();
        let mut received: u64 = 0;
        let mut stream_lost: Option<String> = None;

        while !stop.load(Ordering::SeqCst) {
            tokio::select! {
                notification = notifications.next() => match notification {
                    Some(data) => {
                        if data.uuid != NOTIFY_CHARACTERISTIC {
                            continue;
                        }
                        received += 1;
                        let mut dropped = 0u64;
                        for sample in decoder.decode(&data.value) {
                            if channel.push(sample) {
                                dropped += 1;
                            }
                        }
                        if dropped > 0 {
                            emit(MonitorEvent::SamplesDropped {
                                dropped,
                                total_dropped: channel.total_dropped(),
                            });
                        }
                        if received % 1000 == 0 {
                            tracing::debug!(
                                device = %self.descriptor,
                                received,
                                pending = decoder.pending_len(),
                                "streaming"
                            );
                        }
                    }
                    None => {
                        stream_lost = Some("transport closed".to_string());
                        break;
                    }
                },
                // Wake periodically so a stop request is serviced promptly
                // even when the device goes quiet.
                () = tokio::time::sleep(STOP_POLL) => {}
            }
        }

        let _ = self.peripheral.unsubscribe(&self.notify).await;
        let _ = self.peripheral.disconnect().await;

        let reason = match stream_lost {
            Some(reason) if !stop.load(Ordering::SeqCst) => {
                // Unexpected loss: surface through the connection state. The
                // state machine decides whether to reconnect; we never retry.
                fail_stream(&state, &reason);
                reason
            }
            Some(reason) => reason,
            None => "stop requested".to_string(),
        };
        tracing::info!(device = %self.descriptor, received, %reason, "stream ended");
        emit(MonitorEvent::SourceStopped {
            source: label,
            reason,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_characteristic_uuids() {
        assert_eq!(
            NOTIFY_CHARACTERISTIC.to_string(),
            "0000ffe4-0000-1000-8000-00805f9a34fb"
        );
        assert_eq!(
            COMMAND_CHARACTERISTIC.to_string(),
            "0000ffe9-0000-1000-8000-00805f9a34fb"
        );
    }

    #[test]
    fn test_stream_start_command_bytes() {
        assert_eq!(STREAM_START_COMMAND, [0xFF, 0xAA, 0x69]);
    }
}
