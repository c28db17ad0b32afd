// Logs channel resolution
//
// Every device publishes its logs on `device-<id>-logs`, where `<id>` is the
// device's logs-channel override when one is set and its UUID otherwise.
// Resolution always asks the directory; nothing is cached.

use crate::error::Error;
use crate::logs::backend::DeviceDirectory;

/// Wire channel name for a logs channel identifier.
pub fn channel_name(id: &str) -> String {
    format!("device-{id}-logs")
}

/// Resolve the logs channel for the device with the given UUID.
pub async fn resolve_channel<D: DeviceDirectory>(
    directory: &D,
    uuid: &str,
) -> Result<String, Error> {
    let device = directory.device_by_uuid(uuid).await?;
    let id = device.logs_channel().unwrap_or(uuid);
    tracing::debug!(uuid, channel_id = id, "resolved logs channel");
    Ok(channel_name(id))
}
