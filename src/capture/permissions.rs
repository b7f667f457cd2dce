//! Permission handling
//!
//! Gates capture actions on microphone and camera permission.

use super::traits::{Capability, PermissionGate, PermissionStatus};
use crate::utils::{BridgeError, BridgeResult};

/// Make sure a capability is granted, prompting the user if needed
///
/// An already granted permission is not requested again. A denial leaves
/// re-prompting to the surrounding UI.
pub async fn ensure_granted(gate: &dyn PermissionGate, capability: Capability) -> BridgeResult<()> {
    let status = match gate.check(capability).await {
        PermissionStatus::Granted => PermissionStatus::Granted,
        _ => gate.request(capability).await,
    };

    if status.is_granted() {
        Ok(())
    } else {
        tracing::info!("{} permission not granted ({:?})", capability, status);
        Err(BridgeError::PermissionDenied(capability.to_string()))
    }
}
