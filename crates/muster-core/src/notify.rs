//! Best-effort channel notifications
//!
//! Broadcast failures are logged and swallowed so they never undo a reply
//! that has already been sent.

use crate::platform::ChatPlatform;
use crate::types::ChannelId;
use std::sync::Arc;

/// Sends text to configured channels without propagating failures
#[derive(Clone)]
pub struct Notifier {
    platform: Arc<dyn ChatPlatform>,
}

impl Notifier {
    /// Create notifier over a platform
    #[inline]
    #[must_use]
    pub fn new(platform: Arc<dyn ChatPlatform>) -> Self {
        Self { platform }
    }

    /// Post `text` to `channel`, logging any failure
    ///
    /// Returns whether the message was delivered.
    pub async fn notify(&self, channel: &ChannelId, text: &str) -> bool {
        match self.platform.send_channel(channel, text).await {
            Ok(()) => {
                tracing::debug!(channel = %channel, "notification sent");
                true
            }
            Err(e) => {
                tracing::error!(channel = %channel, error = %e, "failed to send notification");
                false
            }
        }
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier").finish_non_exhaustive()
    }
}
