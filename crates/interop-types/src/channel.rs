//! The `Channel` vocabulary type and its three flavors.

use crate::ids::ChannelId;
use serde::{Deserialize, Serialize};

/// A named broadcast scope: user channels are global, app channels are
/// user-named, private channels are capability-scoped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChannelType {
    User,
    App,
    Private,
}

/// Display metadata a channel may carry (color, glyph, label) — opaque to
/// the root, forwarded verbatim to proxies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayMetadata {
    pub name: Option<String>,
    pub color: Option<String>,
    pub glyph: Option<String>,
}

/// A channel descriptor as exchanged on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    #[serde(rename = "type")]
    pub channel_type: ChannelType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_metadata: Option<DisplayMetadata>,
}

impl Channel {
    pub fn new(id: ChannelId, channel_type: ChannelType) -> Self {
        Self {
            id,
            channel_type,
            display_metadata: None,
        }
    }
}
