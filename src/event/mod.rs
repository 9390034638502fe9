#![doc = r#"
Decoded track events.

Every event a track cursor yields is one of three families:

```text
          |-------|
          | Event |
          |-------|
         /    |    \
|--------| |------| |------|
| Voice  | |System| | Meta |
|--------| |------| |------|
```

[`Event`] is transient: it borrows payload bytes straight out of the track
buffer it was decoded from and is meant to be consumed on the spot, not
stored.
"#]

mod voice;
pub use voice::*;

mod system;
pub use system::*;

mod meta;
pub use meta::*;

use core::fmt;

/// One decoded track event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event<'a> {
    /// A channel-voice message.
    ChannelVoice(ChannelVoiceEvent),
    /// A system common or real-time message, including sysex.
    System(SystemEvent<'a>),
    /// A meta event.
    Meta(MetaEvent<'a>),
}

impl<'a> Event<'a> {
    /// The channel-voice payload, if this is one.
    pub const fn as_channel_voice(&self) -> Option<&ChannelVoiceEvent> {
        match self {
            Self::ChannelVoice(ev) => Some(ev),
            _ => None,
        }
    }

    /// The meta payload, if this is one.
    pub const fn as_meta(&self) -> Option<&MetaEvent<'a>> {
        match self {
            Self::Meta(ev) => Some(ev),
            _ => None,
        }
    }
}

impl From<ChannelVoiceEvent> for Event<'_> {
    fn from(value: ChannelVoiceEvent) -> Self {
        Self::ChannelVoice(value)
    }
}

impl<'a> From<SystemEvent<'a>> for Event<'a> {
    fn from(value: SystemEvent<'a>) -> Self {
        Self::System(value)
    }
}

impl<'a> From<MetaEvent<'a>> for Event<'a> {
    fn from(value: MetaEvent<'a>) -> Self {
        Self::Meta(value)
    }
}

impl fmt::Display for Event<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChannelVoice(ev) => ev.fmt(f),
            Self::System(ev) => ev.fmt(f),
            Self::Meta(ev) => ev.fmt(f),
        }
    }
}
