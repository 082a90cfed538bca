use debug_abi::{CHANNELS, Channel};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::{
    logging::category_poll,
    snapshot::{ChannelValue, DecodeError, decode},
    transport::{Transport, TransportError},
};

/// A decoded snapshot tagged with the tick that requested it.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelUpdate {
    pub channel: Channel,
    pub sequence: u64,
    pub value: ChannelValue,
}

#[derive(Debug)]
pub enum PollErrorKind {
    Transport(TransportError),
    Decode(DecodeError),
}

#[derive(Debug)]
pub struct PollError {
    pub channel: Channel,
    pub sequence: u64,
    pub kind: PollErrorKind,
}

impl std::fmt::Display for PollError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            PollErrorKind::Transport(err) => {
                write!(f, "{} poll #{} failed: {err}", self.channel, self.sequence)
            }
            PollErrorKind::Decode(err) => {
                write!(f, "{} poll #{} rejected: {err}", self.channel, self.sequence)
            }
        }
    }
}

impl std::error::Error for PollError {}

pub type PollResult = Result<ChannelUpdate, PollError>;

pub async fn fetch_channel<T: Transport>(
    transport: &T,
    channel: Channel,
    sequence: u64,
) -> PollResult {
    let fail = |kind| PollError {
        channel,
        sequence,
        kind,
    };
    let body = transport
        .get(channel.path())
        .await
        .map_err(|err| fail(PollErrorKind::Transport(err)))?;
    let value = decode(channel, &body).map_err(|err| fail(PollErrorKind::Decode(err)))?;
    Ok(ChannelUpdate {
        channel,
        sequence,
        value,
    })
}

/// Issues one request per channel on every tick.
///
/// Requests run as independent tasks; each result is sent back on its own as
/// soon as it lands, so a hung channel never holds up the others.
pub struct Poller<T> {
    transport: T,
    sequence: u64,
}

impl<T: Transport> Poller<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            sequence: 0,
        }
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Starts a tick and returns how many requests are now in flight.
    pub fn spawn_tick<E>(&mut self, events: &UnboundedSender<E>) -> usize
    where
        E: From<PollResult> + Send + 'static,
    {
        self.sequence += 1;
        let sequence = self.sequence;
        debug!(
            "{} tick #{sequence} requesting {} channels",
            category_poll(),
            CHANNELS.len()
        );
        for channel in CHANNELS {
            let transport = self.transport.clone();
            let events = events.clone();
            tokio::spawn(async move {
                let result = fetch_channel(&transport, channel, sequence).await;
                let _ = events.send(E::from(result));
            });
        }
        CHANNELS.len()
    }
}
