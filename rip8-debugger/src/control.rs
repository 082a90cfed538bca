use debug_abi::ControlCommand;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::{
    logging::category_control,
    transport::{Transport, TransportError},
};

pub async fn dispatch<T: Transport>(
    transport: &T,
    command: ControlCommand,
) -> Result<(), TransportError> {
    transport.post(command.path()).await
}

/// Fire-and-forget: nothing is queued or retried, and the effect shows up on a
/// later poll tick.
pub fn spawn_dispatch<T: Transport>(transport: &T, command: ControlCommand) -> JoinHandle<()> {
    let transport = transport.clone();
    tokio::spawn(async move {
        match dispatch(&transport, command).await {
            Ok(()) => info!("{} {command} sent", category_control()),
            Err(err) => warn!("{} {command} failed: {err}", category_control()),
        }
    })
}
