use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_stream::StreamExt;
use tracing::{debug, instrument, trace};

use super::hardware::{FanTransport, GattLink, NotificationStream, WriteMode};
use crate::config::SessionTiming;
use crate::error::InteractionError;
use crate::handlers::{FanState, Frame, FrameCodec, StatusHandler};
use crate::protocol::EndpointId;
use crate::utils::format_hex;

/// One connect → operate → disconnect cycle against a fan.
///
/// Callers must hold the owning client's gate for the whole lifetime of a session and finish it
/// with [`TransportSession::close`] on every path.
pub(crate) struct TransportSession {
    link: Box<dyn GattLink>,
    timing: SessionTiming,
    subscribed: bool,
}

impl TransportSession {
    /// Connects to `address`, retrying up to the configured attempt count.
    ///
    /// Each attempt is bounded by the connect timeout. The last error is returned once every
    /// attempt has failed.
    #[instrument(skip(transport, timing), level = "debug")]
    pub(crate) async fn open(
        transport: &dyn FanTransport,
        address: &str,
        timing: SessionTiming,
    ) -> Result<Self, InteractionError> {
        let attempts = timing.connect_attempts().max(1);
        let mut attempt = 1;
        let link = loop {
            match connect_once(transport, address, timing.connect_timeout()).await {
                Ok(link) => break link,
                Err(error) if attempt < attempts => {
                    debug!(attempt, attempts, %error, "connect attempt failed, backing off");
                    sleep(timing.connect_backoff()).await;
                    attempt += 1;
                }
                Err(error) => {
                    debug!(attempt, %error, "connect attempts exhausted");
                    return Err(error);
                }
            }
        };

        settle_services(link.as_ref()).await;
        Ok(Self {
            link,
            timing,
            subscribed: false,
        })
    }

    /// Sends a GET and waits up to `response_timeout` for the first valid REPORT.
    ///
    /// A missing subscription or a missing report yields the placeholder state. Only a failed
    /// write is returned as an error.
    #[instrument(skip(self), level = "debug")]
    pub(crate) async fn request_state(
        &mut self,
        response_timeout: Duration,
    ) -> Result<FanState, InteractionError> {
        let listener = match self.subscribe_best_effort().await {
            Some(notifications) => {
                sleep(self.timing.notify_settle()).await;
                let (sender, receiver) = oneshot::channel();
                Some(ResponseListener {
                    task: tokio::spawn(first_valid_report(notifications, sender)),
                    receiver,
                })
            }
            None => None,
        };

        let request = StatusHandler::request_frame();
        self.write_frame(&request).await?;

        let Some(mut listener) = listener else {
            debug!("no subscription, GET sent without waiting for a report");
            return Ok(FanState::placeholder());
        };
        Ok(listener.wait(response_timeout).await)
    }

    /// Writes a SET frame and waits for the device to actuate.
    #[instrument(skip(self), level = "debug", fields(frame = %frame))]
    pub(crate) async fn send_command(&self, frame: &Frame) -> Result<(), InteractionError> {
        self.write_frame(frame).await?;
        sleep(self.timing.post_write_settle()).await;
        Ok(())
    }

    /// Unsubscribes and disconnects, swallowing failures, then waits out the cooldown.
    #[instrument(skip(self), level = "debug")]
    pub(crate) async fn close(self) {
        if self.subscribed
            && let Err(error) = self.link.unsubscribe(EndpointId::NotifyCharacteristic).await
        {
            debug!(%error, "failed to unsubscribe during teardown");
        }
        if let Err(error) = self.link.disconnect().await {
            debug!(%error, "failed to disconnect during teardown");
        }
        sleep(self.timing.cooldown()).await;
    }

    async fn subscribe_best_effort(&mut self) -> Option<NotificationStream> {
        match self.link.subscribe(EndpointId::NotifyCharacteristic).await {
            Ok(notifications) => {
                self.subscribed = true;
                Some(notifications)
            }
            Err(error) => {
                debug!(%error, "notification subscription failed, continuing without reports");
                None
            }
        }
    }

    /// Writes acknowledged, falling back to an unacknowledged write of the same bytes.
    async fn write_frame(&self, frame: &Frame) -> Result<WriteMode, InteractionError> {
        trace!(payload = %format_hex(frame.as_bytes()), "writing frame");
        match self
            .link
            .write(
                EndpointId::WriteCharacteristic,
                frame.as_bytes(),
                WriteMode::WithResponse,
            )
            .await
        {
            Ok(()) => Ok(WriteMode::WithResponse),
            Err(error) => {
                debug!(%error, "acknowledged write rejected, retrying unacknowledged");
                self.link
                    .write(
                        EndpointId::WriteCharacteristic,
                        frame.as_bytes(),
                        WriteMode::WithoutResponse,
                    )
                    .await?;
                Ok(WriteMode::WithoutResponse)
            }
        }
    }
}

/// Background decoder for one GET. The task is aborted when the listener is dropped, including
/// when the surrounding operation is dropped mid-wait.
struct ResponseListener {
    task: JoinHandle<()>,
    receiver: oneshot::Receiver<FanState>,
}

impl Drop for ResponseListener {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl ResponseListener {
    async fn wait(&mut self, response_timeout: Duration) -> FanState {
        let outcome = timeout(response_timeout, &mut self.receiver).await;
        match outcome {
            Ok(Ok(state)) => state,
            Ok(Err(_)) => {
                debug!("notification stream ended before a valid report");
                FanState::placeholder()
            }
            Err(_) => {
                debug!(?response_timeout, "no valid report before timeout");
                FanState::placeholder()
            }
        }
    }
}

async fn connect_once(
    transport: &dyn FanTransport,
    address: &str,
    connect_timeout: Duration,
) -> Result<Box<dyn GattLink>, InteractionError> {
    timeout(connect_timeout, transport.connect(address))
        .await
        .map_err(|_| InteractionError::ConnectTimeout {
            address: address.to_string(),
            timeout: connect_timeout,
        })?
}

async fn settle_services(link: &dyn GattLink) {
    if link.services_resolved() {
        return;
    }
    if let Err(error) = link.discover_services().await {
        debug!(%error, "service discovery failed, relying on lazy resolution");
    }
}

/// Forwards the first notification that decodes to a valid state.
async fn first_valid_report(mut notifications: NotificationStream, sender: oneshot::Sender<FanState>) {
    while let Some(payload) = notifications.next().await {
        let state = FrameCodec::decode(&payload);
        if state.is_valid() {
            let _ = sender.send(state);
            return;
        }
        trace!(payload = %format_hex(&payload), "ignoring notification without a valid report");
    }
}
