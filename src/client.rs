use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bon::Builder;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::config::SessionTiming;
use crate::error::InteractionError;
use crate::handlers::{
    Direction, DirectionHandler, FanState, Frame, LightHandler, LightLevel, SpeedHandler,
};
use crate::hw::{FanTransport, TransportSession};

/// Request/response operations against one fan.
///
/// Every operation runs in its own transport session. A per-client gate serializes operations
/// in submission order so at most one session is open at any time.
///
/// ```
/// # async fn demo() -> Result<(), fansync::InteractionError> {
/// use std::sync::Arc;
///
/// use fansync::{FakeTransport, FakeTransportConfig, FanClient};
///
/// let transport = FakeTransport::new(FakeTransportConfig::builder().build());
/// let client = FanClient::builder()
///     .address("AA:BB:CC:DD:EE:FF")
///     .transport(Arc::new(transport))
///     .build();
/// let frame = client.set_speed(2, None, None).await?;
/// assert_eq!(2, frame.fields().speed);
/// # Ok(())
/// # }
/// ```
#[derive(Builder)]
pub struct FanClient {
    #[builder(into)]
    address: String,
    transport: Arc<dyn FanTransport>,
    #[builder(default)]
    timing: SessionTiming,
    #[builder(skip)]
    gate: Mutex<()>,
}

impl fmt::Debug for FanClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FanClient")
            .field("address", &self.address)
            .field("timing", &self.timing)
            .finish_non_exhaustive()
    }
}

impl FanClient {
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    #[must_use]
    pub fn timing(&self) -> SessionTiming {
        self.timing
    }

    /// Reads the current status, returning the placeholder on any failure.
    ///
    /// `response_timeout` defaults to the session timing's response timeout.
    #[instrument(skip(self), level = "debug", fields(address = %self.address))]
    pub async fn get_state(&self, response_timeout: Option<Duration>) -> FanState {
        match self.query_state(response_timeout).await {
            Ok(state) => state,
            Err(error) => {
                warn!(%error, "status query failed");
                FanState::placeholder()
            }
        }
    }

    /// Reads the current status, surfacing connection and write failures.
    ///
    /// A device that never reports still yields `Ok` with the placeholder state.
    ///
    /// # Errors
    ///
    /// Returns an error when every connection attempt fails or the GET cannot be written.
    #[instrument(skip(self), level = "debug", fields(address = %self.address))]
    pub async fn query_state(
        &self,
        response_timeout: Option<Duration>,
    ) -> Result<FanState, InteractionError> {
        let response_timeout = response_timeout.unwrap_or(self.timing.response_timeout());
        let _gate = self.gate.lock().await;

        let mut session = self.open_session().await?;
        let outcome = session.request_state(response_timeout).await;
        session.close().await;
        outcome
    }

    /// Changes the fan speed.
    ///
    /// Without `prior`, the current status is read first over the same connection.
    ///
    /// # Errors
    ///
    /// Returns an error when every connection attempt fails or the SET cannot be written.
    #[instrument(skip(self, prior), level = "debug", fields(address = %self.address))]
    pub async fn set_speed(
        &self,
        speed: u8,
        prior: Option<FanState>,
        assumed_light_percent: Option<i32>,
    ) -> Result<Frame, InteractionError> {
        self.write_control(prior, |reference| {
            SpeedHandler::frame_for(speed, reference, assumed_light_percent)
        })
        .await
    }

    /// Changes the light level, clamped to `0..=100`.
    ///
    /// Without `prior`, the current status is read first over the same connection.
    ///
    /// # Errors
    ///
    /// Returns an error when every connection attempt fails or the SET cannot be written.
    #[instrument(skip(self, prior), level = "debug", fields(address = %self.address))]
    pub async fn set_light(
        &self,
        percent: i32,
        prior: Option<FanState>,
        assumed_speed: Option<u8>,
    ) -> Result<Frame, InteractionError> {
        let level = LightLevel::clamped(percent);
        self.write_control(prior, |reference| {
            LightHandler::frame_for(level, reference, assumed_speed)
        })
        .await
    }

    /// Changes the rotation direction.
    ///
    /// Without `prior`, the current status is read first over the same connection.
    ///
    /// # Errors
    ///
    /// Returns an error when every connection attempt fails or the SET cannot be written.
    #[instrument(skip(self, direction, prior), level = "debug", fields(address = %self.address))]
    pub async fn set_direction(
        &self,
        direction: impl Into<Direction>,
        prior: Option<FanState>,
    ) -> Result<Frame, InteractionError> {
        let direction = direction.into();
        self.write_control(prior, |reference| {
            DirectionHandler::frame_for(direction, reference)
        })
        .await
    }

    async fn open_session(&self) -> Result<TransportSession, InteractionError> {
        TransportSession::open(self.transport.as_ref(), &self.address, self.timing).await
    }

    async fn write_control<F>(
        &self,
        prior: Option<FanState>,
        frame_for: F,
    ) -> Result<Frame, InteractionError>
    where
        F: FnOnce(&FanState) -> Frame,
    {
        let _gate = self.gate.lock().await;

        let mut session = self.open_session().await?;
        let outcome = Self::exchange_control(&mut session, self.timing, prior, frame_for).await;
        session.close().await;
        outcome
    }

    async fn exchange_control<F>(
        session: &mut TransportSession,
        timing: SessionTiming,
        prior: Option<FanState>,
        frame_for: F,
    ) -> Result<Frame, InteractionError>
    where
        F: FnOnce(&FanState) -> Frame,
    {
        let reference = match prior {
            Some(state) => state,
            None => match session.request_state(timing.response_timeout()).await {
                Ok(state) => state,
                Err(error) => {
                    debug!(%error, "status read before write failed, using fallback fields");
                    FanState::placeholder()
                }
            },
        };

        let frame = frame_for(&reference);
        session.send_command(&frame).await?;
        Ok(frame)
    }
}
