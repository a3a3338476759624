use std::sync::Arc;

use tracing::instrument;

use crate::config::FanOptions;
use crate::coordinator::PollingCoordinator;
use crate::error::InteractionError;
use crate::handlers::{Direction, FanState, Frame, LightLevel, StateOverrides};

const MAX_BRIGHTNESS: u8 = 255;
const FAN_ASSUMED_LIGHT_PERCENT: i32 = 100;
const LIGHT_ON_ASSUMED_SPEED: u8 = 1;
const LIGHT_OFF_ASSUMED_SPEED: u8 = 0;

/// Maps a fan percentage to a speed step.
///
/// ```
/// use fansync::speed_for_percentage;
///
/// assert_eq!(0, speed_for_percentage(0));
/// assert_eq!(1, speed_for_percentage(33));
/// assert_eq!(2, speed_for_percentage(34));
/// assert_eq!(3, speed_for_percentage(67));
/// ```
#[must_use]
pub fn speed_for_percentage(percentage: u8) -> u8 {
    match percentage {
        0 => 0,
        1..=33 => 1,
        34..=66 => 2,
        _ => 3,
    }
}

/// Maps a speed step to the percentage shown for it.
#[must_use]
pub fn percentage_for_speed(speed: u8) -> u8 {
    match speed {
        0 => 0,
        1 => 33,
        2 => 66,
        _ => 100,
    }
}

/// Fan and light actions on top of a coordinator's cached status.
///
/// Writes pass the cached status as the reference so they skip the extra status read, then merge
/// the change locally and ask the coordinator for a refresh.
#[derive(Debug, Clone)]
pub struct FanController {
    coordinator: Arc<PollingCoordinator>,
    options: FanOptions,
}

impl FanController {
    #[must_use]
    pub fn new(coordinator: Arc<PollingCoordinator>, options: FanOptions) -> Self {
        Self {
            coordinator,
            options,
        }
    }

    #[must_use]
    pub fn options(&self) -> FanOptions {
        self.options
    }

    fn cached(&self) -> Option<FanState> {
        self.coordinator.last_state()
    }

    /// Returns whether the cached status came from the device.
    #[must_use]
    pub fn available(&self) -> bool {
        self.cached().is_some_and(|state| state.is_valid())
    }

    #[must_use]
    pub fn percentage(&self) -> u8 {
        percentage_for_speed(self.cached().map_or(0, |state| state.speed()))
    }

    #[must_use]
    pub fn current_direction(&self) -> Option<Direction> {
        if !self.options.direction_supported() {
            return None;
        }
        Some(self.cached().map_or(Direction::Forward, |state| state.direction()))
    }

    #[must_use]
    pub fn is_light_on(&self) -> bool {
        self.cached().is_some_and(|state| state.down() > 0)
    }

    /// Light brightness on the `0..=255` scale.
    #[must_use]
    pub fn brightness(&self) -> u8 {
        if !self.options.dimmable() {
            return if self.is_light_on() { MAX_BRIGHTNESS } else { 0 };
        }
        let down = u32::from(self.cached().map_or(0, |state| state.down()));
        u8::try_from(down * u32::from(MAX_BRIGHTNESS) / 100).unwrap_or(MAX_BRIGHTNESS)
    }

    /// Sets the fan speed from a percentage.
    ///
    /// # Errors
    ///
    /// Returns an error when the write fails.
    #[instrument(skip(self), level = "info")]
    pub async fn set_percentage(&self, percentage: u8) -> Result<Frame, InteractionError> {
        self.write_speed(speed_for_percentage(percentage)).await
    }

    /// Turns the fan on, at `percentage` when given.
    ///
    /// Without a percentage a stopped fan starts at the configured turn-on speed and a running
    /// fan keeps its speed.
    ///
    /// # Errors
    ///
    /// Returns an error when the write fails.
    #[instrument(skip(self), level = "info")]
    pub async fn turn_on(&self, percentage: Option<u8>) -> Result<Frame, InteractionError> {
        if let Some(percentage) = percentage {
            return self.set_percentage(percentage).await;
        }
        let current = self.cached().map_or(0, |state| state.speed());
        let target = if current == 0 {
            self.options.turn_on_speed()
        } else {
            current
        };
        self.write_speed(target).await
    }

    /// Stops the fan.
    ///
    /// # Errors
    ///
    /// Returns an error when the write fails.
    #[instrument(skip(self), level = "info")]
    pub async fn turn_off(&self) -> Result<Frame, InteractionError> {
        self.write_speed(0).await
    }

    /// # Errors
    ///
    /// Returns [`InteractionError::DirectionUnsupported`] when the fan is not configured for
    /// direction changes, or an error when the write fails.
    #[instrument(skip(self), level = "info")]
    pub async fn set_direction(&self, direction: Direction) -> Result<Frame, InteractionError> {
        if !self.options.direction_supported() {
            return Err(InteractionError::DirectionUnsupported);
        }
        let frame = self
            .coordinator
            .client()
            .set_direction(direction, self.cached())
            .await?;
        self.apply_and_refresh(StateOverrides::builder().direction(direction).build());
        Ok(frame)
    }

    /// Turns the light on at `brightness` (`0..=255`, default full).
    ///
    /// # Errors
    ///
    /// Returns [`InteractionError::LightUnsupported`] when the fan has no light, or an error when
    /// the write fails.
    #[instrument(skip(self), level = "info")]
    pub async fn light_on(&self, brightness: Option<u8>) -> Result<Frame, InteractionError> {
        let percent = if self.options.dimmable() {
            let brightness = u32::from(brightness.unwrap_or(MAX_BRIGHTNESS));
            let scaled = brightness * 100 / u32::from(MAX_BRIGHTNESS);
            u8::try_from(scaled.max(1)).unwrap_or(LightLevel::FULL.percent())
        } else {
            LightLevel::FULL.percent()
        };
        self.write_light(percent, LIGHT_ON_ASSUMED_SPEED).await
    }

    /// Turns the light off.
    ///
    /// # Errors
    ///
    /// Returns [`InteractionError::LightUnsupported`] when the fan has no light, or an error when
    /// the write fails.
    #[instrument(skip(self), level = "info")]
    pub async fn light_off(&self) -> Result<Frame, InteractionError> {
        self.write_light(LightLevel::OFF.percent(), LIGHT_OFF_ASSUMED_SPEED).await
    }

    async fn write_speed(&self, speed: u8) -> Result<Frame, InteractionError> {
        let frame = self
            .coordinator
            .client()
            .set_speed(speed, self.cached(), Some(FAN_ASSUMED_LIGHT_PERCENT))
            .await?;
        self.apply_and_refresh(StateOverrides::builder().speed(speed).build());
        Ok(frame)
    }

    async fn write_light(&self, percent: u8, assumed_speed: u8) -> Result<Frame, InteractionError> {
        if !self.options.has_light() {
            return Err(InteractionError::LightUnsupported);
        }
        let cached = self.cached();
        let frame = self
            .coordinator
            .client()
            .set_light(i32::from(percent), cached, Some(assumed_speed))
            .await?;

        let cached_valid = cached.is_some_and(|state| state.is_valid());
        let overrides = StateOverrides::builder()
            .down(percent)
            .maybe_speed((!cached_valid).then_some(assumed_speed))
            .build();
        self.apply_and_refresh(overrides);
        Ok(frame)
    }

    fn apply_and_refresh(&self, overrides: StateOverrides) {
        self.coordinator.apply_local_state(overrides);
        self.coordinator.schedule_immediate_refresh();
    }
}
