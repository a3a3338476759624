use super::{CommandCode, Frame, FrameCodec, FrameFields};

/// Builds the GET frame that asks the device for a status REPORT.
pub struct StatusHandler;

impl StatusHandler {
    /// Returns the all-zero GET frame.
    ///
    /// ```
    /// use fansync::StatusHandler;
    ///
    /// let frame = StatusHandler::request_frame();
    /// assert_eq!(
    ///     &[0x53, 0x30, 0, 0, 0, 0, 0, 0, 0, 0x83],
    ///     frame.as_bytes()
    /// );
    /// ```
    #[must_use]
    pub fn request_frame() -> Frame {
        FrameCodec::encode(CommandCode::Get, FrameFields::default())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn request_frame_is_get_with_zero_fields() {
        let frame = StatusHandler::request_frame();

        assert_eq!(CommandCode::Get.as_byte(), frame.command_byte());
        assert_eq!(FrameFields::default(), frame.fields());
        assert_eq!(0x83, frame.checksum());
    }
}
