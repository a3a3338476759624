mod device_view;
mod diagnostics_view;
mod frame_view;
mod painter;
mod state_view;
mod table;

pub(crate) use self::device_view::DeviceListView;
pub(crate) use self::diagnostics_view::DiagnosticsView;
pub(crate) use self::frame_view::FrameView;
pub(crate) use self::painter::Painter;
pub(crate) use self::state_view::StateView;
