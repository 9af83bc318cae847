pub mod canvas;
pub mod clock;
pub mod controller;
pub mod display_context;
pub mod frame;
pub mod frame_buffer;
pub mod gpu_context;
pub mod input_adapter;
pub mod scrubber;
pub mod surface_renderer;
pub mod timer;

pub use canvas::{compose, Canvas};
pub use clock::Clock;
pub use controller::Key;
pub use display_context::DisplayContext;
pub use frame::{Frame, PixelFormat};
pub use frame_buffer::{capacity_for, FrameBuffer};
pub use gpu_context::GpuContext;
pub use input_adapter::WinitKeys;
pub use scrubber::{Direction, Scrubber};
pub use surface_renderer::SurfaceRenderer;
pub use timer::{FixedHz, Throttled};
