//! Error types for windvis.
//!
//! This module provides error types for field sampling, GPU initialization,
//! and the windowed visualization loop.

use std::fmt;

/// Errors raised by [`DataField`](crate::field::DataField) and
/// [`VectorField`](crate::field::VectorField) construction and lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldError {
    /// Lookup outside the field's coverage.
    OutOfBounds { lon: f32, lat: f32 },
    /// u and v fields do not share bounds or resolution.
    DimensionMismatch,
    /// Sample count does not match the grid implied by the bounds.
    SizeMismatch { expected: usize, actual: usize },
    /// Only 1 degree grids are supported.
    UnsupportedResolution(f32),
    /// Bounds are inverted or outside the globe.
    InvalidBounds,
    /// Forecast hour at or past the horizon.
    TauOutOfRange { tau: u32, horizon: u32 },
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::OutOfBounds { lon, lat } => {
                write!(f, "Point (lon {}, lat {}) is outside the field bounds", lon, lat)
            }
            FieldError::DimensionMismatch => write!(f, "Vector field dimensions must match"),
            FieldError::SizeMismatch { expected, actual } => write!(
                f,
                "Field data has {} samples but its bounds require {}",
                actual, expected
            ),
            FieldError::UnsupportedResolution(res) => {
                write!(f, "Unsupported field resolution {} (only 1 degree grids)", res)
            }
            FieldError::InvalidBounds => write!(f, "Field bounds are inverted or off the globe"),
            FieldError::TauOutOfRange { tau, horizon } => {
                write!(f, "Forecast hour {} is past the {} hour horizon", tau, horizon)
            }
        }
    }
}

impl std::error::Error for FieldError {}

/// Errors that can occur during GPU initialization.
#[derive(Debug)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No adapter can drive the window surface.
    NoAdapter,
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GpuError::NoAdapter => write!(f, "Rendering surface unavailable: no compatible GPU adapter found"),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::SurfaceCreation(e) => Some(e),
            GpuError::DeviceCreation(e) => Some(e),
            GpuError::NoAdapter => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

/// Errors that can occur while setting up or running a visualization.
#[derive(Debug)]
pub enum VisError {
    /// Failed to create or run the event loop.
    EventLoop(winit::error::EventLoopError),
    /// Failed to create the window.
    Window(winit::error::OsError),
    /// GPU initialization failed.
    Gpu(GpuError),
    /// Invalid field data.
    Field(FieldError),
    /// Failed to read or write a field or base map image.
    Image(image::ImageError),
    /// The forecast set holds no fields.
    NoData,
    /// Configuration values are inconsistent.
    Config(String),
}

impl fmt::Display for VisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisError::EventLoop(e) => write!(f, "Event loop error: {}", e),
            VisError::Window(e) => write!(f, "Failed to create window: {}", e),
            VisError::Gpu(e) => write!(f, "GPU error: {}", e),
            VisError::Field(e) => write!(f, "Field error: {}", e),
            VisError::Image(e) => write!(f, "Image error: {}", e),
            VisError::NoData => write!(f, "No wind fields to display"),
            VisError::Config(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for VisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VisError::EventLoop(e) => Some(e),
            VisError::Window(e) => Some(e),
            VisError::Gpu(e) => Some(e),
            VisError::Field(e) => Some(e),
            VisError::Image(e) => Some(e),
            VisError::NoData | VisError::Config(_) => None,
        }
    }
}

impl From<winit::error::EventLoopError> for VisError {
    fn from(e: winit::error::EventLoopError) -> Self {
        VisError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for VisError {
    fn from(e: winit::error::OsError) -> Self {
        VisError::Window(e)
    }
}

impl From<GpuError> for VisError {
    fn from(e: GpuError) -> Self {
        VisError::Gpu(e)
    }
}

impl From<FieldError> for VisError {
    fn from(e: FieldError) -> Self {
        VisError::Field(e)
    }
}

impl From<image::ImageError> for VisError {
    fn from(e: image::ImageError) -> Self {
        VisError::Image(e)
    }
}
