/// Result alias that carries the custom [`CarouselError`] type.
pub type Result<T> = std::result::Result<T, CarouselError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum CarouselError {
    /// A carousel was asked to cycle through zero items.
    #[error("carousel requires at least one item")]
    EmptyItemList,
    /// A caller supplied a value outside the accepted domain.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// The layout kept reporting a zero slide width. `attempts` counts every
    /// measurement made before giving up.
    #[error("layout geometry not ready after {attempts} attempt(s)")]
    GeometryNotReady { attempts: u32 },
    /// Free-form error used by the application layer.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Wrapper around JSON (de)serialisation errors.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl CarouselError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    /// True for the retryable layout-not-ready condition.
    pub fn is_geometry_not_ready(&self) -> bool {
        matches!(self, Self::GeometryNotReady { .. })
    }
}

impl From<&str> for CarouselError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for CarouselError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
