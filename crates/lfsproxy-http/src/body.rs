//! LFS HTTP response body type.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body_util::Full;
use serde::Serialize;

/// Response body: every LFS response is a small, fully buffered JSON
/// document, except for the rare response without any body.
#[derive(Debug, Default)]
pub enum LfsResponseBody {
    /// Serialized JSON.
    Json(Full<Bytes>),
    /// No body.
    #[default]
    Empty,
}

impl LfsResponseBody {
    /// Serialize `value` into a JSON body.
    ///
    /// # Errors
    ///
    /// Propagates `serde_json` failures.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_vec(value).map(|bytes| Self::Json(Full::new(Bytes::from(bytes))))
    }

    /// Wrap an already serialized document.
    #[must_use]
    pub fn from_static(json: &'static str) -> Self {
        Self::Json(Full::new(Bytes::from_static(json.as_bytes())))
    }
}

impl http_body::Body for LfsResponseBody {
    type Data = Bytes;
    type Error = std::convert::Infallible;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<http_body::Frame<Self::Data>, Self::Error>>> {
        match self.get_mut() {
            Self::Json(full) => Pin::new(full).poll_frame(cx),
            Self::Empty => Poll::Ready(None),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            Self::Json(full) => full.is_end_stream(),
            Self::Empty => true,
        }
    }

    fn size_hint(&self) -> http_body::SizeHint {
        match self {
            Self::Json(full) => full.size_hint(),
            Self::Empty => http_body::SizeHint::with_exact(0),
        }
    }
}
