// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Defines the error types of the device resource layer.
//!
//! [`RenderError`] is what every public operation returns. Callers branch on
//! [`RenderError::kind`] rather than on individual variants. [`BackendError`]
//! is produced by backend implementations and converted at the boundary.

use super::api::memory::MemoryPropertyFlags;
use super::api::object::ObjectKind;
use thiserror::Error;

/// The coarse category of a [`RenderError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A descriptor or argument was rejected before any device call.
    Validation,
    /// The device memory allocator was exhausted.
    OutOfMemory,
    /// A request exceeded a backend limit.
    UnsupportedSize,
    /// Source or destination image data had the wrong byte length.
    ImageDataSizeMismatch,
    /// Host access to memory that is not host-visible.
    InvalidAccess,
    /// The device context is lost. Fatal, never retried.
    DeviceLost,
    /// The API was used in a way that indicates a programming error.
    InvalidUsage,
    /// A resource could not be initialized.
    Initialization,
    /// The backend does not support the requested feature.
    Unsupported,
}

/// Errors reported by backend implementations of the capability traits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The device could not provide the requested allocation.
    #[error("out of device memory ({requested} bytes requested)")]
    OutOfDeviceMemory {
        /// The size of the failed allocation.
        requested: u64,
    },
    /// Submission or synchronization with the device failed.
    #[error("device lost: {0}")]
    DeviceLost(String),
    /// The operation is not available on this backend.
    #[error("not supported by backend: {0}")]
    Unsupported(String),
    /// The backend detected misuse, e.g. a copy from an image in the wrong layout.
    #[error("invalid backend usage: {0}")]
    InvalidUsage(String),
}

/// The error type of every resource and transfer operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// A descriptor or argument failed validation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// No memory chunk could satisfy an allocation, and none could be created.
    #[error("out of device memory: {requested} bytes with {properties:?} could not be allocated")]
    OutOfMemory {
        /// The size of the failed allocation.
        requested: u64,
        /// The memory properties that were requested.
        properties: MemoryPropertyFlags,
    },
    /// A size exceeded the backend limit.
    #[error("unsupported size: {requested} bytes specified but limit is {limit}")]
    UnsupportedSize {
        /// The requested size.
        requested: u64,
        /// The backend limit.
        limit: u64,
    },
    /// Image data did not match the footprint of the declared format and extent.
    #[error("image data size mismatch: {actual} byte(s) specified but required is {expected} byte(s)")]
    ImageDataSizeMismatch {
        /// The number of bytes the format and extent require.
        expected: u64,
        /// The number of bytes that were supplied.
        actual: u64,
    },
    /// Host access to memory that cannot be mapped.
    #[error("invalid access: {0}")]
    InvalidAccess(String),
    /// The device context is lost.
    #[error("device lost: {0}")]
    DeviceLost(String),
    /// A handle that is not currently owned by the render system.
    #[error("invalid {kind} handle: {id}")]
    InvalidHandle {
        /// The kind of object the handle refers to.
        kind: ObjectKind,
        /// The raw handle value.
        id: usize,
    },
    /// An operation was issued in a state that does not allow it.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// A resource was created but could not be initialized.
    #[error("initialization failed: {0}")]
    InitializationFailed(String),
    /// A feature is not supported by the backend.
    #[error("unsupported feature: {0}")]
    Unsupported(String),
}

impl RenderError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RenderError::InvalidArgument(_) => ErrorKind::Validation,
            RenderError::OutOfMemory { .. } => ErrorKind::OutOfMemory,
            RenderError::UnsupportedSize { .. } => ErrorKind::UnsupportedSize,
            RenderError::ImageDataSizeMismatch { .. } => ErrorKind::ImageDataSizeMismatch,
            RenderError::InvalidAccess(_) => ErrorKind::InvalidAccess,
            RenderError::DeviceLost(_) => ErrorKind::DeviceLost,
            RenderError::InvalidHandle { .. } | RenderError::InvalidState(_) => {
                ErrorKind::InvalidUsage
            }
            RenderError::InitializationFailed(_) => ErrorKind::Initialization,
            RenderError::Unsupported(_) => ErrorKind::Unsupported,
        }
    }

    /// Returns `true` if the device context cannot be used after this error.
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::DeviceLost
    }
}

impl From<BackendError> for RenderError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::OutOfDeviceMemory { requested } => RenderError::OutOfMemory {
                requested,
                properties: MemoryPropertyFlags::EMPTY,
            },
            BackendError::DeviceLost(msg) => RenderError::DeviceLost(msg),
            BackendError::Unsupported(msg) => RenderError::Unsupported(msg),
            BackendError::InvalidUsage(msg) => RenderError::InvalidState(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_size_mismatch_display() {
        let err = RenderError::ImageDataSizeMismatch {
            expected: 64,
            actual: 60,
        };
        assert_eq!(
            err.to_string(),
            "image data size mismatch: 60 byte(s) specified but required is 64 byte(s)"
        );
        assert_eq!(err.kind(), ErrorKind::ImageDataSizeMismatch);
    }

    #[test]
    fn invalid_handle_display_names_the_kind() {
        let err = RenderError::InvalidHandle {
            kind: ObjectKind::Buffer,
            id: 7,
        };
        assert_eq!(err.to_string(), "invalid buffer handle: 7");
        assert_eq!(err.kind(), ErrorKind::InvalidUsage);
    }

    #[test]
    fn backend_errors_convert_to_matching_kind() {
        let lost: RenderError = BackendError::DeviceLost("queue submit failed".into()).into();
        assert!(lost.is_fatal());
        assert_eq!(lost.to_string(), "device lost: queue submit failed");

        let oom: RenderError = BackendError::OutOfDeviceMemory { requested: 1024 }.into();
        assert_eq!(oom.kind(), ErrorKind::OutOfMemory);
        assert!(!oom.is_fatal());

        let misuse: RenderError = BackendError::InvalidUsage("layout".into()).into();
        assert_eq!(misuse.kind(), ErrorKind::InvalidUsage);
    }
}
