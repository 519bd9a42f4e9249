//! Git LFS wire types for lfsproxy.
//!
//! Request and response bodies of the batch, verify and locking APIs, all
//! exchanged as `application/vnd.git-lfs+json`. The types are hand-written
//! serde structs; field names follow the Git LFS API (`snake_case`).

pub mod batch;
pub mod error;
pub mod lock;
pub mod operations;
pub mod verify;

pub use batch::{
    ActionLink, BatchRequest, BatchResponse, GitRef, ObjectActions, ObjectError, ObjectResult,
    ObjectSpec, Operation, TransferAction,
};
pub use error::{LfsError, LfsErrorCode};
pub use lock::{
    CreateLockRequest, ListLocksResponse, LockOwner, LockResponse, LockView, UnlockRequest,
    VerifyLocksRequest, VerifyLocksResponse,
};
pub use operations::LfsOperation;
pub use verify::VerifyRequest;
