//! Maps engine errors to the process exit codes described in the dump-file
//! tool contract: 0 success, 1 user error or detected diff, 2 internal error.

use svndump_core::Error as CoreError;

pub const SUCCESS: i32 = 0;
pub const USER_ERROR: i32 = 1;
pub const INTERNAL_ERROR: i32 = 2;

pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<CoreError>() {
        Some(
            CoreError::BadFormat { .. }
            | CoreError::Truncated { .. }
            | CoreError::InvalidArgument(_)
            | CoreError::MissingMapping { .. }
            | CoreError::IntegrityFailure { .. },
        ) => USER_ERROR,
        Some(CoreError::InvalidState(_)) | Some(CoreError::Io(_)) | None => INTERNAL_ERROR,
    }
}
