//! Domain-level constants.
//!
//! Validation messages are part of the public contract: clients and tests
//! match on them.

// =============================================================================
// Validation messages
// =============================================================================

/// Returned when any of name, email or password is missing on creation
pub const MSG_CREATE_FIELDS_REQUIRED: &str = "name, email, and password are required";

/// Returned when a lookup or delete is attempted without an identifier
pub const MSG_USER_ID_REQUIRED: &str = "user ID is required";

/// Returned when an update is attempted without an identifier
pub const MSG_UPDATE_ID_REQUIRED: &str = "user ID is required for update";

/// Returned when an update carries no fields at all
pub const MSG_NO_UPDATE_DATA: &str = "no update data provided";

/// Returned when an update tries to set the password to ""
pub const MSG_EMPTY_PASSWORD_UPDATE: &str = "password cannot be updated to empty string";

/// Returned when a password is empty
pub const MSG_PASSWORD_REQUIRED: &str = "password is required";
