//! Constructors for the gRPC statuses services return most often.
//!
//! Handlers built on top of the auth layer share these so that the same
//! failure always maps to the same code and message shape.

use std::fmt::Display;

use tonic::{Code, Status};

/// A required request field was empty.
pub fn missing_field(field: &str) -> Status {
    Status::invalid_argument(format!("missing message field: {field}"))
}

/// A field value was not acceptable.
pub fn incorrect_val(val: &str) -> Status {
    Status::invalid_argument(format!("incorrect value for {val:?}"))
}

/// A unique field collided with an existing record.
pub fn duplicate_field(field_name: &str, field_value: &str) -> Status {
    Status::already_exists(format!("{field_name} with value {field_value} exists"))
}

/// The resource does not exist.
pub fn does_not_exist(resource: &str, id: &str) -> Status {
    Status::not_found(format!("{resource} with id {id} does not exist"))
}

/// The resource already exists.
pub fn does_exist(resource: &str, id: &str) -> Status {
    Status::already_exists(format!("{resource} with id {id} already exists"))
}

/// JSON serialization of `obj` failed.
pub fn from_json_marshal(err: impl Display, obj: &str) -> Status {
    Status::internal(format!("failed to json marshal {obj}: {err}"))
}

/// JSON deserialization of `obj` failed.
pub fn from_json_unmarshal(err: impl Display, obj: &str) -> Status {
    Status::internal(format!("failed to json unmarshal {obj}: {err}"))
}

/// A conversion between two representations failed.
pub fn converting_type(err: impl Display, from: &str, to: &str) -> Status {
    Status::internal(format!("couldn't convert from {from} to {to}: {err}"))
}

/// A write to the backing store failed.
pub fn write_failed(err: impl Display) -> Status {
    Status::internal(format!("write operation failed: {err}"))
}

/// A read from the backing store failed.
pub fn read_failed(err: impl Display) -> Status {
    Status::internal(format!("read operation failed: {err}"))
}

/// Encrypting data failed.
pub fn failed_to_encrypt(err: impl Display) -> Status {
    Status::internal(format!("failed to encrypt data: {err}"))
}

/// Decrypting data failed.
pub fn failed_to_decrypt(err: impl Display) -> Status {
    Status::internal(format!("failed to decrypt data: {err}"))
}

/// Wraps an error with an explicit code.
pub fn wrap_with_code(code: Code, err: impl Display) -> Status {
    Status::new(code, err.to_string())
}

/// Wraps an error with an explicit code and a leading message.
pub fn wrap_with_code_and_msg(code: Code, err: impl Display, msg: &str) -> Status {
    Status::new(code, format!("{msg}: {err}"))
}

/// Prefixes an existing status message, keeping its code.
pub fn wrap_with_msg(status: &Status, msg: &str) -> Status {
    Status::new(status.code(), format!("{msg}: {}", status.message()))
}
