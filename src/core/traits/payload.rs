//! Payload trait for the opaque data carried by vertices and full cells.

use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Debug;

/// Trait alias for the opaque payloads riding on vertices and full cells.
///
/// The triangulation copies payloads when cells are cloned, drops them on
/// erase, and streams them through the serialization bridge; it never
/// looks inside. `Copy` keeps cell cloning trivial, `Eq` and `Debug` let
/// tests and diagnostics compare and print payloads, and the serde bounds
/// feed the default payload codec. Nothing here is ever hashed or ordered,
/// so no such bounds are demanded.
///
/// Satisfied by `()`, integer ids, small `Copy` enums, and `Option<T>` of
/// any of these. Owning types such as `String` do not qualify; store a
/// numeric id and keep the strings in an external table.
pub trait Payload: Copy + Eq + Debug + Serialize + DeserializeOwned {}

impl<T> Payload for T where T: Copy + Eq + Debug + Serialize + DeserializeOwned {}
