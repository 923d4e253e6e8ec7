//! Address patterns and channel names understood by the peer.

/// Request: subscribe to a named event channel `(id, channel, enabled)`.
pub const LISTEN: &str = "/listen";

/// Request: execute a command string `(id, command)`.
pub const EVAL: &str = "/eval";

/// Response: the request `id` has completed `(id)`.
pub const DONE: &str = "/done";

/// Response: informational text `(id, text)`.
pub const TEXT: &str = "/text";

/// Response: an error, optionally located `(id, text, path, line)`.
pub const ERROR: &str = "/error";

/// Event channel announcing device hot-plug changes.
pub const PLUG_CHANNEL: &str = "plug";

/// Event channel announcing player slot changes.
pub const SLOT_CHANNEL: &str = "slot";
