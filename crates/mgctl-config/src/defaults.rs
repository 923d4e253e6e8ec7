#[cfg(unix)]
use camino::Utf8PathBuf;

#[cfg(unix)]
use dirs::runtime_dir;

use crate::socket::SocketEndpoint;

/// File name of the control socket inside the runtime directory.
pub const SOCKET_FILE_NAME: &str = "mg.sock";

/// Default log filter expression for the client.
///
/// Kept at `warn` so diagnostics never interleave with peer output unless the
/// operator asks for them.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Default log filter expression used by the binaries.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default logging format for the binaries.
#[must_use]
pub const fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Compact
}

/// Computes the default control socket endpoint.
///
/// Returns `None` when the user's runtime directory cannot be determined, in
/// which case the operator must pass an explicit socket path.
#[must_use]
pub fn default_socket_endpoint() -> Option<SocketEndpoint> {
    default_socket_endpoint_inner()
}

#[cfg(unix)]
fn default_socket_endpoint_inner() -> Option<SocketEndpoint> {
    let base = runtime_dir().and_then(|path| Utf8PathBuf::from_path_buf(path).ok())?;
    Some(SocketEndpoint::unix(base.join(SOCKET_FILE_NAME)))
}

#[cfg(not(unix))]
fn default_socket_endpoint_inner() -> Option<SocketEndpoint> {
    None
}
