use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::io::{IoSink, IoSource};

/// Default read timeout for link sources created by this module.
///
/// A timeout turns into `ReadOutcome::NoData`, which lets a read loop notice
/// its stop flag even when the peer is silent.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// A connected socket split into its byte source and byte sink halves.
#[derive(Debug)]
pub struct Link {
    pub source: IoSource<UnixStream>,
    pub sink: IoSink<UnixStream>,
}

impl Link {
    /// Split a connected stream into source and sink halves.
    pub fn from_stream(stream: UnixStream, read_timeout: Option<Duration>) -> Result<Self> {
        let reader = stream.try_clone()?;
        reader.set_read_timeout(read_timeout)?;
        Ok(Self {
            source: IoSource::new(reader),
            sink: IoSink::new(stream),
        })
    }

    /// Split into the source and sink halves.
    pub fn split(self) -> (IoSource<UnixStream>, IoSink<UnixStream>) {
        (self.source, self.sink)
    }
}

/// Unix domain socket link.
///
/// Provides bind/accept/connect over filesystem-path UDS on Linux and macOS.
/// The socket path is removed on drop if it still refers to the socket this
/// listener created.
pub struct UnixDomainSocket {
    listener: UnixListener,
    path: PathBuf,
    created_inode: Option<(u64, u64)>,
    read_timeout: Option<Duration>,
}

impl UnixDomainSocket {
    /// Default permission mode for created socket paths.
    pub const DEFAULT_SOCKET_MODE: u32 = 0o600;
    /// Maximum socket path length.
    /// Unix `sockaddr_un.sun_path` is typically 108 bytes on Linux, 104 on macOS.
    #[cfg(target_os = "linux")]
    const MAX_PATH_LEN: usize = 108;
    #[cfg(not(target_os = "linux"))]
    const MAX_PATH_LEN: usize = 104;

    /// Bind and listen on a filesystem-path Unix domain socket.
    ///
    /// If the path already exists and is a socket, it is removed first
    /// (stale socket cleanup). Any other existing file is an error.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        Self::bind_with_mode(path, Self::DEFAULT_SOCKET_MODE)
    }

    /// Bind and listen with an explicit permission mode.
    pub fn bind_with_mode(path: impl AsRef<Path>, mode: u32) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        check_path_len(&path)?;

        if path.exists() {
            let metadata = std::fs::symlink_metadata(&path).map_err(|e| bind_error(&path, e))?;
            if metadata.file_type().is_socket() {
                debug!(?path, "removing stale socket");
                std::fs::remove_file(&path).map_err(|e| bind_error(&path, e))?;
            } else {
                return Err(bind_error(
                    &path,
                    std::io::Error::new(
                        std::io::ErrorKind::AlreadyExists,
                        "existing path is not a unix socket",
                    ),
                ));
            }
        }

        let listener = UnixListener::bind(&path).map_err(|e| bind_error(&path, e))?;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode))
            .map_err(|e| bind_error(&path, e))?;
        let created = std::fs::symlink_metadata(&path).map_err(|e| bind_error(&path, e))?;

        info!(?path, "listening on unix domain socket");

        Ok(Self {
            listener,
            path,
            created_inode: Some((created.dev(), created.ino())),
            read_timeout: Some(DEFAULT_READ_TIMEOUT),
        })
    }

    /// Override the read timeout applied to accepted links.
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<Link> {
        let (stream, _addr) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(path = ?self.path, "accepted connection");
        Link::from_stream(stream, self.read_timeout)
    }

    /// Connect to a listening socket with the default read timeout.
    pub fn connect(path: impl AsRef<Path>) -> Result<Link> {
        Self::connect_with_timeout(path, Some(DEFAULT_READ_TIMEOUT))
    }

    /// Connect to a listening socket (blocking).
    pub fn connect_with_timeout(
        path: impl AsRef<Path>,
        read_timeout: Option<Duration>,
    ) -> Result<Link> {
        let path = path.as_ref();
        let stream = UnixStream::connect(path).map_err(|e| TransportError::Connect {
            path: path.to_path_buf(),
            source: e,
        })?;
        debug!(?path, "connected to unix domain socket");
        Link::from_stream(stream, read_timeout)
    }

    /// The path this socket is bound to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for UnixDomainSocket {
    fn drop(&mut self) {
        let Some((expected_dev, expected_ino)) = self.created_inode else {
            return;
        };
        if let Ok(metadata) = std::fs::symlink_metadata(&self.path) {
            if metadata.file_type().is_socket()
                && metadata.dev() == expected_dev
                && metadata.ino() == expected_ino
            {
                debug!(path = ?self.path, "cleaning up socket file");
                let _ = std::fs::remove_file(&self.path);
            } else {
                debug!(path = ?self.path, "socket path identity changed; skipping cleanup");
            }
        }
    }
}

fn check_path_len(path: &Path) -> Result<()> {
    let len = path.as_os_str().len();
    if len >= UnixDomainSocket::MAX_PATH_LEN {
        return Err(TransportError::PathTooLong {
            path: path.to_path_buf(),
            len,
            max: UnixDomainSocket::MAX_PATH_LEN,
        });
    }
    Ok(())
}

fn bind_error(path: &Path, source: std::io::Error) -> TransportError {
    TransportError::Bind {
        path: path.to_path_buf(),
        source,
    }
}
