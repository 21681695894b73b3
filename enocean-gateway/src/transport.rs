//! Opening the byte link to the radio module.

use std::fmt;
use std::io;

use log::info;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

use crate::error::GatewayError;

/// Default ESP3 line speed.
pub const DEFAULT_BAUD_RATE: u32 = 57_600;

/// Duplex byte stream the gateway runs on.
pub trait Transport: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> Transport for T {}

pub type BoxedTransport = Box<dyn Transport>;

/// Where the module is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportTarget {
    /// Local serial port, e.g. `/dev/ttyUSB0`.
    Serial { port: String, baud_rate: u32 },
    /// Serial-to-TCP bridge, `host:port`.
    Tcp(String),
}

impl fmt::Display for TransportTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportTarget::Serial { port, baud_rate } => write!(f, "{}@{}", port, baud_rate),
            TransportTarget::Tcp(address) => write!(f, "tcp://{}", address),
        }
    }
}

/// Open the transport.
pub async fn open(target: &TransportTarget) -> Result<BoxedTransport, GatewayError> {
    let connection_failed = |source: io::Error| GatewayError::ConnectionFailed {
        target: target.to_string(),
        source,
    };

    match target {
        TransportTarget::Tcp(address) => {
            let stream = TcpStream::connect(address).await.map_err(connection_failed)?;
            stream.set_nodelay(true).map_err(connection_failed)?;
            info!("Connected to {}", target);
            Ok(Box::new(stream))
        }
        TransportTarget::Serial { port, baud_rate } => {
            let stream = open_serial(port, *baud_rate).map_err(connection_failed)?;
            info!("Opened {}", target);
            Ok(stream)
        }
    }
}

#[cfg(feature = "serial")]
fn open_serial(port: &str, baud_rate: u32) -> io::Result<BoxedTransport> {
    use tokio_serial::SerialPortBuilderExt;

    let stream = tokio_serial::new(port, baud_rate)
        .open_native_async()
        .map_err(io::Error::from)?;
    Ok(Box::new(stream))
}

#[cfg(not(feature = "serial"))]
fn open_serial(_port: &str, _baud_rate: u32) -> io::Result<BoxedTransport> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "built without serial port support",
    ))
}
