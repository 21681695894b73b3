//! Async EnOcean gateway.
//!
//! Runs an ESP3 radio module over any duplex byte stream: correlates
//! commands with module responses, decodes telegrams of registered devices
//! through the EEP engine and turns them into [`StateChange`] events.
//!
//! ```no_run
//! use enocean_gateway::transport::{self, TransportTarget};
//! use enocean_gateway::{Gateway, GatewayOptions};
//! use enocean_protocol::{Address, EepId};
//!
//! # async fn run() -> Result<(), enocean_gateway::GatewayError> {
//! let target = TransportTarget::Tcp("192.168.1.20:2000".into());
//! let gateway = Gateway::start(transport::open(&target).await?, GatewayOptions::default());
//! gateway.on_state_change(|change| println!("{} {} = {:?}", change.device_address, change.observable_uid, change.value));
//! gateway
//!     .register_device(Address::from_u32(0x0181_0001), EepId::new(0xA5, 0x02, 0x05))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod capability;
pub mod codec;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod observable;
pub mod profiles;
pub mod registry;
pub mod state_change;
pub mod transport;

pub use capability::{Capability, CapabilityOptions};
pub use codec::Esp3Codec;
pub use error::{BaseIdChangeError, GatewayError};
pub use gateway::{Gateway, GatewayOptions, RESPONSE_TIMEOUT};
pub use profiles::ProfileHandler;
pub use state_change::{StateChange, StateChangeSource};
