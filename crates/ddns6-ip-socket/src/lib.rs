// # Socket Address Discovery
//
// This crate provides the two address queries ddns6 runs on every
// invocation:
//
// - `UdpProbeSource`: the expected address, read from the local end of a
//   connected (but silent) UDP socket
// - `SystemResolver`: the recorded address, resolved through the system
//   resolver
//
// Neither talks to a third-party "what is my IP" service.

pub mod probe;
pub mod resolver;

pub use probe::UdpProbeSource;
pub use resolver::SystemResolver;
