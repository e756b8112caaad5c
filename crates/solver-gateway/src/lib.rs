//! Cross-chain settlement confirmations.
//!
//! After an intent is fulfilled the gateway sends a confirmation through the
//! messaging endpoint to the remote gateway on the destination chain. The
//! remote side accepts deliveries only from the endpoint and only for
//! trusted (chain, path) pairs.

pub mod gateway;

pub use gateway::{Completion, CrossChainGateway, GatewayParams, GatewayState, PreparedDispatch};
