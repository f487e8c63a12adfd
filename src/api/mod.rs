pub mod gateway;
pub mod state;

pub use gateway::{GatewayEvent, HttpGateway};
pub use state::ClientContext;
