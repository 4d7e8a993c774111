pub mod codec;
pub mod errors;
pub mod ttl;

pub use codec::TokenCodec;
pub use errors::TokenError;
pub use ttl::parse_ttl;
