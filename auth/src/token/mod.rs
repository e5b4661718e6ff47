pub mod claims;
pub mod codec;
pub mod errors;

pub use claims::Claims;
pub use claims::TokenScope;
pub use codec::HmacAlgorithm;
pub use codec::TokenCodec;
pub use codec::TokenTtls;
pub use errors::TokenError;
