/// Authentication module
///
/// Password hashing, signed token encoding, token pair issuing,
/// refresh rotation, and the service that ties them to a credential store.

mod claims;
mod clock;
mod issuer;
mod jwt;
mod password;
mod refresh_token;
mod service;

pub use claims::Claims;
pub use clock::{Clock, ManualClock, SystemClock};
pub use issuer::{TokenIssuer, TokenPair};
pub use jwt::TokenCodec;
pub use password::PasswordHasher;
pub use refresh_token::TokenValidator;
pub use service::AuthService;
