//! Auth-domain models: token secrets, decoded token claims, user profiles, and the identity
//! holder that keeps them in sync with the session store.

pub mod claims;
pub mod state;
pub mod token;
pub mod user;

pub use claims::*;
pub use state::*;
pub use token::*;
pub use user::*;
