pub mod claims;
pub mod error;
pub mod extract;
pub mod guards;
pub mod identity;
pub mod roles;
pub mod store;
pub mod tokens;

pub use claims::Claims;
pub use error::{AuthError, AuthResult};
pub use extract::CurrentUser;
pub use guards::{ensure_admin, ensure_role, GuardError};
pub use identity::{Identity, NewIdentity, PublicIdentity};
pub use roles::Role;
pub use store::{CredentialStore, MemoryStore, StoreError};
pub use tokens::{IssuedToken, TokenConfig, TokenService};
