//! Authentication: the identity-provider seam and browser session cookies.

mod extractor;
pub mod firebase;
pub mod memory;
mod provider;
pub mod token;

pub use extractor::{session_cookie, BrowserSession};
pub use firebase::FirebaseAuthProvider;
pub use memory::InMemoryAuthProvider;
pub use provider::{AuthProvider, IdpCredential, ProviderError, ProviderSession};
