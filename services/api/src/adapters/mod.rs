pub mod credentials;
pub mod http;
pub mod identity;
pub mod robots;
pub mod scraper;
pub mod serpapi;
pub mod session_store;
pub mod vision;

pub use credentials::InMemoryCredentialVerifier;
pub use identity::FirebaseIdentityAdapter;
pub use scraper::{EthicalScraper, ScrapeSite};
pub use serpapi::SerpApiAdapter;
pub use session_store::InMemorySessionStore;
pub use vision::OpenAiVisionAdapter;
