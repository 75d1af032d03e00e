pub mod obfuscator;
pub mod resolver;
pub mod store;

pub use obfuscator::{deobfuscate, new_hex_id, obfuscate};
pub use resolver::SecretResolver;
pub use store::{FileSecretStore, MemorySecretStore, SecretStore, SecretStoreError, seed_from_csv};
