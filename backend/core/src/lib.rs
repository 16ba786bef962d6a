pub mod error;
pub mod sdk;
pub mod types;

pub use error::{ConfigError, GMapsError, InvalidTransition, LoadError, RegistryError};
pub use sdk::{SdkHandle, SdkInfo};
pub use types::{mask_secret, Credential, LoadStatus, Library};
