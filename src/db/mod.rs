// Re-export the Database struct and row types.
pub mod core;
mod schema;
mod wallet;

pub use self::core::Database;
pub use self::wallet::KnownWallet;
