pub mod credentials;
pub mod notifier;
