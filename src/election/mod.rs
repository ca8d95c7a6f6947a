mod api;
mod bully;
mod message;
mod timers;

pub use api::ElectionClient;
pub use api::ElectionClientFactory;
pub use api::ElectionRecord;
pub use api::ElectionSetup;
pub use api::ElectionTransport;
pub use api::MasterController;
pub use api::ELECTION_CALLBACK_PATH;
pub use bully::BullyClient;
pub use bully::BullyClientFactory;
pub use message::BullyKind;
pub use message::BullyMessage;
pub use message::MessageError;
