mod api;
mod entry;
mod events;
mod graph;
mod manager;
mod mirror;
mod source;
mod type_index;

pub use api::Artifact;
pub use api::EntryInfo;
pub use api::Node;
pub use api::NodeDescriptor;
pub use api::Repository;
pub use api::RepositoryError;
pub use events::RepositoryEvent;
pub use events::RepositoryEventListener;
pub use events::RepositoryState;
pub use manager::ArtifactRepositoryManager;
pub use manager::GeneratedChild;
pub use manager::ManagerError;
pub use manager::ManagerRegistry;
pub use mirror::LocalLookup;
pub use mirror::MirrorRepository;
pub use source::DefaultSourceResolver;
pub use source::FsTreeSource;
pub use source::InMemorySource;
pub use source::SourceItem;
pub use source::SourceResolver;
pub use source::TreeSource;
