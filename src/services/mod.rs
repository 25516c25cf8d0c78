pub mod disambiguator;
pub mod notify;
pub mod provider;
pub mod resolver;
pub mod store;

pub use disambiguator::{Disambiguator, SelectOption, Selection};
pub use notify::{MessageRef, Notifier};
pub use provider::{MediaProvider, ProviderRef, SavedTrackSource, SavedTracks};
pub use resolver::{QueryAbort, QueryAggregator, QueryOutcome, ResolvedQuery};
pub use store::PlaylistStore;
