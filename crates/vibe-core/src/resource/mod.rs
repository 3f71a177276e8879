//! Resource domain models.
//!
//! Wire shapes of the dashboard resources that flow through the query cache:
//! playlists, metrics, automation jobs, settings and the track library.

mod job;
mod library;
mod metrics;
mod playlist;
mod settings;

pub use job::{Job, JobHistory, JobList, JobRun, JobUpdateRequest};
pub use library::{Album, AlbumFilter, AlbumList, Track, TrackList};
pub use metrics::{
    ArtistPlays, DatedValue, NamedValue, OverviewMetrics, OverviewStats, WeeklyValue,
};
pub use playlist::{CreatePlaylistsRequest, Playlist, PlaylistList, ReshuffleRequest};
pub use settings::Settings;
