// Domain layer: marker model, coordinate math, indexing and selection rules.

pub mod coords;
pub mod errors;
pub mod fingerprint;
pub mod marker;
pub mod owner;
pub mod ports;
pub mod spatial;
pub mod top_n;

pub use coords::{GridMapper, PixelProjection, VirtualRect, WorldGeometry};
pub use errors::{MarkerError, NotifyError, PublishError, SourceError, UploadError};
pub use fingerprint::{Fingerprint, record_checksum};
pub use marker::{Marker, MarkerType, RECORD_LEN, encode_record, pack_server_id};
pub use owner::{OwnerClass, PLAYER_ID_THRESHOLD, owner_color};
pub use spatial::{SpatialIndex, VirtualEntity};
pub use top_n::{TribeCount, count_owners, top_n};
pub use ports::{ArtifactNotifier, ArtifactUploader, MarkerSource};
