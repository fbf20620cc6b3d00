//! On-demand thumbnail pipeline
//!
//! A request path `<width>x<height>/<source>` flows through:
//!
//! 1. [`request`] - parse dimensions, source and crop anchor
//! 2. [`security`] - trust the source by domain allowlist or MD5 signature
//! 3. [`acquire`] - fetch the source and resolve extension/MIME type
//! 4. [`transform`] - crop-to-fill and resample to the exact size
//! 5. [`encoder`] - serialize in the source's format
//! 6. [`storage`] - optionally publish the result to S3
//!
//! [`orchestrator::RequestOrchestrator`] runs the stages and turns the outcome
//! into a [`response::ResponseEnvelope`].

pub mod acquire;
pub mod encoder;
pub mod orchestrator;
pub mod request;
pub mod response;
pub mod security;
pub mod storage;
pub mod transform;
pub mod url;

pub use acquire::{
    acquire, FetchedSource, HttpSourceFetcher, ImageAsset, ImagePayload, SourceFetcher,
    StaticSourceFetcher,
};
pub use encoder::{encode_asset, resolve_output_format, EncodedImage, OutputFormat};
pub use orchestrator::{invoke, RequestOrchestrator};
pub use request::{parse_request, ThumbnailRequest};
pub use response::{Body, ResponseEnvelope};
pub use security::{sign_source, validate_source, SecurityConfig, ValidationOutcome};
pub use storage::{
    MemoryObjectStore, ObjectStore, PutObjectRequest, S3ObjectStore, StorageError,
    StoragePublisher,
};
pub use transform::{crop_box, thumbnail, CropBox};
pub use url::ThumbnailUrl;
