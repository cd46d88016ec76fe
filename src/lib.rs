//! SightSafe Prediction Service
//!
//! Single-endpoint upload service for the SightSafe eye disease platform.
//! Accepts one image per request, validates type and size, stages it locally,
//! persists it to S3, obtains a classification from the prediction source
//! (currently a mock returning a fixed result), records the prediction in
//! PostgreSQL, and returns the stored record.
//!
//! ## Pipeline
//!
//! ```text
//! POST /eye-disease/predict
//!        │
//!        ▼
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ Upload       │───▶│ Object       │───▶│ Prediction   │
//! │ Handler      │    │ Store (S3)   │    │ Source       │
//! └──────────────┘    └──────────────┘    └──────────────┘
//!        │                                        │
//!        │ staged copy (removed on exit)          ▼
//!        │                                 ┌──────────────┐
//!        └────────────────────────────────▶│ Record Store │
//!                                          │ (PostgreSQL) │
//!                                          └──────────────┘
//!                                                 │
//!                                                 ▼
//!                                          JSON response
//! ```
//!
//! The flow is strictly linear with no retries and no compensating action
//! between the two stores; each request fails independently.

pub mod api;
pub mod config;
pub mod error;
pub mod object_store;
pub mod prediction;
pub mod record_store;
pub mod upload;

pub use api::{start_api_server, AppState, PredictResponse};
pub use config::Config;
pub use error::PredictError;
pub use object_store::ObjectStore;
pub use prediction::{MockPredictor, Prediction, PredictionSource};
pub use record_store::{PredictionRecord, RecordStore};
pub use upload::StagedUpload;
