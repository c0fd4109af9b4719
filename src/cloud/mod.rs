//! Cloud storage integration.
//!
//! Uploads go to Azure Blob Storage. A run first reads its SAS token
//! anonymously from a well-known container, then uses that token for every
//! other request.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐  anonymous   ┌──────────────────────┐
//! │ Credential Fetch │─────────────▶│ sas-token/<blob>     │
//! └────────┬─────────┘              └──────────────────────┘
//!          │ token
//! ┌────────▼─────────┐   SAS        ┌──────────────────────┐
//! │ AzureBlobClient  │─────────────▶│ <hostname>/          │
//! └──────────────────┘              │   disks/ metadata/   │
//!                                   │   logs/              │
//!                                   └──────────────────────┘
//! ```
//!
//! Everything above the wire goes through the [`store::BlobStore`] trait, so
//! pipeline stages never see HTTP.
//!
//! ## Usage Example
//!
//! ```no_run
//! use disk_uploader::cloud::azure::AzureConnector;
//! use disk_uploader::cloud::store::StoreConnector;
//! use disk_uploader::cloud::{credentials, container};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let connector = AzureConnector::new("https://mystorageaccount.blob.core.windows.net");
//!
//! let anonymous = connector.anonymous()?;
//! let token = credentials::fetch_token(anonymous.as_ref(), "sas-token", "ws01.txt").await?;
//!
//! let store = connector.with_token(&token)?;
//! container::ensure_container(store.as_ref(), "ws01").await?;
//! # Ok(())
//! # }
//! ```

/// Azure Blob REST client
pub mod azure;

/// Destination container provisioning
pub mod container;

/// SAS token retrieval
pub mod credentials;

/// Storage abstraction used by the pipeline
pub mod store;
