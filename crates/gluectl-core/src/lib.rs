//! # gluectl-core
//!
//! Descriptor-driven invocation of AWS Glue operations.
//!
//! Every supported remote operation is one row in a static
//! [`OperationDescriptor`] table. A single generic [`Invoker`] runs any of
//! them: it builds the request from the bound inputs, calls the service
//! through a [`GlueTransport`], applies the caller's [`Selector`] to each
//! response and follows `NextToken`/`Marker` cursors until the service
//! reports no more pages.
//!
//! ```no_run
//! use gluectl_core::{
//!     HttpTransport, InvocationContext, Invoker, Page, TransportConfig, operations,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpTransport::new(TransportConfig::new("https://glue.eu-west-1.amazonaws.com"))?;
//! let invoker = Invoker::new(transport);
//!
//! let op = operations::lookup("Get-CatalogList")?;
//! let mut ctx = InvocationContext::new(op);
//! ctx.bind("MaxResult", 50_i64)?;
//!
//! let mut pages: Vec<Page> = Vec::new();
//! let summary = invoker
//!     .invoke(&ctx, &mut pages, &CancellationToken::new())
//!     .await?;
//! println!("{} catalogs over {} calls", pages.iter().map(|p| p.items.len()).sum::<usize>(), summary.calls);
//! # Ok(())
//! # }
//! ```

pub mod binding;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod invoker;
pub mod operations;
pub mod select;
pub mod transport;

pub use binding::{BindingWarning, FieldValue, InvocationContext};
pub use config::{Config, ConfigError, Profile};
pub use descriptor::{ConfirmImpact, FieldSpec, FieldType, OperationDescriptor, Output, Paging};
pub use error::{CoreError, Result};
pub use invoker::{FnSink, InvocationSummary, Invoker, Page, PageSink, sink_fn};
pub use select::Selector;
pub use transport::{GlueTransport, HttpTransport, TransportConfig, TransportError};
