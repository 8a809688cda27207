//! Field definition editing with cascading reference resolution.
//!
//! An [`EditSession`] holds one field definition as a typed view over its
//! generic slots. Changing a slot that another list depends on (the entity
//! type in `metaType1`, say) makes the [`CascadingResolver`] fetch the
//! dependent list and normalize every slot and filter row it governs. The
//! session itself performs no I/O: it queues [`FetchTicket`]s, and an
//! [`EditorDriver`] runs them against a [`ReferenceSource`] on tokio.
//!
//! ```no_run
//! use std::sync::Arc;
//! use fieldmeta_editor::{EditSession, EditorDriver, SessionOptions, StaticReferenceSource};
//! use fieldmeta_schema::{FieldTypeRegistry, SlotName};
//!
//! # async fn run() -> fieldmeta_editor::Result<()> {
//! let registry = Arc::new(FieldTypeRegistry::builtin());
//! let source = Arc::new(StaticReferenceSource::default());
//! let mut session = EditSession::create(registry, "12", SessionOptions::default());
//! let mut driver = EditorDriver::new(source);
//!
//! session.select_type("lookup")?;
//! driver.settle(&mut session).await;
//! session.set_slot(SlotName::MetaType1, "7")?;
//! driver.settle(&mut session).await;
//! # Ok(())
//! # }
//! ```
//!
//! Answers are guarded twice: a ticket from an earlier field-type generation
//! is dropped unconditionally, and a ticket whose dependency key or fetch
//! epoch no longer matches is dropped as stale.

pub mod cache;
pub mod driver;
pub mod error;
pub mod generation;
pub mod resolver;
pub mod services;
pub mod session;

pub use cache::{ReferenceList, ReferenceListCache};
pub use driver::EditorDriver;
pub use error::{EditorError, EditorWarning, Result, ServiceError};
pub use generation::{Generation, GenerationTracker, Phase};
pub use resolver::{ApplyOutcome, CascadingResolver, FetchTicket, ListState};
pub use services::{
    fetch_list, EntityTypeSummary, FieldDefinitionStore, MemoryFieldStore, PersistedId,
    ReferenceFixture, ReferenceSource, StaticReferenceSource,
};
pub use session::{EditSession, FetchDisposition, SessionOptions};
