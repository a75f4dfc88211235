#![forbid(unsafe_code)]

//! Core domain model and decision logic for the herbal remedy interaction engine.
//!
//! This crate provides:
//! - Domain types (medications, plants, interactions, user profiles)
//! - Catalog management and on-disk datasets
//! - Contraindication checks and beneficial recommendations
//! - Personalized catalog ranking
//! - Session inactivity monitoring
//! - Per-user profile persistence

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod repository;
pub mod profile_store;
pub mod dataset;
pub mod severity;
pub mod contraindications;
pub mod recommender;
pub mod conditions;
pub mod ranker;
pub mod clock;
pub mod session;
pub mod engine;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, get_default_catalog};
pub use config::Config;
pub use repository::{InMemoryRepository, InteractionRepository};
pub use profile_store::{ProfileStore, UserRecord};
pub use dataset::{load_dataset, save_dataset};
pub use contraindications::ContraindicationChecker;
pub use recommender::BeneficialRecommender;
pub use ranker::Ranker;
pub use clock::{Clock, ManualClock, SystemClock};
pub use session::{SessionMonitor, SessionSettings, SessionState, SessionTerminator, Transition};
pub use engine::{InteractionEngine, RankedPlant};
