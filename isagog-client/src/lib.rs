// Copyright 2025 Isagog Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! # Isagog client
//!
//! Async clients for the Isagog knowledge graph and NLP services.
//!
//! ```no_run
//! use isagog_client::{ClientConfig, KnowledgeBase};
//! use isagog_query::{Identifier, Value};
//!
//! # async fn run() -> anyhow::Result<()> {
//! isagog_client::logging::init_logging();
//!
//! let config = ClientConfig::load(None)?;
//! let kb = KnowledgeBase::new(config.kg)?;
//! let people = kb
//!     .search_individuals(
//!         &[Identifier::new("https://isagog.com/ontology#Person")?],
//!         &[(Identifier::new("http://www.w3.org/2000/01/rdf-schema#label")?, Value::text("ann.*")?)],
//!     )
//!     .await?;
//! println!("{} matches", people.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
mod http;
pub mod kg;
pub mod logging;
pub mod nlp;

pub use config::{ClientConfig, KgConfig, NlpConfig};
pub use error::{ClientError, Result};
pub use kg::KnowledgeBase;
pub use nlp::NlpClient;
