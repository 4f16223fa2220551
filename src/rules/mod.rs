// SPDX-License-Identifier: MIT

//! Named rules gated on expressions
//!
//! Rule files look like:
//!
//! ```yaml
//! rules:
//!   - name: adult
//!     when: "$age >= 18"
//!   - name: north_america
//!     when: '$country in ("US", "CA")'
//! ```

mod condition;
mod loader;
mod types;

pub use condition::Condition;
pub use loader::RuleLoader;
pub use types::{Rule, RuleDefinition, RuleFile, RuleSet};
