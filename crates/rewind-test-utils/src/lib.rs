//! Testing utilities, fixtures, and mocks for rewind.
//!
//! - **Fixtures**: temporary projects with a history store attached
//! - **Mocks**: in-memory workspace with injectable write failures
//! - **Assertions**: helpers for file content and change status checks
//! - **Logging**: [`init_test_logging`] shows history events in test output
//!
//! # Example Usage
//!
//! ```rust
//! use rewind_history::ChangeRequest;
//! use rewind_test_utils::fixtures::TestProject;
//!
//! let project = TestProject::new().with_file("a.txt", "v2").build();
//! let store = project.store();
//!
//! store
//!     .record_change(&ChangeRequest::new("r1", "a.txt", "v1", "v2"))
//!     .unwrap();
//! store.revert_revision("r1").unwrap();
//!
//! assert_eq!(project.read_file("a.txt"), "v1");
//! ```

pub mod assertions;
pub mod fixtures;
pub mod mocks;

// Re-export commonly used items
pub use fixtures::{BuiltTestProject, TestProject};
pub use mocks::MockWorkspace;

use rewind_util::log::{self, LogConfig};
use std::sync::Once;

/// Route rewind's tracing events through the test harness.
///
/// Safe to call from every test; only the first call installs a subscriber.
/// Set `REWIND_LOG` to change the filter.
pub fn init_test_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        log::init(LogConfig::for_tests());
    });
}
