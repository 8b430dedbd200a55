//! File actions module.
//!
//! The [`delete`] module selects which members of a duplicate group may be
//! removed and disposes of them:
//! - permanent removal (default)
//! - move to the system trash via the trash crate
//! - dry run, which only reports
//!
//! ```no_run
//! use dupesweep::actions::delete::delete_to_trash;
//! use std::path::PathBuf;
//!
//! let path = PathBuf::from("/path/to/duplicate.txt");
//! let freed = delete_to_trash(&path);
//! ```

pub mod delete;

pub use delete::{
    delete_to_trash, permanent_delete, plan_group, DeletablePrefixes, DeleteError, DeleteMode,
    Deleter, DeletionPlan, DeletionStat,
};
