//! Data models for Shelfmark

pub mod draft;
pub mod item;
pub mod loan;
pub mod reading;
pub mod settings;
pub mod user;

// Re-export commonly used types
pub use draft::{CoverRef, ItemDraft, MetadataQuery, MetadataSource, SourceHint};
pub use item::{Creator, Item, ItemInput, ItemQuery, ItemShort, MediaType};
pub use loan::{CreateLoan, Loan, LoanDetails};
pub use reading::{ReadingState, ReadingStats, ReadingStatus, UpsertReadingStatus};
pub use settings::{ApiSettings, ApiSettingsView, UpdateApiSettings};
pub use user::{CreateUser, Role, UpdateUser, User, UserClaims, UserShort};
