pub mod ledger;
pub mod allotment;

pub use ledger::{LedgerService, SEMESTER_ALLOTMENT, current_semester_period};
pub use allotment::AllotmentScheduler;
