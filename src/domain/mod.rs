pub mod adf;
pub mod context;
pub mod gherkin;
pub mod reconcile;
pub mod report;
pub mod scenario;
pub mod ticket;
