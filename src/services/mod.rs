pub mod analytics;
pub mod importer;
pub mod orders;
pub mod royalties;
pub mod sales;
