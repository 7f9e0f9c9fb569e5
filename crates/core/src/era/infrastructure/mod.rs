pub mod era_catalog;
