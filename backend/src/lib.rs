//! Backend service for the finance dashboard: accounts, credit cards,
//! invoices, ledger transactions, budgeting goals and the statement export,
//! exposed over a small REST API.

pub mod db;
pub mod domain;
pub mod events;
pub mod rest;
pub mod storage;
