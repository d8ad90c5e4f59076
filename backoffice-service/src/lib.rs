//! Back-office service: partners, contacts, sites, product prices, quotes
//! with line-level discount pricing, orders, documents, resources, tasks,
//! and the customer communication log.

pub mod config;
pub mod context;
pub mod handlers;
pub mod models;
pub mod pricing;
pub mod services;
pub mod startup;
