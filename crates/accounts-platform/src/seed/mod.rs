//! Startup seeding

pub mod admin_seeder;

pub use admin_seeder::{AdminSeed, AdminSeeder, SeedOutcome};
