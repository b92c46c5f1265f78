//! # Simevo - Foraging Organism Simulation
//!
//! A simulation of organisms foraging for food in a bounded 2D environment.
//! Organisms carry genes that decide how fast they move, how large they are
//! and how far they can sense; they burn energy every tick, eat what they
//! can reach and die when they starve or grow old.
//!
//! ## Features
//!
//! - Quadtree spatial index with radius queries and subtree pruning
//! - Tick loop with parallel perception and deterministic conflict resolution
//! - Food consumption, predation and energy management
//! - DNA-encoded traits with pluggable mutation
//! - Per-tick statistics
//!
//! ## Core Modules
//!
//! - [`simulation::environment`] - Object ownership and the tick loop
//! - [`simulation::spatial`] - Spatial indices for neighbour queries
//! - [`simulation::organism`] - Organism behavior and state
//! - [`simulation::food`] - Food items for organisms
//! - [`simulation::events`] - Event system for deterministic updates

/// Core simulation logic and data structures.
pub mod simulation {
    /// The simulation world and its tick loop.
    pub mod environment;
    /// Error types.
    pub mod error;
    /// Event system for deferred, deterministic state updates.
    pub mod events;
    /// Food items that organisms can consume.
    pub mod food;
    /// DNA encoding of organism traits.
    pub mod genes;
    /// Geometric utility functions for distance calculations.
    pub mod geometric_utils;
    /// Trait for entities with a position in 2D space.
    ///
    /// The [`locatable::Locatable`] trait is implemented by all entities that
    /// live in an environment (Food, Organism and the tagged object wrapper).
    pub mod locatable;
    /// Object handles and the tagged object variant.
    pub mod object;
    /// Organism behavior, state, and lifecycle.
    pub mod organism;
    /// Simulation parameters.
    pub mod params;
    /// Spatial indices for radius queries.
    pub mod spatial;
    /// Population statistics.
    pub mod stats;
}
