// Simulated device fleet: door lock, alarm, motion sensor
pub mod device;

// Keyword command interpreter
pub mod interpreter;

// Wire envelopes for the command and status subjects
pub mod event;

// Controller-side device state store
pub mod state;

// NATS client integration
pub mod nats;

// Orchestrator and observer event log
pub mod controller;

// Observer WebSocket protocol
pub mod subscription;

// HTTP and WebSocket APIs
pub mod api;

// TOML configuration
pub mod config;
